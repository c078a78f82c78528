//! Filter tree → OGC Filter Encoding XML.

use crate::error::FilterError;
use crate::version::FilterVersion;
use crate::{GML_NAMESPACE, OGC_NAMESPACE};
use geolayer_core::filter::{Bounds, Filter};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Serializes [`Filter`] trees into `<ogc:Filter>` documents.
///
/// The output has no XML declaration, so it can be dropped straight into a
/// request parameter or embedded in a larger document.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEncoder {
    version: FilterVersion,
}

impl FilterEncoder {
    /// Create an encoder for the given version.
    pub fn new(version: FilterVersion) -> Self {
        Self { version }
    }

    /// The version this encoder writes.
    pub fn version(&self) -> FilterVersion {
        self.version
    }

    /// Encode `filter` as a complete `<ogc:Filter>` element.
    pub fn encode(&self, filter: &Filter) -> Result<String, FilterError> {
        let mut out = Output {
            writer: Writer::new(Vec::new()),
            version: self.version,
        };
        let mut root = BytesStart::new("ogc:Filter");
        root.push_attribute(("xmlns:ogc", OGC_NAMESPACE));
        if uses_gml(filter) {
            root.push_attribute(("xmlns:gml", GML_NAMESPACE));
        }
        out.event(Event::Start(root))?;
        out.filter(filter)?;
        out.end("ogc:Filter")?;

        let xml = String::from_utf8(out.writer.into_inner())
            .map_err(|e| FilterError::Xml(e.to_string()))?;
        tracing::trace!(version = %self.version, bytes = xml.len(), "encoded filter");
        Ok(xml)
    }
}

/// Encode with a one-off encoder.
pub fn encode_filter(filter: &Filter, version: FilterVersion) -> Result<String, FilterError> {
    FilterEncoder::new(version).encode(filter)
}

fn uses_gml(filter: &Filter) -> bool {
    match filter {
        Filter::BBox { .. } => true,
        Filter::And { filters } | Filter::Or { filters } => filters.iter().any(uses_gml),
        Filter::Not { filter } => uses_gml(filter),
        _ => false,
    }
}

struct Output {
    writer: Writer<Vec<u8>>,
    version: FilterVersion,
}

impl Output {
    fn event(&mut self, event: Event<'_>) -> Result<(), FilterError> {
        self.writer
            .write_event(event)
            .map_err(|e| FilterError::Xml(e.to_string()))
    }

    fn end(&mut self, name: &str) -> Result<(), FilterError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), FilterError> {
        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn is_1_1(&self) -> bool {
        self.version == FilterVersion::V1_1_0
    }

    fn filter(&mut self, filter: &Filter) -> Result<(), FilterError> {
        match filter {
            Filter::Comparison {
                op,
                property,
                value,
                match_case,
            } => {
                let name = format!("ogc:{}", op.element_name());
                let mut tag = BytesStart::new(name.as_str());
                if self.is_1_1() && !match_case {
                    tag.push_attribute(("matchCase", "false"));
                }
                self.event(Event::Start(tag))?;
                self.text_element("ogc:PropertyName", property)?;
                self.text_element("ogc:Literal", value)?;
                self.end(&name)
            }
            Filter::Like {
                property,
                pattern,
                wild_card,
                single_char,
                escape_char,
                match_case,
            } => {
                let (wild, single, escape) = (
                    wild_card.to_string(),
                    single_char.to_string(),
                    escape_char.to_string(),
                );
                let mut tag = BytesStart::new("ogc:PropertyIsLike");
                tag.push_attribute(("wildCard", wild.as_str()));
                tag.push_attribute(("singleChar", single.as_str()));
                if self.is_1_1() {
                    tag.push_attribute(("escapeChar", escape.as_str()));
                    if !match_case {
                        tag.push_attribute(("matchCase", "false"));
                    }
                } else {
                    tag.push_attribute(("escape", escape.as_str()));
                }
                self.event(Event::Start(tag))?;
                self.text_element("ogc:PropertyName", property)?;
                self.text_element("ogc:Literal", pattern)?;
                self.end("ogc:PropertyIsLike")
            }
            Filter::IsNull { property } => {
                self.event(Event::Start(BytesStart::new("ogc:PropertyIsNull")))?;
                self.text_element("ogc:PropertyName", property)?;
                self.end("ogc:PropertyIsNull")
            }
            Filter::Between {
                property,
                lower,
                upper,
            } => {
                self.event(Event::Start(BytesStart::new("ogc:PropertyIsBetween")))?;
                self.text_element("ogc:PropertyName", property)?;
                self.event(Event::Start(BytesStart::new("ogc:LowerBoundary")))?;
                self.text_element("ogc:Literal", lower)?;
                self.end("ogc:LowerBoundary")?;
                self.event(Event::Start(BytesStart::new("ogc:UpperBoundary")))?;
                self.text_element("ogc:Literal", upper)?;
                self.end("ogc:UpperBoundary")?;
                self.end("ogc:PropertyIsBetween")
            }
            Filter::BBox {
                property,
                bounds,
                srs_name,
            } => self.bbox(property.as_deref(), bounds, srs_name.as_deref()),
            Filter::FeatureId { ids } => {
                if ids.is_empty() {
                    return Err(FilterError::EmptyFeatureIds);
                }
                for id in ids {
                    let mut tag = BytesStart::new("ogc:FeatureId");
                    tag.push_attribute(("fid", id.as_str()));
                    self.event(Event::Empty(tag))?;
                }
                Ok(())
            }
            Filter::And { filters } => self.logical("ogc:And", "And", filters),
            Filter::Or { filters } => self.logical("ogc:Or", "Or", filters),
            Filter::Not { filter } => {
                self.event(Event::Start(BytesStart::new("ogc:Not")))?;
                self.filter(filter)?;
                self.end("ogc:Not")
            }
        }
    }

    fn logical(
        &mut self,
        element: &str,
        op: &'static str,
        filters: &[Filter],
    ) -> Result<(), FilterError> {
        if filters.len() < 2 {
            return Err(FilterError::TooFewOperands {
                op,
                got: filters.len(),
            });
        }
        self.event(Event::Start(BytesStart::new(element)))?;
        for child in filters {
            self.filter(child)?;
        }
        self.end(element)
    }

    fn bbox(
        &mut self,
        property: Option<&str>,
        bounds: &Bounds,
        srs_name: Option<&str>,
    ) -> Result<(), FilterError> {
        if !bounds.is_valid() {
            return Err(FilterError::InvalidBounds(bounds.to_bbox_param()));
        }
        self.event(Event::Start(BytesStart::new("ogc:BBOX")))?;
        match property {
            Some(p) => self.text_element("ogc:PropertyName", p)?,
            // 1.0.0 has no notion of a default geometry.
            None if !self.is_1_1() => {
                return Err(FilterError::MissingProperty {
                    element: "BBOX",
                    version: self.version.as_str(),
                });
            }
            None => {}
        }
        if self.is_1_1() {
            let mut envelope = BytesStart::new("gml:Envelope");
            if let Some(srs) = srs_name {
                envelope.push_attribute(("srsName", srs));
            }
            self.event(Event::Start(envelope))?;
            self.text_element(
                "gml:lowerCorner",
                &format!("{} {}", bounds.min_x, bounds.min_y),
            )?;
            self.text_element(
                "gml:upperCorner",
                &format!("{} {}", bounds.max_x, bounds.max_y),
            )?;
            self.end("gml:Envelope")?;
        } else {
            let mut gml_box = BytesStart::new("gml:Box");
            if let Some(srs) = srs_name {
                gml_box.push_attribute(("srsName", srs));
            }
            self.event(Event::Start(gml_box))?;
            let mut coords = BytesStart::new("gml:coordinates");
            coords.push_attribute(("decimal", "."));
            coords.push_attribute(("cs", ","));
            coords.push_attribute(("ts", " "));
            self.event(Event::Start(coords))?;
            let text = format!(
                "{},{} {},{}",
                bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
            );
            self.event(Event::Text(BytesText::new(&text)))?;
            self.end("gml:coordinates")?;
            self.end("gml:Box")?;
        }
        self.end("ogc:BBOX")
    }
}
