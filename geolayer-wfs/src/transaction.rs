//! WFS-T `Transaction` documents.

use crate::error::xml_error;
use crate::gml::write_geometry;
use crate::request::qualify;
use crate::{FEATURE_PREFIX, WFS_NAMESPACE};
use geolayer_core::{Feature, FeatureState, Filter, ProtocolDescriptor, ProtocolError};
use geolayer_filter::{FilterEncoder, FilterVersion, GML_NAMESPACE, OGC_NAMESPACE};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;

type Xml = Writer<Vec<u8>>;

/// Element names for one feature type, qualified when a namespace is set.
struct Names {
    qualified: bool,
    type_name: String,
}

impl Names {
    fn new(protocol: &ProtocolDescriptor) -> Self {
        let qualified = protocol.feature_namespace().is_some();
        Self {
            qualified,
            type_name: qualify(qualified, protocol.feature_type()),
        }
    }

    fn property(&self, local: &str) -> String {
        qualify(self.qualified, local)
    }
}

fn start(w: &mut Xml, tag: BytesStart<'_>) -> Result<(), ProtocolError> {
    w.write_event(Event::Start(tag)).map_err(xml_error)
}

fn end(w: &mut Xml, name: &str) -> Result<(), ProtocolError> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn text_element(w: &mut Xml, name: &str, text: &str) -> Result<(), ProtocolError> {
    start(w, BytesStart::new(name))?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(w, name)
}

/// Text form of a property value; `None` for nulls, which are omitted.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn require_id(feature: &Feature, action: &str) -> Result<String, ProtocolError> {
    feature
        .id
        .clone()
        .ok_or_else(|| ProtocolError::Encoding(format!("cannot {action} a feature without an id")))
}

fn id_filter(w: &mut Xml, id: String) -> Result<(), ProtocolError> {
    let xml = FilterEncoder::new(FilterVersion::V1_1_0)
        .encode(&Filter::feature_ids([id]))
        .map_err(|e| ProtocolError::Encoding(e.to_string()))?;
    w.write_event(Event::Text(BytesText::from_escaped(xml)))
        .map_err(xml_error)
}

fn insert(
    w: &mut Xml,
    names: &Names,
    protocol: &ProtocolDescriptor,
    feature: &Feature,
) -> Result<(), ProtocolError> {
    start(w, BytesStart::new("wfs:Insert"))?;
    start(w, BytesStart::new(names.type_name.as_str()))?;
    if let Some(geometry) = &feature.geometry {
        let name = names.property(protocol.geometry_name());
        start(w, BytesStart::new(name.as_str()))?;
        write_geometry(w, geometry, protocol.srs_name())?;
        end(w, &name)?;
    }
    for (key, value) in &feature.properties {
        if let Some(text) = value_text(value) {
            text_element(w, &names.property(key), &text)?;
        }
    }
    end(w, &names.type_name)?;
    end(w, "wfs:Insert")
}

fn update(
    w: &mut Xml,
    names: &Names,
    protocol: &ProtocolDescriptor,
    feature: &Feature,
) -> Result<(), ProtocolError> {
    let id = require_id(feature, "update")?;
    let mut tag = BytesStart::new("wfs:Update");
    tag.push_attribute(("typeName", names.type_name.as_str()));
    start(w, tag)?;
    if let Some(geometry) = &feature.geometry {
        start(w, BytesStart::new("wfs:Property"))?;
        text_element(w, "wfs:Name", protocol.geometry_name())?;
        start(w, BytesStart::new("wfs:Value"))?;
        write_geometry(w, geometry, protocol.srs_name())?;
        end(w, "wfs:Value")?;
        end(w, "wfs:Property")?;
    }
    for (key, value) in &feature.properties {
        start(w, BytesStart::new("wfs:Property"))?;
        text_element(w, "wfs:Name", key)?;
        // A property without a Value element is set to null.
        if let Some(text) = value_text(value) {
            text_element(w, "wfs:Value", &text)?;
        }
        end(w, "wfs:Property")?;
    }
    id_filter(w, id)?;
    end(w, "wfs:Update")
}

fn delete(w: &mut Xml, names: &Names, feature: &Feature) -> Result<(), ProtocolError> {
    let id = require_id(feature, "delete")?;
    let mut tag = BytesStart::new("wfs:Delete");
    tag.push_attribute(("typeName", names.type_name.as_str()));
    start(w, tag)?;
    id_filter(w, id)?;
    end(w, "wfs:Delete")
}

/// Build a WFS 1.1.0 `Transaction` committing `features`.
///
/// Features in state [`FeatureState::Insert`], [`FeatureState::Update`]
/// and [`FeatureState::Delete`] become the matching actions, in input
/// order. `Unknown` features are skipped. Updates and deletes need an id.
pub fn write_transaction(
    protocol: &ProtocolDescriptor,
    features: &[Feature],
) -> Result<String, ProtocolError> {
    let names = Names::new(protocol);
    let mut w = Writer::new(Vec::new());

    let mut root = BytesStart::new("wfs:Transaction");
    root.push_attribute(("service", "WFS"));
    root.push_attribute(("version", protocol.version()));
    root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
    root.push_attribute(("xmlns:ogc", OGC_NAMESPACE));
    root.push_attribute(("xmlns:gml", GML_NAMESPACE));
    let ns_attr = format!("xmlns:{FEATURE_PREFIX}");
    if let Some(ns) = protocol.feature_namespace() {
        root.push_attribute((ns_attr.as_str(), ns));
    }
    start(&mut w, root)?;

    for feature in features {
        match feature.state {
            FeatureState::Insert => insert(&mut w, &names, protocol, feature)?,
            FeatureState::Update => update(&mut w, &names, protocol, feature)?,
            FeatureState::Delete => delete(&mut w, &names, feature)?,
            FeatureState::Unknown => {}
        }
    }

    end(&mut w, "wfs:Transaction")?;
    String::from_utf8(w.into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protocol() -> ProtocolDescriptor {
        ProtocolDescriptor::new("http://h/ows", "patios", "the_geom", "EPSG:3857")
            .with_namespace("http://geodengue.org")
    }

    #[test]
    fn root_declares_namespaces() {
        let xml = write_transaction(&protocol(), &[]).unwrap();
        assert!(xml.starts_with("<wfs:Transaction service=\"WFS\" version=\"1.1.0\""));
        assert!(xml.contains("xmlns:feature=\"http://geodengue.org\""));
        assert!(xml.ends_with("</wfs:Transaction>"));
    }

    #[test]
    fn insert_writes_geometry_and_properties() {
        let f = Feature::new(json!({"type": "Point", "coordinates": [1, 2]}))
            .with_property("nombre", json!("patio & casa"))
            .with_property("limpio", json!(false))
            .with_property("nulo", Value::Null);
        let xml = write_transaction(&protocol(), &[f]).unwrap();
        assert!(xml.contains(
            "<wfs:Insert><feature:patios><feature:the_geom><gml:Point srsName=\"EPSG:3857\"><gml:pos>1 2</gml:pos></gml:Point></feature:the_geom>"
        ));
        assert!(xml.contains("<feature:nombre>patio &amp; casa</feature:nombre>"));
        assert!(xml.contains("<feature:limpio>false</feature:limpio>"));
        assert!(!xml.contains("nulo"));
    }

    #[test]
    fn update_targets_feature_id() {
        let f = Feature::default()
            .with_id("patios.3")
            .with_property("limpio", json!(true))
            .with_state(FeatureState::Update);
        let xml = write_transaction(&protocol(), &[f]).unwrap();
        assert!(xml.contains("<wfs:Update typeName=\"feature:patios\">"));
        assert!(xml.contains(
            "<wfs:Property><wfs:Name>limpio</wfs:Name><wfs:Value>true</wfs:Value></wfs:Property>"
        ));
        assert!(xml.contains("<ogc:FeatureId fid=\"patios.3\"/>"));
    }

    #[test]
    fn delete_targets_feature_id() {
        let f = Feature::default()
            .with_id("patios.9")
            .with_state(FeatureState::Delete);
        let xml = write_transaction(&protocol(), &[f]).unwrap();
        assert!(xml.contains("<wfs:Delete typeName=\"feature:patios\"><ogc:Filter"));
        assert!(xml.contains("<ogc:FeatureId fid=\"patios.9\"/></ogc:Filter></wfs:Delete>"));
    }

    #[test]
    fn unqualified_without_namespace() {
        let p = ProtocolDescriptor::new("http://h/ows", "patios", "the_geom", "EPSG:3857");
        let f = Feature::new(json!({"type": "Point", "coordinates": [0, 0]}));
        let xml = write_transaction(&p, &[f]).unwrap();
        assert!(!xml.contains("xmlns:feature"));
        assert!(xml.contains("<wfs:Insert><patios><the_geom>"));
    }

    #[test]
    fn caller_prefix_is_replaced_by_declared_prefix() {
        let p = ProtocolDescriptor::new("http://h/ows", "geodengue:patios", "the_geom", "EPSG:3857")
            .with_namespace("http://geodengue.org");
        let f = Feature::new(json!({"type": "Point", "coordinates": [0, 0]}));
        let xml = write_transaction(&p, &[f]).unwrap();
        assert!(xml.contains("<wfs:Insert><feature:patios><feature:the_geom>"));
        assert!(xml.contains("</feature:patios></wfs:Insert>"));
        assert!(!xml.contains("geodengue:"));
    }

    #[test]
    fn clean_features_are_skipped() {
        let f = Feature::default().with_id("patios.1");
        let xml = write_transaction(&protocol(), &[f]).unwrap();
        assert!(!xml.contains("patios.1"));
    }

    #[test]
    fn delete_without_id_is_rejected() {
        let f = Feature::default().with_state(FeatureState::Delete);
        let err = write_transaction(&protocol(), &[f]).unwrap_err();
        assert!(matches!(err, ProtocolError::Encoding(_)));
    }
}
