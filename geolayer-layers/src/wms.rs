//! Raster (WMS) layer factory.

use crate::error::LayerError;
use geolayer_core::{Bounds, DataSource, Filter};
use geolayer_filter::{FilterEncoder, FilterVersion};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Service suffix raster layers are drawn from.
pub const WMS_SERVICE: &str = "wms";
/// Image format requested for every raster layer.
pub const WMS_FORMAT: &str = "image/png";
/// WMS version used for GetMap URLs.
pub const WMS_VERSION: &str = "1.1.1";

const RESERVED: &[&str] = &[
    "SERVICE", "VERSION", "REQUEST", "LAYERS", "STYLES", "FORMAT", "TRANSPARENT", "FILTER",
    "SRS", "BBOX", "WIDTH", "HEIGHT",
];

/// One published layer to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerName {
    /// Published name (`workspace:layer` or bare).
    pub name: String,
}

impl From<&str> for LayerName {
    fn from(name: &str) -> Self {
        Self { name: name.to_owned() }
    }
}

impl From<String> for LayerName {
    fn from(name: String) -> Self {
        Self { name }
    }
}

/// What to build raster layers from.
#[derive(Debug, Clone, Default)]
pub struct WmsLayerConfig {
    /// One raster layer is built per entry, in order.
    pub names: Vec<LayerName>,
    /// Server-side filter applied to every layer.
    pub filter: Option<Filter>,
    /// Whether the layers are base layers. Defaults to `false`.
    pub is_base_layer: Option<bool>,
    /// Extra request parameters passed through unchanged.
    pub params: BTreeMap<String, String>,
}

impl WmsLayerConfig {
    /// Config for the given layer names.
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<LayerName>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the base layer flag.
    #[must_use]
    pub fn base_layer(mut self, is_base_layer: bool) -> Self {
        self.is_base_layer = Some(is_base_layer);
        self
    }

    /// Add an extra request parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// How the map animates a raster layer while zooming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionEffect {
    /// Stretch the current tiles until the new ones arrive.
    #[default]
    Resize,
}

/// Per-request parameters of a raster layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmsParams {
    /// The single layer this raster layer draws.
    pub layers: String,
    /// Image format.
    pub format: String,
    /// Whether the image background is transparent.
    pub transparent: bool,
    /// Encoded OGC filter, when the config had one.
    pub filter: Option<String>,
    /// Caller-supplied extras.
    pub extra: BTreeMap<String, String>,
}

impl WmsParams {
    /// The parameters as WMS query pairs (`LAYERS`, `FORMAT`, ...).
    ///
    /// Extras that collide with a standard parameter are dropped.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("LAYERS".to_owned(), self.layers.clone()),
            ("FORMAT".to_owned(), self.format.clone()),
            (
                "TRANSPARENT".to_owned(),
                if self.transparent { "TRUE" } else { "FALSE" }.to_owned(),
            ),
        ];
        if let Some(filter) = &self.filter {
            pairs.push(("FILTER".to_owned(), filter.clone()));
        }
        pairs.extend(
            self.extra
                .iter()
                .filter(|(k, _)| !RESERVED.contains(&k.to_ascii_uppercase().as_str()))
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

/// A raster layer drawn by the map server.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    /// Layer name, same as `params.layers`.
    pub name: String,
    /// WMS endpoint.
    pub url: String,
    /// Per-request parameters.
    pub params: WmsParams,
    /// Projection requested in GetMap URLs.
    pub srs: String,
    /// Zoom animation.
    pub transition_effect: TransitionEffect,
    /// Whether this is a base layer.
    pub is_base_layer: bool,
    /// Attribution text. Always empty.
    pub attribution: String,
}

impl RasterLayer {
    /// Full GetMap URL for a `width` x `height` image of `bbox`.
    ///
    /// # Errors
    ///
    /// [`LayerError::InvalidUrl`] if the endpoint does not parse or the
    /// request is degenerate.
    pub fn get_map_url(&self, bbox: &Bounds, width: u32, height: u32) -> Result<Url, LayerError> {
        if !bbox.is_valid() {
            return Err(LayerError::InvalidUrl(format!(
                "inverted bbox {}",
                bbox.to_bbox_param()
            )));
        }
        if width == 0 || height == 0 {
            return Err(LayerError::InvalidUrl(format!(
                "empty image size {width}x{height}"
            )));
        }
        let mut url =
            Url::parse(&self.url).map_err(|e| LayerError::InvalidUrl(format!("{}: {e}", self.url)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("SERVICE", "WMS")
                .append_pair("VERSION", WMS_VERSION)
                .append_pair("REQUEST", "GetMap")
                .append_pair("STYLES", "");
            for (key, value) in self.params.to_query() {
                query.append_pair(&key, &value);
            }
            query
                .append_pair("SRS", &self.srs)
                .append_pair("BBOX", &bbox.to_bbox_param())
                .append_pair("WIDTH", &width.to_string())
                .append_pair("HEIGHT", &height.to_string());
        }
        Ok(url)
    }
}

/// Build one raster layer per configured name.
///
/// The filter, if any, is encoded once (Filter Encoding 1.1.0) and shared
/// by every layer. Bare names are published under the source's workspace
/// when it has one.
///
/// # Errors
///
/// [`LayerError::Filter`] if the filter cannot be encoded.
pub fn build_wms_layers(
    source: &DataSource,
    config: &WmsLayerConfig,
) -> Result<Vec<RasterLayer>, LayerError> {
    let filter = config
        .filter
        .as_ref()
        .map(|f| FilterEncoder::new(FilterVersion::V1_1_0).encode(f))
        .transpose()?;
    let url = source.service_url(WMS_SERVICE);
    let is_base_layer = config.is_base_layer.unwrap_or(false);

    let layers: Vec<RasterLayer> = config
        .names
        .iter()
        .map(|entry| {
            let name = source.qualified_layer(&entry.name);
            RasterLayer {
                name: name.clone(),
                url: url.clone(),
                params: WmsParams {
                    layers: name,
                    format: WMS_FORMAT.to_owned(),
                    transparent: true,
                    filter: filter.clone(),
                    extra: config.params.clone(),
                },
                srs: source.projection_code.clone(),
                transition_effect: TransitionEffect::Resize,
                is_base_layer,
                attribution: String::new(),
            }
        })
        .collect();

    debug!(
        url = %url,
        layers = layers.len(),
        filtered = filter.is_some(),
        "built raster layers"
    );
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DataSource {
        DataSource::new("http://gis.local/geoserver/")
    }

    #[test]
    fn one_layer_per_name_in_order() {
        let cfg = WmsLayerConfig::new(["geodengue:manzanas", "geodengue:barrios"]).base_layer(true);
        let layers = build_wms_layers(&source(), &cfg).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "geodengue:manzanas");
        assert_eq!(layers[1].params.layers, "geodengue:barrios");
        for layer in &layers {
            assert!(layer.is_base_layer);
            assert_eq!(layer.transition_effect, TransitionEffect::Resize);
            assert_eq!(layer.url, "http://gis.local/geoserver/wms");
            assert_eq!(layer.params.format, "image/png");
            assert!(layer.params.transparent);
            assert!(layer.attribution.is_empty());
        }
    }

    #[test]
    fn bare_names_take_source_workspace() {
        let source = source().workspace("geodengue");
        let cfg = WmsLayerConfig::new(["manzanas", "otro:barrios"]);
        let layers = build_wms_layers(&source, &cfg).unwrap();
        assert_eq!(layers[0].name, "geodengue:manzanas");
        assert_eq!(layers[0].params.layers, "geodengue:manzanas");
        assert_eq!(layers[1].params.layers, "otro:barrios");
    }

    #[test]
    fn empty_names_give_no_layers() {
        let layers = build_wms_layers(&source(), &WmsLayerConfig::default()).unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn base_layer_defaults_to_false() {
        let layers = build_wms_layers(&source(), &WmsLayerConfig::new(["a"])).unwrap();
        assert!(!layers[0].is_base_layer);
    }

    #[test]
    fn filter_is_encoded_for_every_layer() {
        let cfg = WmsLayerConfig::new(["a", "b"]).filter(Filter::equal_to("barrio", "Centro"));
        let layers = build_wms_layers(&source(), &cfg).unwrap();
        for layer in &layers {
            let xml = layer.params.filter.as_deref().unwrap();
            assert!(xml.starts_with("<ogc:Filter"));
            assert!(xml.contains("<ogc:Literal>Centro</ogc:Literal>"));
        }
    }

    #[test]
    fn no_filter_means_no_filter_param() {
        let layers = build_wms_layers(&source(), &WmsLayerConfig::new(["a"])).unwrap();
        assert!(layers[0].params.filter.is_none());
        assert!(layers[0].params.to_query().iter().all(|(k, _)| k != "FILTER"));
    }

    #[test]
    fn unencodable_filter_fails() {
        let cfg = WmsLayerConfig::new(["a"]).filter(Filter::and(vec![Filter::is_null("x")]));
        let err = build_wms_layers(&source(), &cfg).unwrap_err();
        assert!(matches!(err, LayerError::Filter(_)));
    }

    #[test]
    fn extras_pass_through_but_cannot_override() {
        let cfg = WmsLayerConfig::new(["a"])
            .param("CQL_FILTER", "larvas > 0")
            .param("layers", "other");
        let layer = &build_wms_layers(&source(), &cfg).unwrap()[0];
        let query = layer.params.to_query();
        assert!(query.contains(&("CQL_FILTER".to_owned(), "larvas > 0".to_owned())));
        assert_eq!(query.iter().filter(|(k, _)| k.eq_ignore_ascii_case("layers")).count(), 1);
    }

    #[test]
    fn get_map_url_has_standard_params() {
        let layer = &build_wms_layers(&source(), &WmsLayerConfig::new(["a"])).unwrap()[0];
        let url = layer
            .get_map_url(&Bounds::new(0.0, 0.0, 10.0, 5.0), 256, 128)
            .unwrap();
        let pairs: BTreeMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/geoserver/wms");
        assert_eq!(pairs["REQUEST"], "GetMap");
        assert_eq!(pairs["LAYERS"], "a");
        assert_eq!(pairs["SRS"], "EPSG:3857");
        assert_eq!(pairs["BBOX"], "0,0,10,5");
        assert_eq!(pairs["WIDTH"], "256");
        assert_eq!(pairs["TRANSPARENT"], "TRUE");
    }

    #[test]
    fn get_map_url_rejects_degenerate_requests() {
        let layer = &build_wms_layers(&source(), &WmsLayerConfig::new(["a"])).unwrap()[0];
        assert!(layer.get_map_url(&Bounds::new(10.0, 0.0, 0.0, 5.0), 256, 256).is_err());
        assert!(layer.get_map_url(&Bounds::new(0.0, 0.0, 1.0, 1.0), 0, 256).is_err());
    }
}
