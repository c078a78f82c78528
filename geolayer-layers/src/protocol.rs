//! Protocol builder: layer config → [`ProtocolDescriptor`].

use crate::config::LayerConfig;
use geolayer_core::{ConfigError, DataSource, ProtocolDescriptor};

/// Service suffix vector layers are read and written through.
pub const DEFAULT_SERVICE: &str = "ows";

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField(field)),
    }
}

/// Build the read/write protocol descriptor for a vector layer.
///
/// The endpoint is `source.host` joined with `config.service`; the
/// projection is the data source's. Namespace and filter are carried over
/// only when the config has them.
///
/// # Errors
///
/// [`ConfigError::MissingField`] when `layer_name`, `geometry_name` or
/// `service` is missing or blank.
pub fn build_protocol(
    source: &DataSource,
    config: &LayerConfig,
) -> Result<ProtocolDescriptor, ConfigError> {
    let layer_name = required(Some(config.layer_name.as_str()), "layer_name")?;
    let geometry_name = required(config.geometry_name.as_deref(), "geometry_name")?;
    let service = required(config.service.as_deref(), "service")?;

    let mut descriptor = ProtocolDescriptor::new(
        source.service_url(service),
        layer_name,
        geometry_name,
        source.projection_code.as_str(),
    );
    if let Some(ns) = config.namespace() {
        descriptor = descriptor.with_namespace(ns);
    }
    if let Some(filter) = &config.filter {
        descriptor = descriptor.with_filter(filter.clone());
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geolayer_core::{Filter, WFS_VERSION};

    fn source() -> DataSource {
        DataSource::new("http://gis.local/geoserver/").projection("EPSG:900913")
    }

    fn config() -> LayerConfig {
        LayerConfig::new("larvitrampas")
            .geometry_name("the_geom")
            .service(DEFAULT_SERVICE)
    }

    #[test]
    fn descriptor_mirrors_config() {
        let d = build_protocol(&source(), &config()).unwrap();
        assert_eq!(d.service_url(), "http://gis.local/geoserver/ows");
        assert_eq!(d.version(), WFS_VERSION);
        assert_eq!(d.feature_type(), "larvitrampas");
        assert_eq!(d.geometry_name(), "the_geom");
        assert_eq!(d.srs_name(), "EPSG:900913");
    }

    #[test]
    fn namespace_round_trips_only_when_present() {
        let without = build_protocol(&source(), &config()).unwrap();
        assert!(without.feature_namespace().is_none());

        let with = build_protocol(&source(), &config().feature_namespace("http://geodengue.org"))
            .unwrap();
        assert_eq!(with.feature_namespace(), Some("http://geodengue.org"));
    }

    #[test]
    fn filter_round_trips_only_when_present() {
        assert!(build_protocol(&source(), &config()).unwrap().filter().is_none());

        let f = Filter::greater_than("larvas", 0);
        let d = build_protocol(&source(), &config().filter(f.clone())).unwrap();
        assert_eq!(d.filter(), Some(&f));
    }

    #[test]
    fn missing_service_fails_fast() {
        let cfg = LayerConfig::new("larvitrampas").geometry_name("the_geom");
        assert_eq!(
            build_protocol(&source(), &cfg).unwrap_err(),
            ConfigError::MissingField("service")
        );
    }

    #[test]
    fn missing_geometry_fails_fast() {
        let cfg = LayerConfig::new("larvitrampas").service("ows");
        assert_eq!(
            build_protocol(&source(), &cfg).unwrap_err(),
            ConfigError::MissingField("geometry_name")
        );
    }

    #[test]
    fn blank_layer_name_fails_fast() {
        let cfg = LayerConfig::new("  ").geometry_name("g").service("ows");
        assert_eq!(
            build_protocol(&source(), &cfg).unwrap_err(),
            ConfigError::MissingField("layer_name")
        );
    }
}
