//! Data source configuration: which server the layers talk to.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default server root, a local GeoServer.
pub const DEFAULT_HOST: &str = "http://localhost:8080/geoserver/";

/// Default projection for feature reads and map requests.
pub const DEFAULT_PROJECTION: &str = "EPSG:3857";

/// Environment variable holding the server root.
pub const ENV_HOST: &str = "GEOLAYER_HOST";
/// Environment variable holding the workspace name.
pub const ENV_WORKSPACE: &str = "GEOLAYER_WORKSPACE";
/// Environment variable holding the projection code.
pub const ENV_PROJECTION: &str = "GEOLAYER_PROJECTION";

/// Where the geospatial services live and how their data is projected.
///
/// Passed explicitly into every factory call. There is no process-wide
/// instance; construct one at startup and share it.
///
/// # Example
///
/// ```
/// use geolayer_core::DataSource;
///
/// let source = DataSource::new("https://maps.example.org/geoserver/")
///     .workspace("geodengue")
///     .projection("EPSG:4326");
/// assert_eq!(source.service_url("wms"), "https://maps.example.org/geoserver/wms");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Server root, e.g. `http://localhost:8080/geoserver/`.
    pub host: String,
    /// Workspace that bare layer names are published under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Projection code used as `srsName` for reads.
    #[serde(default = "default_projection")]
    pub projection_code: String,
}

fn default_projection() -> String {
    DEFAULT_PROJECTION.to_owned()
}

impl DataSource {
    /// Create a data source for the given server root with the default
    /// projection and no workspace.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            workspace: None,
            projection_code: default_projection(),
        }
    }

    /// Set the workspace.
    #[must_use]
    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Override the projection code.
    #[must_use]
    pub fn projection(mut self, code: impl Into<String>) -> Self {
        self.projection_code = code.into();
        self
    }

    /// Read the configuration from `GEOLAYER_HOST`, `GEOLAYER_WORKSPACE`
    /// and `GEOLAYER_PROJECTION`. Only the host is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`DataSource::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .filter(|h| !h.trim().is_empty())
            .ok_or(ConfigError::MissingField(ENV_HOST))?;
        let mut source = Self::new(host);
        if let Some(ws) = lookup(ENV_WORKSPACE).filter(|w| !w.is_empty()) {
            source = source.workspace(ws);
        }
        if let Some(code) = lookup(ENV_PROJECTION).filter(|c| !c.is_empty()) {
            source = source.projection(code);
        }
        source.validate()?;
        Ok(source)
    }

    /// Check that the host is an http(s) URL and the projection is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("host"));
        }
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: format!("expected an http(s) URL, got {:?}", self.host),
            });
        }
        if self.projection_code.trim().is_empty() {
            return Err(ConfigError::MissingField("projection_code"));
        }
        Ok(())
    }

    /// Join the server root with a service suffix (`"wms"`, `"ows"`, `"wfs"`).
    pub fn service_url(&self, suffix: &str) -> String {
        let suffix = suffix.trim_start_matches('/');
        if self.host.ends_with('/') {
            format!("{}{suffix}", self.host)
        } else {
            format!("{}/{suffix}", self.host)
        }
    }

    /// Prefix a bare layer name with the workspace.
    ///
    /// Names that already carry a prefix, and every name when no workspace
    /// is set, are returned unchanged.
    pub fn qualified_layer(&self, name: &str) -> String {
        match self.workspace.as_deref().map(str::trim) {
            Some(ws) if !ws.is_empty() && !name.contains(':') => format!("{ws}:{name}"),
            _ => name.to_owned(),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn service_url_joins_with_single_slash() {
        let with_slash = DataSource::new("http://host/geoserver/");
        let without = DataSource::new("http://host/geoserver");
        assert_eq!(with_slash.service_url("ows"), "http://host/geoserver/ows");
        assert_eq!(without.service_url("ows"), "http://host/geoserver/ows");
        assert_eq!(without.service_url("/wms"), "http://host/geoserver/wms");
    }

    #[test]
    fn from_lookup_reads_all_vars() {
        let source = DataSource::from_lookup(lookup_from(&[
            (ENV_HOST, "https://gis.example.org/geoserver/"),
            (ENV_WORKSPACE, "geodengue"),
            (ENV_PROJECTION, "EPSG:4326"),
        ]))
        .unwrap();
        assert_eq!(source.host, "https://gis.example.org/geoserver/");
        assert_eq!(source.workspace.as_deref(), Some("geodengue"));
        assert_eq!(source.projection_code, "EPSG:4326");
    }

    #[test]
    fn from_lookup_requires_host() {
        let err = DataSource::from_lookup(lookup_from(&[(ENV_WORKSPACE, "ws")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingField(ENV_HOST));
    }

    #[test]
    fn from_lookup_defaults_projection() {
        let source = DataSource::from_lookup(lookup_from(&[(ENV_HOST, "http://h/")])).unwrap();
        assert_eq!(source.projection_code, DEFAULT_PROJECTION);
        assert!(source.workspace.is_none());
    }

    #[test]
    fn qualified_layer_prefixes_bare_names_only() {
        let source = DataSource::new("http://h/").workspace("geodengue");
        assert_eq!(source.qualified_layer("manzanas"), "geodengue:manzanas");
        assert_eq!(source.qualified_layer("otro:manzanas"), "otro:manzanas");

        let bare = DataSource::new("http://h/");
        assert_eq!(bare.qualified_layer("manzanas"), "manzanas");
        assert_eq!(bare.clone().workspace(" ").qualified_layer("manzanas"), "manzanas");
    }

    #[test]
    fn validate_rejects_non_http_host() {
        let err = DataSource::new("ftp://host/").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "host", .. }));
    }

    #[test]
    fn deserializes_with_defaults() {
        let source: DataSource =
            serde_json::from_str(r#"{"host":"http://localhost:8080/geoserver/"}"#).unwrap();
        assert_eq!(source, DataSource::default());
    }
}
