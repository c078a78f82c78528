//! GetFeature request parameters.

use crate::FEATURE_PREFIX;
use geolayer_core::{ProtocolDescriptor, ProtocolError};
use geolayer_filter::{FilterEncoder, FilterVersion};

/// Output format requested from the server for reads.
pub const GEOJSON_OUTPUT_FORMAT: &str = "application/json";

/// The `typeName` to send: bound to [`FEATURE_PREFIX`] when the
/// descriptor carries a namespace, as given otherwise.
pub fn type_name(protocol: &ProtocolDescriptor) -> String {
    qualify(protocol.feature_namespace().is_some(), protocol.feature_type())
}

/// Bind `name` to [`FEATURE_PREFIX`] when a namespace is declared.
///
/// Only `xmlns:feature` is ever declared, so a caller prefix
/// (`geodengue:patios`) is replaced rather than kept.
pub(crate) fn qualify(namespaced: bool, name: &str) -> String {
    if !namespaced {
        return name.to_owned();
    }
    let local = name.rsplit_once(':').map_or(name, |(_, local)| local);
    format!("{FEATURE_PREFIX}:{local}")
}

/// Key/value query parameters for a GetFeature read of `protocol`.
///
/// The filter, when present, is encoded with Filter Encoding 1.1.0 to
/// match the descriptor's WFS version.
pub fn get_feature_params(
    protocol: &ProtocolDescriptor,
    output_format: &str,
) -> Result<Vec<(&'static str, String)>, ProtocolError> {
    let mut params = vec![
        ("service", "WFS".to_owned()),
        ("version", protocol.version().to_owned()),
        ("request", "GetFeature".to_owned()),
        ("typeName", type_name(protocol)),
        ("srsName", protocol.srs_name().to_owned()),
        ("outputFormat", output_format.to_owned()),
    ];
    if let Some(ns) = protocol.feature_namespace() {
        params.push(("namespace", format!("xmlns({FEATURE_PREFIX}={ns})")));
    }
    if let Some(filter) = protocol.filter() {
        let xml = FilterEncoder::new(FilterVersion::V1_1_0)
            .encode(filter)
            .map_err(|e| ProtocolError::Encoding(e.to_string()))?;
        params.push(("filter", xml));
    }
    Ok(params)
}
