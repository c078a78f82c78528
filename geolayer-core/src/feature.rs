//! GeoJSON-shaped features and their edit state.

use serde::{Deserialize, Deserializer, Serialize};

/// Edit state of a feature relative to the server.
///
/// The save strategy commits every feature whose state is not
/// [`FeatureState::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    /// In sync with the server (or never tracked).
    #[default]
    Unknown,
    /// Created locally, not yet on the server.
    Insert,
    /// Changed locally.
    Update,
    /// Removed locally, still on the server.
    Delete,
}

/// A single feature: id, geometry and attribute properties.
///
/// Geometry is kept as a GeoJSON geometry object. Parsing it into typed
/// coordinates is left to whoever renders or edits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Server-assigned id (`layer.42`), absent for new features.
    #[serde(
        default,
        deserialize_with = "id_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// GeoJSON geometry object.
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
    /// Attribute values.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Local edit state. Never sent or read over the wire.
    #[serde(skip)]
    pub state: FeatureState,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl Feature {
    /// A new feature with the given geometry, marked for insertion.
    pub fn new(geometry: serde_json::Value) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: serde_json::Map::new(),
            state: FeatureState::Insert,
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Set the edit state.
    #[must_use]
    pub fn with_state(mut self, state: FeatureState) -> Self {
        self.state = state;
        self
    }

    /// Whether this feature has local changes to commit.
    pub fn is_dirty(&self) -> bool {
        self.state != FeatureState::Unknown
    }

    /// GeoJSON geometry type (`"Point"`, `"Polygon"`, ...), if any.
    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref()?.get("type")?.as_str()
    }
}

/// A set of features as returned by a read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// The features, in server order.
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Total matching features on the server, when reported.
    #[serde(
        default,
        rename = "totalFeatures",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_features: Option<u64>,
}

impl FeatureCollection {
    /// Wrap a list of features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            total_features: None,
        }
    }

    /// Number of features returned.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no features were returned.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate the features.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
