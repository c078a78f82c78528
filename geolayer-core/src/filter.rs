//! Server-side filter tree.
//!
//! A [`Filter`] narrows the features a service returns. Vector layers pass
//! it through to their protocol untouched; raster layers serialize it to
//! OGC Filter Encoding XML (see the `geolayer-filter` crate).

use serde::{Deserialize, Serialize};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    /// `=`
    EqualTo,
    /// `<>`
    NotEqualTo,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanOrEqualTo,
    /// `>=`
    GreaterThanOrEqualTo,
}

impl ComparisonOp {
    /// Local element name in the OGC filter schema.
    pub fn element_name(self) -> &'static str {
        match self {
            ComparisonOp::EqualTo => "PropertyIsEqualTo",
            ComparisonOp::NotEqualTo => "PropertyIsNotEqualTo",
            ComparisonOp::LessThan => "PropertyIsLessThan",
            ComparisonOp::GreaterThan => "PropertyIsGreaterThan",
            ComparisonOp::LessThanOrEqualTo => "PropertyIsLessThanOrEqualTo",
            ComparisonOp::GreaterThanOrEqualTo => "PropertyIsGreaterThanOrEqualTo",
        }
    }
}

/// An axis-aligned bounding box in the coordinates of `srs_name` (or the
/// layer projection when absent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum x (west).
    pub min_x: f64,
    /// Minimum y (south).
    pub min_y: f64,
    /// Maximum x (east).
    pub max_x: f64,
    /// Maximum y (north).
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from left, bottom, right, top.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether min is not greater than max on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// `minx,miny,maxx,maxy`, the form WMS `BBOX` parameters take.
    pub fn to_bbox_param(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// A filter expression.
///
/// Values are carried as strings; the server casts them against the
/// property type, which is how OGC literals work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// `property <op> value`.
    Comparison {
        /// The operator.
        op: ComparisonOp,
        /// Property name.
        property: String,
        /// Literal value.
        value: String,
        /// Whether string comparison is case sensitive.
        match_case: bool,
    },

    /// Pattern match on a string property.
    Like {
        /// Property name.
        property: String,
        /// Pattern using the wildcard characters below.
        pattern: String,
        /// Multi-character wildcard.
        wild_card: char,
        /// Single-character wildcard.
        single_char: char,
        /// Escape character.
        escape_char: char,
        /// Whether matching is case sensitive.
        match_case: bool,
    },

    /// Property has no value.
    IsNull {
        /// Property name.
        property: String,
    },

    /// `lower <= property <= upper`.
    Between {
        /// Property name.
        property: String,
        /// Inclusive lower bound.
        lower: String,
        /// Inclusive upper bound.
        upper: String,
    },

    /// Geometry intersects the box.
    BBox {
        /// Geometry property; the server default geometry when absent.
        property: Option<String>,
        /// The box.
        bounds: Bounds,
        /// Projection of the box coordinates.
        srs_name: Option<String>,
    },

    /// Features with exactly these ids.
    FeatureId {
        /// Feature ids, e.g. `larvitrampas.12`.
        ids: Vec<String>,
    },

    /// All children match. Needs at least two children.
    And {
        /// Child filters.
        filters: Vec<Filter>,
    },

    /// Any child matches. Needs at least two children.
    Or {
        /// Child filters.
        filters: Vec<Filter>,
    },

    /// The child does not match.
    Not {
        /// The negated filter.
        filter: Box<Filter>,
    },
}

impl Filter {
    fn comparison(op: ComparisonOp, property: impl Into<String>, value: impl ToString) -> Self {
        Filter::Comparison {
            op,
            property: property.into(),
            value: value.to_string(),
            match_case: true,
        }
    }

    /// `property = value`.
    pub fn equal_to(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::EqualTo, property, value)
    }

    /// `property <> value`.
    pub fn not_equal_to(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::NotEqualTo, property, value)
    }

    /// `property < value`.
    pub fn less_than(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::LessThan, property, value)
    }

    /// `property > value`.
    pub fn greater_than(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::GreaterThan, property, value)
    }

    /// `property <= value`.
    pub fn less_or_equal(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::LessThanOrEqualTo, property, value)
    }

    /// `property >= value`.
    pub fn greater_or_equal(property: impl Into<String>, value: impl ToString) -> Self {
        Self::comparison(ComparisonOp::GreaterThanOrEqualTo, property, value)
    }

    /// Case-insensitive `LIKE` with `*`, `.` and `!` as wildcard, single
    /// character and escape.
    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            property: property.into(),
            pattern: pattern.into(),
            wild_card: '*',
            single_char: '.',
            escape_char: '!',
            match_case: false,
        }
    }

    /// `property IS NULL`.
    pub fn is_null(property: impl Into<String>) -> Self {
        Filter::IsNull {
            property: property.into(),
        }
    }

    /// `lower <= property <= upper`.
    pub fn between(
        property: impl Into<String>,
        lower: impl ToString,
        upper: impl ToString,
    ) -> Self {
        Filter::Between {
            property: property.into(),
            lower: lower.to_string(),
            upper: upper.to_string(),
        }
    }

    /// Bounding-box intersection on the default geometry.
    pub fn bbox(bounds: Bounds) -> Self {
        Filter::BBox {
            property: None,
            bounds,
            srs_name: None,
        }
    }

    /// Features with the given ids.
    pub fn feature_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::FeatureId {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Disjunction.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }
}
