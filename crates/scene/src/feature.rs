use std::collections::BTreeMap;

use foundation::bounds::Extent;
use foundation::geometry::{MultiPolygon, extent_of};
use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geo::Centroid;

use crate::fields;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Null,
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

/// Attribute table of one feature. Sorted keys keep iteration deterministic.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Immutable dataset record. Shared downstream as `Arc<Feature>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: MultiPolygon,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: MultiPolygon, attributes: Attributes) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }

    pub fn attribute(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }

    /// Numeric attribute; `None` when missing or not a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.attribute(field).and_then(AttributeValue::as_f64)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.attribute(field).and_then(AttributeValue::as_str)
    }

    pub fn name(&self) -> &str {
        self.text(fields::PLACE_NAME).unwrap_or("")
    }

    pub fn extent(&self) -> Option<Extent> {
        extent_of(&self.geometry)
    }

    /// Area-weighted centroid; anchors popups.
    pub fn centroid(&self) -> Option<Vec2> {
        self.geometry.centroid().map(Vec2::from)
    }
}
