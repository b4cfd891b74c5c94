//! Feature collections handed to rendering collaborators
//!
//! - Feature: geometry + attributes
//! - FeatureCollection: ordered collection of features, convertible to GeoJSON

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&AttributeValue> for serde_json::Value {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Int(i) => serde_json::Value::from(*i),
            // NaN and infinities have no JSON form
            AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, kept sorted for stable output
    pub properties: BTreeMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: BTreeMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        let properties: geojson::JsonObject = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
            .collect();
        geojson::Feature {
            bbox: None,
            geometry: self
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: self.id.clone().map(geojson::feature::Id::String),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Collection of features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
