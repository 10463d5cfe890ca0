// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector features: geometry parts plus named attributes.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Stable identifier of a feature within its source.
pub type FeatureId = u64;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    String(String),
    Double(f64),
    Int(i64),
    Bool(bool),
}

impl AttributeValue {
    /// String form used for expression substitution.
    pub fn as_string(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Double(d) => d.to_string(),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::Bool(b) => b.to_string(),
        }
    }

    /// Numeric form, if the value has one.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Double(d) => Some(*d),
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Feature geometry.
///
/// Coordinates are expressed in the spatial reference of the feature source.
/// For geographic sources `x` is longitude and `y` latitude, both in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Unconnected points.
    PointSet(Vec<Point3<f64>>),
    /// Open polyline.
    LineString(Vec<Point3<f64>>),
    /// Closed polyline.
    Ring(Vec<Point3<f64>>),
    /// Outer ring with optional holes.
    Polygon {
        outer: Vec<Point3<f64>>,
        holes: Vec<Vec<Point3<f64>>>,
    },
    /// Collection of geometries.
    Multi(Vec<Geometry>),
}

impl Geometry {
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Geometry::PointSet(vec![Point3::new(x, y, z)])
    }

    /// Leaf parts in order, descending into collections.
    ///
    /// Polygon holes are not visited: instances are substituted at the
    /// vertices of outer boundaries only.
    pub fn parts(&self) -> Vec<&[Point3<f64>]> {
        let mut out = Vec::new();
        self.collect_parts(&mut out);
        out
    }

    fn collect_parts<'a>(&'a self, out: &mut Vec<&'a [Point3<f64>]>) {
        match self {
            Geometry::PointSet(points) | Geometry::LineString(points) | Geometry::Ring(points) => {
                out.push(points.as_slice())
            }
            Geometry::Polygon { outer, .. } => out.push(outer.as_slice()),
            Geometry::Multi(children) => {
                for child in children {
                    child.collect_parts(out);
                }
            }
        }
    }

    /// Number of vertices across all visited parts.
    pub fn total_points(&self) -> usize {
        self.parts().iter().map(|p| p.len()).sum()
    }
}

/// A vector feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Option<Geometry>,
    attributes: FxHashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry: Some(geometry),
            attributes: FxHashMap::default(),
        }
    }

    /// Feature carrying attributes only.
    pub fn without_geometry(id: FeatureId) -> Self {
        Self {
            id,
            geometry: None,
            attributes: FxHashMap::default(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_parts_skip_holes() {
        let geometry = Geometry::Polygon {
            outer: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            holes: vec![vec![Point3::new(0.5, 0.5, 0.0)]],
        };

        let parts = geometry.parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 3);
        assert_eq!(geometry.total_points(), 3);
    }

    #[test]
    fn multi_geometry_flattens_in_order() {
        let geometry = Geometry::Multi(vec![
            Geometry::point(1.0, 2.0, 0.0),
            Geometry::LineString(vec![Point3::new(3.0, 4.0, 0.0), Point3::new(5.0, 6.0, 0.0)]),
        ]);

        let parts = geometry.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0][0].x, 1.0);
        assert_eq!(parts[1][1].y, 6.0);
    }

    #[test]
    fn attribute_conversions() {
        let feature = Feature::new(7, Geometry::point(0.0, 0.0, 0.0))
            .with_attr("name", "oak")
            .with_attr("height", 12.5)
            .with_attr("count", 3_i64)
            .with_attr("scale", "1.5");

        assert_eq!(feature.get("name").unwrap().as_string(), "oak");
        assert_eq!(feature.get("height").unwrap().as_double(), Some(12.5));
        assert_eq!(feature.get("count").unwrap().as_double(), Some(3.0));
        assert_eq!(feature.get("scale").unwrap().as_double(), Some(1.5));
        assert_eq!(feature.get("name").unwrap().as_double(), None);
        assert!(feature.get("missing").is_none());
    }
}
