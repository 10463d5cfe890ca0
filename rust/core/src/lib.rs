// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Instancer Core
//!
//! Data model for substituting instanced models at feature vertices:
//!
//! - **Features**: geometry parts plus typed attributes
//! - **Styles**: instance symbols (model or icon) carrying URL, scale and
//!   heading expressions
//! - **Expressions**: pluggable evaluation with a built-in `[attribute]`
//!   substitution evaluator (parsed with [nom](https://docs.rs/nom))
//! - **Spatial references**: geographic, web-mercator and geocentric
//!   conversions on a reference ellipsoid
//! - **Resources**: instance descriptors and named resource libraries
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for attribute values, URIs and
//!   spatial references

pub mod ellipsoid;
pub mod error;
pub mod expression;
pub mod feature;
pub mod resource;
pub mod srs;
pub mod style;
pub mod uri;

pub use nalgebra::{Matrix4, Point3, Vector3};

pub use ellipsoid::Ellipsoid;
pub use error::{Error, Result};
pub use expression::{AttributeEvaluator, ExpressionEvaluator, NumericExpression, StringExpression};
pub use feature::{AttributeValue, Feature, FeatureId, Geometry};
pub use resource::{InstanceResource, ResourceKind, ResourceLibrary};
pub use srs::{GeoExtent, SpatialReference, SrsKind};
pub use style::{
    IconOptions, InstanceSymbol, InstanceSymbolKind, LineSymbol, ModelOptions, PolygonSymbol, Style,
    StyleSheet, Symbol,
};
pub use uri::Uri;
