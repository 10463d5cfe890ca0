// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instancer Geometry
//!
//! Placement math for substituted instances using nalgebra: per-point
//! placement matrices in flat and geocentric maps, tile localizers, and a
//! small triangle mesh type for instance prototypes.

pub mod error;
pub mod localizer;
pub mod mesh;
pub mod placement;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};

pub use error::{Error, Result};
pub use localizer::Localizer;
pub use mesh::Mesh;
pub use placement::{
    heading_matrix, normalize_scale, scale_matrix, transform_and_get_rotation, PlacementCalculator,
};
