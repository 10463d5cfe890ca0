// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-point placement matrices for substituted instances.
//!
//! A placement is built from, in application order:
//!
//! 1. a (possibly non-uniform) scale,
//! 2. an optional heading rotation about the local up axis,
//! 3. in geocentric maps, a surface rotation aligning local up with the
//!    ellipsoid normal at the point,
//! 4. a translation to the point,
//! 5. the tile localization (world to local).
//!
//! With nalgebra's column vectors that is
//! `localize * translate * surface * heading * scale`.

use instancer_core::{SpatialReference, Vector3};
use nalgebra::{Matrix4, Point3, Rotation3};

use crate::error::Result;

/// Replace zero scale components with 1.0.
///
/// A zero component means "unset", not "collapse onto a plane".
#[inline]
pub fn normalize_scale(scale: Vector3<f64>) -> Vector3<f64> {
    scale.map(|s| if s == 0.0 { 1.0 } else { s })
}

/// Scale matrix from a scale vector, after zero coercion.
#[inline]
pub fn scale_matrix(scale: Vector3<f64>) -> Matrix4<f64> {
    Matrix4::new_nonuniform_scaling(&normalize_scale(scale))
}

/// Rotation about local +Z by `heading_deg` degrees (counter-clockwise seen
/// from above).
#[inline]
pub fn heading_matrix(heading_deg: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), heading_deg.to_radians()).to_homogeneous()
}

/// Convert a point into ECEF and return the rotation that maps local
/// east/north/up onto the ellipsoid frame at that point.
///
/// The point is first brought into geographic coordinates on the target's
/// ellipsoid. Each point gets its own rotation.
pub fn transform_and_get_rotation(
    point: &Point3<f64>,
    source: &SpatialReference,
    target: &SpatialReference,
) -> Result<(Point3<f64>, Matrix4<f64>)> {
    let geographic = target.geographic();
    let geo = source.transform_point(point, &geographic)?;
    let ellipsoid = target.ellipsoid();

    let ecef = ellipsoid.geodetic_to_ecef(geo.x, geo.y, geo.z);
    let rotation = ellipsoid.local_to_world_rotation(geo.x, geo.y).to_homogeneous();
    Ok((ecef, rotation))
}

/// Computes placement matrices for one processing pass.
#[derive(Debug, Clone)]
pub struct PlacementCalculator {
    source: SpatialReference,
    target: SpatialReference,
    geocentric: bool,
    world_to_local: Matrix4<f64>,
}

impl PlacementCalculator {
    /// * `source` - spatial reference of the feature coordinates
    /// * `target` - map spatial reference
    /// * `geocentric` - whether the map renders in ECEF
    /// * `world_to_local` - tile localization applied last
    pub fn new(
        source: SpatialReference,
        target: SpatialReference,
        geocentric: bool,
        world_to_local: Matrix4<f64>,
    ) -> Self {
        Self {
            source,
            target,
            geocentric,
            world_to_local,
        }
    }

    pub fn is_geocentric(&self) -> bool {
        self.geocentric
    }

    /// Whether flat placement needs a bulk reprojection of each part.
    #[inline]
    pub fn needs_reprojection(&self) -> bool {
        !self.geocentric && !self.target.is_equivalent_to(&self.source)
    }

    /// Bring a geometry part into placement space.
    ///
    /// Flat maps with a differing source reference reproject all points at
    /// once. Geocentric maps convert per point in [`Self::compute`], so the
    /// points are returned as-is.
    pub fn prepare_points(&self, points: &[Point3<f64>]) -> Result<Vec<Point3<f64>>> {
        let mut out = points.to_vec();
        if self.needs_reprojection() {
            self.source.transform_points(&mut out, &self.target)?;
        }
        Ok(out)
    }

    /// Placement for a point returned by [`Self::prepare_points`], without
    /// localization.
    pub fn compute_world(
        &self,
        point: &Point3<f64>,
        scale: Vector3<f64>,
        heading_deg: Option<f64>,
    ) -> Result<Matrix4<f64>> {
        let scale = scale_matrix(scale);
        let heading = heading_deg.map(heading_matrix).unwrap_or_else(Matrix4::identity);

        if self.geocentric {
            let (ecef, surface) = transform_and_get_rotation(point, &self.source, &self.target)?;
            Ok(Matrix4::new_translation(&ecef.coords) * surface * heading * scale)
        } else {
            Ok(Matrix4::new_translation(&point.coords) * heading * scale)
        }
    }

    /// Localized placement for a point returned by [`Self::prepare_points`].
    pub fn compute(
        &self,
        point: &Point3<f64>,
        scale: Vector3<f64>,
        heading_deg: Option<f64>,
    ) -> Result<Matrix4<f64>> {
        Ok(self.world_to_local * self.compute_world(point, scale, heading_deg)?)
    }
}
