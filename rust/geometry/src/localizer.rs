// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tile localization.
//!
//! Instances are placed relative to a tile-local origin to keep f32 vertex
//! precision. The output root carries `local_to_world` to undo it.

use instancer_core::{GeoExtent, SpatialReference};
use nalgebra::Matrix4;

use crate::error::{Error, Result};

/// Paired world/local matrices for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Localizer {
    pub world_to_local: Matrix4<f64>,
    pub local_to_world: Matrix4<f64>,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::identity()
    }
}

impl Localizer {
    pub fn identity() -> Self {
        Self {
            world_to_local: Matrix4::identity(),
            local_to_world: Matrix4::identity(),
        }
    }

    /// Compute the localizer for a tile extent.
    ///
    /// Geocentric maps use the east/north/up frame at the extent's
    /// geographic centroid, unless the extent spans 180 degrees of longitude
    /// or more. Flat maps translate the centroid (in the map reference) to
    /// the origin. Without an extent both matrices are identity.
    pub fn compute(
        extent: Option<&GeoExtent>,
        map_srs: &SpatialReference,
        geocentric: bool,
    ) -> Result<Self> {
        let Some(extent) = extent else {
            return Ok(Self::identity());
        };

        if geocentric {
            let geographic = map_srs.geographic();
            let geo_extent = extent.transform(&geographic)?;
            if geo_extent.width() >= 180.0 {
                return Ok(Self::identity());
            }
            let centroid = geo_extent.centroid();
            let local_to_world = geographic
                .ellipsoid()
                .local_to_world(centroid.x, centroid.y, 0.0);
            let world_to_local = local_to_world
                .try_inverse()
                .ok_or_else(|| Error::DegenerateTransform("geocentric tile frame".into()))?;
            Ok(Self {
                world_to_local,
                local_to_world,
            })
        } else {
            let centroid = extent.srs.transform_point(&extent.centroid(), map_srs)?;
            Ok(Self {
                world_to_local: Matrix4::new_translation(&-centroid.coords),
                local_to_world: Matrix4::new_translation(&centroid.coords),
            })
        }
    }
}
