// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial references and point transformation between them.
//!
//! Conversions pivot through geographic coordinates on the reference's
//! ellipsoid:
//!
//! - geographic (longitude/latitude in degrees, height in meters)
//! - spherical web-mercator (meters)
//! - geocentric / ECEF (meters)
//!
//! Named local or projected references are opaque: they only convert to an
//! equivalent reference.

use std::fmt;

use nalgebra::Point3;

use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};

/// Latitude limit of the web-mercator projection.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Kind of coordinate system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SrsKind {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Earth-centered, earth-fixed cartesian meters.
    Geocentric,
    /// Spherical web-mercator meters.
    Mercator,
    /// Named projected or local cartesian system.
    Projected(String),
}

/// A spatial reference system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialReference {
    kind: SrsKind,
    ellipsoid: Ellipsoid,
}

impl SpatialReference {
    /// WGS84 geographic (EPSG:4326).
    pub fn wgs84() -> Self {
        Self {
            kind: SrsKind::Geographic,
            ellipsoid: Ellipsoid::wgs84(),
        }
    }

    /// WGS84 geocentric (EPSG:4978).
    pub fn geocentric() -> Self {
        Self {
            kind: SrsKind::Geocentric,
            ellipsoid: Ellipsoid::wgs84(),
        }
    }

    /// Spherical mercator (EPSG:3857).
    pub fn spherical_mercator() -> Self {
        Self {
            kind: SrsKind::Mercator,
            ellipsoid: Ellipsoid::wgs84(),
        }
    }

    /// Opaque projected or local reference identified by name.
    pub fn projected(name: &str) -> Self {
        Self {
            kind: SrsKind::Projected(name.to_string()),
            ellipsoid: Ellipsoid::wgs84(),
        }
    }

    pub fn with_ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    pub fn kind(&self) -> &SrsKind {
        &self.kind
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    #[inline]
    pub fn is_geographic(&self) -> bool {
        self.kind == SrsKind::Geographic
    }

    #[inline]
    pub fn is_geocentric(&self) -> bool {
        self.kind == SrsKind::Geocentric
    }

    /// Whether the system is a flat cartesian projection.
    #[inline]
    pub fn is_projected(&self) -> bool {
        matches!(self.kind, SrsKind::Mercator | SrsKind::Projected(_))
    }

    /// Whether points need no transformation between `self` and `other`.
    pub fn is_equivalent_to(&self, other: &SpatialReference) -> bool {
        self == other
    }

    /// Geographic reference on the same ellipsoid.
    pub fn geographic(&self) -> SpatialReference {
        Self {
            kind: SrsKind::Geographic,
            ellipsoid: self.ellipsoid,
        }
    }

    /// Transform a single point into `to`.
    pub fn transform_point(
        &self,
        point: &Point3<f64>,
        to: &SpatialReference,
    ) -> Result<Point3<f64>> {
        if self.is_equivalent_to(to) {
            return Ok(*point);
        }
        let geo = self.unproject(point, to)?;
        to.project(&geo, self)
    }

    /// Transform points in place into `to`.
    ///
    /// Points are left untouched when any of them fails to convert.
    pub fn transform_points(
        &self,
        points: &mut [Point3<f64>],
        to: &SpatialReference,
    ) -> Result<()> {
        if self.is_equivalent_to(to) {
            return Ok(());
        }
        let converted = points
            .iter()
            .map(|p| self.transform_point(p, to))
            .collect::<Result<Vec<_>>>()?;
        points.copy_from_slice(&converted);
        Ok(())
    }

    /// Convert a point in this reference to geographic degrees.
    ///
    /// `target` is only used to report the failing conversion.
    fn unproject(&self, point: &Point3<f64>, target: &SpatialReference) -> Result<Point3<f64>> {
        match &self.kind {
            SrsKind::Geographic => Ok(*point),
            SrsKind::Geocentric => {
                let (lon, lat, h) = self.ellipsoid.ecef_to_geodetic(point);
                Ok(Point3::new(lon, lat, h))
            }
            SrsKind::Mercator => {
                let r = self.ellipsoid.semi_major;
                let lon = (point.x / r).to_degrees();
                let lat = (2.0 * (point.y / r).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Ok(Point3::new(lon, lat, point.z))
            }
            SrsKind::Projected(_) => Err(Error::unsupported_transform(
                self.to_string(),
                target.to_string(),
            )),
        }
    }

    /// Convert geographic degrees into this reference.
    fn project(&self, geo: &Point3<f64>, source: &SpatialReference) -> Result<Point3<f64>> {
        match &self.kind {
            SrsKind::Geographic => Ok(*geo),
            SrsKind::Geocentric => Ok(self.ellipsoid.geodetic_to_ecef(geo.x, geo.y, geo.z)),
            SrsKind::Mercator => {
                if geo.y.abs() > MERCATOR_MAX_LATITUDE {
                    return Err(Error::OutOfDomain {
                        x: geo.x,
                        y: geo.y,
                        srs: self.to_string(),
                    });
                }
                let r = self.ellipsoid.semi_major;
                let x = r * geo.x.to_radians();
                let y = r * (std::f64::consts::FRAC_PI_4 + 0.5 * geo.y.to_radians()).tan().ln();
                Ok(Point3::new(x, y, geo.z))
            }
            SrsKind::Projected(_) => Err(Error::unsupported_transform(
                source.to_string(),
                self.to_string(),
            )),
        }
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SrsKind::Geographic => f.write_str("geographic"),
            SrsKind::Geocentric => f.write_str("geocentric"),
            SrsKind::Mercator => f.write_str("spherical-mercator"),
            SrsKind::Projected(name) => f.write_str(name),
        }
    }
}

/// An axis-aligned extent in a spatial reference.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoExtent {
    pub srs: SpatialReference,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl GeoExtent {
    pub fn new(srs: SpatialReference, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            srs,
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(0.5 * (self.xmin + self.xmax), 0.5 * (self.ymin + self.ymax), 0.0)
    }

    /// Transform the extent's corners into `to` and take their bounds.
    pub fn transform(&self, to: &SpatialReference) -> Result<GeoExtent> {
        if self.srs.is_equivalent_to(to) {
            return Ok(self.clone());
        }
        let mut corners = [
            Point3::new(self.xmin, self.ymin, 0.0),
            Point3::new(self.xmax, self.ymin, 0.0),
            Point3::new(self.xmax, self.ymax, 0.0),
            Point3::new(self.xmin, self.ymax, 0.0),
        ];
        self.srs.transform_points(&mut corners, to)?;

        let mut out = GeoExtent::new(to.clone(), f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for c in &corners {
            out.xmin = out.xmin.min(c.x);
            out.ymin = out.ymin.min(c.y);
            out.xmax = out.xmax.max(c.x);
            out.ymax = out.ymax.max(c.y);
        }
        Ok(out)
    }
}
