// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference ellipsoid math: geodetic <-> earth-centered, earth-fixed (ECEF)
//! conversion and local east-north-up frames.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// WGS84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;

/// WGS84 inverse flattening.
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// An oblate reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipsoid {
    /// Equatorial radius in meters.
    pub semi_major: f64,
    /// Polar radius in meters.
    pub semi_minor: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid {
    pub fn wgs84() -> Self {
        let flattening = 1.0 / WGS84_INVERSE_FLATTENING;
        Self {
            semi_major: WGS84_SEMI_MAJOR,
            semi_minor: WGS84_SEMI_MAJOR * (1.0 - flattening),
        }
    }

    /// Perfect sphere of the given radius.
    pub fn sphere(radius: f64) -> Self {
        Self {
            semi_major: radius,
            semi_minor: radius,
        }
    }

    /// First eccentricity squared.
    #[inline]
    pub fn eccentricity_squared(&self) -> f64 {
        let a2 = self.semi_major * self.semi_major;
        (a2 - self.semi_minor * self.semi_minor) / a2
    }

    /// Convert geodetic longitude/latitude (degrees) and height (meters) to ECEF.
    pub fn geodetic_to_ecef(&self, lon_deg: f64, lat_deg: f64, height: f64) -> Point3<f64> {
        let e2 = self.eccentricity_squared();
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        let n = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        Point3::new(
            (n + height) * cos_lat * cos_lon,
            (n + height) * cos_lat * sin_lon,
            (n * (1.0 - e2) + height) * sin_lat,
        )
    }

    /// Convert an ECEF point back to (longitude deg, latitude deg, height m).
    ///
    /// Uses Bowring's method with a few refinement steps, which converges to
    /// sub-millimeter accuracy for terrestrial heights.
    pub fn ecef_to_geodetic(&self, ecef: &Point3<f64>) -> (f64, f64, f64) {
        let a = self.semi_major;
        let b = self.semi_minor;
        let e2 = self.eccentricity_squared();
        let ep2 = (a * a - b * b) / (b * b);

        let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
        let lon = ecef.y.atan2(ecef.x);

        if p < 1e-9 {
            // On the polar axis
            let lat = if ecef.z >= 0.0 { 90.0 } else { -90.0 };
            return (lon.to_degrees(), lat, ecef.z.abs() - b);
        }

        let theta = (ecef.z * a).atan2(p * b);
        let (sin_t, cos_t) = theta.sin_cos();
        let mut lat = (ecef.z + ep2 * b * sin_t.powi(3)).atan2(p - e2 * a * cos_t.powi(3));

        let mut height = 0.0;
        for _ in 0..3 {
            let sin_lat = lat.sin();
            let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            height = p / lat.cos() - n;
            lat = ecef.z.atan2(p * (1.0 - e2 * n / (n + height)));
        }

        (lon.to_degrees(), lat.to_degrees(), height)
    }

    /// Unit surface normal ("up") at a geodetic location.
    pub fn up_vector(&self, lon_deg: f64, lat_deg: f64) -> Vector3<f64> {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Rotation whose columns are the local east, north and up axes expressed
    /// in ECEF. Maps local tangent-plane vectors to world vectors.
    pub fn local_to_world_rotation(&self, lon_deg: f64, lat_deg: f64) -> Matrix3<f64> {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

        let east = Vector3::new(-sin_lon, cos_lon, 0.0);
        let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

        Matrix3::from_columns(&[east, north, up])
    }

    /// Full local-to-world frame (rotation and translation) at a geodetic
    /// location.
    pub fn local_to_world(&self, lon_deg: f64, lat_deg: f64, height: f64) -> Matrix4<f64> {
        let origin = self.geodetic_to_ecef(lon_deg, lat_deg, height);
        let mut frame = self.local_to_world_rotation(lon_deg, lat_deg).to_homogeneous();
        frame[(0, 3)] = origin.x;
        frame[(1, 3)] = origin.y;
        frame[(2, 3)] = origin.z;
        frame
    }
}
