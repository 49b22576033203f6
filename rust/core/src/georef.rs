// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Georeferencing of host documents
//!
//! Base points (project base point, survey point) and the active CRS
//! offset/rotation of GIS documents. Both feed the reference-point setting
//! on send and are part of the conversion fingerprint.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A document base point.
///
/// The project base point is the unshared one; the survey point is shared.
/// The angle to true north is registered on the project base point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePoint {
    pub position: Point3<f64>,
    pub shared: bool,
    /// Angle to true north in radians.
    pub angle: f64,
}

impl BasePoint {
    pub fn project(position: Point3<f64>, angle: f64) -> Self {
        Self {
            position,
            shared: false,
            angle,
        }
    }

    pub fn survey(position: Point3<f64>) -> Self {
        Self {
            position,
            shared: true,
            angle: 0.0,
        }
    }
}

/// Active CRS offset and rotation of a GIS document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsOffsetRotation {
    /// Spatial reference name (e.g. "WGS_1984_Web_Mercator")
    pub spatial_reference: String,
    /// Latitude (Y) offset
    pub lat_offset: f64,
    /// Longitude (X) offset
    pub lon_offset: f64,
    /// True north rotation in radians
    pub true_north_radians: f64,
}

impl Default for CrsOffsetRotation {
    fn default() -> Self {
        Self {
            spatial_reference: String::new(),
            lat_offset: 0.0,
            lon_offset: 0.0,
            true_north_radians: 0.0,
        }
    }
}

impl CrsOffsetRotation {
    pub fn new(spatial_reference: impl Into<String>) -> Self {
        Self {
            spatial_reference: spatial_reference.into(),
            ..Self::default()
        }
    }

    /// Check if an offset or rotation is present
    #[inline]
    pub fn has_offset(&self) -> bool {
        self.lat_offset != 0.0 || self.lon_offset != 0.0 || self.true_north_radians != 0.0
    }

    /// Transform local coordinates to offset map coordinates
    #[inline]
    pub fn local_to_map(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let (sin_r, cos_r) = self.true_north_radians.sin_cos();
        let e = cos_r * x - sin_r * y + self.lon_offset;
        let n = sin_r * x + cos_r * y + self.lat_offset;
        (e, n, z)
    }
}
