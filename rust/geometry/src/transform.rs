// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared transform utilities
//!
//! Reference-point transforms for send and placement matrices carried on
//! Base objects for receive.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use rebake_core::{Base, DictValue, Geometry};

use crate::error::{Error, Result};

/// Property under which a Base carries its local placement (16 doubles,
/// row-major).
pub const TRANSFORM_KEY: &str = "transform";

/// Translation to `position`.
#[inline]
pub fn translation(position: &Point3<f64>) -> Matrix4<f64> {
    Matrix4::new_translation(&position.coords)
}

/// Translation to `position` followed by a rotation about Z by `angle`
/// (radians), as used for the survey point.
pub fn translation_rotation_z(position: &Point3<f64>, angle: f64) -> Matrix4<f64> {
    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous();
    translation(position) * rotation
}

/// Maps document coordinates into the frame of a reference point.
///
/// `reference` maps the reference frame into document coordinates, so the
/// inverse is applied. A singular matrix is reported as a conversion error.
pub fn to_reference_frame(geometry: &Geometry, reference: Option<&Matrix4<f64>>) -> Result<Geometry> {
    match reference {
        None => Ok(geometry.clone()),
        Some(m) => {
            let inverse = m
                .try_inverse()
                .ok_or_else(|| Error::conversion("reference point transform is not invertible"))?;
            Ok(geometry.transformed(&inverse))
        }
    }
}

/// Reads the placement matrix stored on a Base, if any.
pub fn base_transform(base: &Base) -> Result<Option<Matrix4<f64>>> {
    let Some(value) = base.get(TRANSFORM_KEY) else {
        return Ok(None);
    };
    let values = value
        .as_list()
        .ok_or_else(|| Error::validation("transform must be a list of 16 numbers"))?;
    if values.len() != 16 {
        return Err(Error::validation(format!(
            "transform must have 16 values, found {}",
            values.len()
        )));
    }
    let mut numbers = [0.0; 16];
    for (slot, v) in numbers.iter_mut().zip(values) {
        *slot = v
            .as_f64()
            .ok_or_else(|| Error::validation("transform values must be numeric"))?;
    }
    Ok(Some(Matrix4::from_row_slice(&numbers)))
}

/// Stores a placement matrix on a Base (row-major).
pub fn set_base_transform(base: &mut Base, matrix: &Matrix4<f64>) {
    let values = matrix
        .transpose()
        .iter()
        .map(|v| DictValue::Double(*v))
        .collect();
    base.properties
        .insert(TRANSFORM_KEY.to_string(), DictValue::List(values));
}
