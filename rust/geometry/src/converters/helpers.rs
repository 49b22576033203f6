// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry handling shared by several converters.

use nalgebra::Point3;
use rebake_core::{Base, EntityData, Geometry, LengthUnit};

use crate::converter::{ToHostContext, ToSpeckleContext};
use crate::error::{Error, Result};
use crate::settings::DetailLevel;
use crate::transform::to_reference_frame;

/// Closed box mesh (8 vertices, 12 triangles) spanning `min`..`max`.
pub fn bounding_box_mesh(min: Point3<f64>, max: Point3<f64>) -> Geometry {
    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    Geometry::Mesh { vertices, faces }
}

/// Display geometry of an entity in the send reference frame.
///
/// At [`DetailLevel::Low`] meshes are replaced by their bounding box.
pub(super) fn display_geometry(
    entity: &EntityData,
    cx: &ToSpeckleContext<'_>,
) -> Result<Vec<Geometry>> {
    let reference = cx.settings.reference_point_transform.as_ref();
    entity
        .geometry
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| {
            let g = to_reference_frame(g, reference)?;
            Ok(match (&g, cx.settings.detail_level) {
                (Geometry::Mesh { .. }, DetailLevel::Low) => {
                    let (min, max) = g.bounds();
                    bounding_box_mesh(min, max)
                }
                _ => g,
            })
        })
        .collect()
}

/// Display geometry of a Base scaled into host units.
pub(super) fn host_geometry(object: &Base, cx: &ToHostContext<'_>) -> Result<Vec<Geometry>> {
    let geometry: Vec<Geometry> = object
        .display_value
        .iter()
        .filter(|g| !g.is_empty())
        .cloned()
        .collect();
    if geometry.is_empty() {
        return Err(Error::MissingGeometry(object.identity().to_string()));
    }
    let factor = object
        .units
        .unwrap_or(LengthUnit::Meters)
        .scale_to(cx.settings.host_units);
    Ok(geometry
        .into_iter()
        .map(|mut g| {
            g.scale(factor);
            g
        })
        .collect())
}

/// Copies name, category and properties of an entity onto a Base.
pub(super) fn copy_entity_metadata(entity: &EntityData, base: &mut Base) {
    if !entity.name.is_empty() {
        base.properties.insert("name".into(), entity.name.clone().into());
    }
    if !entity.category.is_empty() {
        base.properties
            .insert("category".into(), entity.category.clone().into());
    }
    for (k, v) in &entity.properties {
        base.properties.entry(k.clone()).or_insert_with(|| v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_mesh_spans_bounds() {
        let mesh = bounding_box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
        let (min, max) = mesh.bounds();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 2.0, 3.0));
        match mesh {
            Geometry::Mesh { vertices, faces } => {
                assert_eq!(vertices.len(), 8);
                assert_eq!(faces.len(), 12);
            }
            _ => unreachable!(),
        }
    }
}
