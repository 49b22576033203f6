// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Base → host shape converters.

use rebake_core::Base;

use super::helpers::host_geometry;
use crate::converter::{HostShape, ToHostContext, ToHostConverter};
use crate::error::{Error, Result};
use crate::registry::SpeckleType;

/// Raw geometry types handled by [`GeometryToHostConverter`].
pub const GEOMETRY_TYPES: [&str; 4] = [
    "Objects.Geometry.Point",
    "Objects.Geometry.Line",
    "Objects.Geometry.Polyline",
    "Objects.Geometry.Mesh",
];

pub const WALL_TYPE: &str = "Objects.BuiltElements.Wall";

/// Catch-all: any Base with display geometry becomes a generic direct shape.
pub struct DirectShapeToHostConverter;

impl ToHostConverter for DirectShapeToHostConverter {
    fn convert(&self, object: &Base, cx: &ToHostContext<'_>) -> Result<HostShape> {
        Ok(HostShape {
            application_id: object.identity().to_string(),
            name: object.get_str("name").unwrap_or_default().to_string(),
            category: object
                .get_str("category")
                .unwrap_or("Generic Models")
                .to_string(),
            geometry: host_geometry(object, cx)?,
        })
    }
}

/// Raw geometry objects; the display value must match the declared type.
pub struct GeometryToHostConverter;

impl ToHostConverter for GeometryToHostConverter {
    fn convert(&self, object: &Base, cx: &ToHostContext<'_>) -> Result<HostShape> {
        let expected = object.short_type();
        if let Some(g) = object
            .display_value
            .iter()
            .find(|g| g.type_name() != expected)
        {
            return Err(Error::conversion(format!(
                "{} declares {expected} but carries a {}",
                object.identity(),
                g.type_name()
            )));
        }
        let category = if expected == "Mesh" {
            "Generic Models"
        } else {
            "Lines"
        };
        Ok(HostShape {
            application_id: object.identity().to_string(),
            name: object.get_str("name").unwrap_or(expected).to_string(),
            category: category.to_string(),
            geometry: host_geometry(object, cx)?,
        })
    }
}

/// Walls are built as direct shapes in the wall category.
pub struct WallToHostConverter;

impl ToHostConverter for WallToHostConverter {
    fn convert(&self, object: &Base, cx: &ToHostContext<'_>) -> Result<HostShape> {
        let fallback = cx.converters.resolve(&SpeckleType::base(), false)?;
        let mut shape = fallback.convert(object, cx)?;
        shape.category = "Walls".to_string();
        Ok(shape)
    }
}
