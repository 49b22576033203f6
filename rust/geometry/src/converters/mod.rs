// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Default converters
//!
//! Each sub-module handles one direction:
//!
//! - `to_speckle`: host entities → Base (elements, walls, family instances, curves)
//! - `to_host`: Base → host shapes (direct shapes, raw geometry, walls)
//! - `helpers`: geometry handling shared by several converters
//!
//! Registration is explicit: call [`register_to_speckle_defaults`] and
//! [`register_to_host_defaults`] once at start-up.

mod helpers;
mod to_host;
mod to_speckle;

use std::sync::Arc;

use rebake_core::EntityKind;

use crate::converter::{ToHostRegistry, ToSpeckleRegistry};
use crate::error::RegistrationError;
use crate::registry::SpeckleType;

pub use helpers::bounding_box_mesh;
pub use to_host::{
    DirectShapeToHostConverter, GeometryToHostConverter, WallToHostConverter, GEOMETRY_TYPES,
    WALL_TYPE,
};
pub use to_speckle::{
    ElementToSpeckleConverter, FamilyInstanceToSpeckleConverter, ModelCurveToSpeckleConverter,
    WallToSpeckleConverter,
};

/// Registers the built-in host → Base converters.
pub fn register_to_speckle_defaults(
    registry: &mut ToSpeckleRegistry,
) -> Result<(), RegistrationError> {
    registry.register(
        EntityKind::Element,
        0,
        &[],
        Arc::new(ElementToSpeckleConverter),
    )?;
    registry.register(
        EntityKind::FamilyInstance,
        0,
        &[],
        Arc::new(FamilyInstanceToSpeckleConverter),
    )?;
    registry.register(
        EntityKind::ModelCurve,
        0,
        &[],
        Arc::new(ModelCurveToSpeckleConverter),
    )?;
    registry.register(
        EntityKind::Wall,
        0,
        &[EntityKind::Element, EntityKind::Mullion, EntityKind::Panel],
        Arc::new(WallToSpeckleConverter),
    )?;
    Ok(())
}

/// Registers the built-in Base → host converters.
pub fn register_to_host_defaults(registry: &mut ToHostRegistry) -> Result<(), RegistrationError> {
    registry.register(
        SpeckleType::base(),
        0,
        &[],
        Arc::new(DirectShapeToHostConverter),
    )?;
    for ty in GEOMETRY_TYPES {
        registry.register(
            SpeckleType::new(ty),
            0,
            &[],
            Arc::new(GeometryToHostConverter),
        )?;
    }
    registry.register(
        SpeckleType::new(WALL_TYPE),
        0,
        &[SpeckleType::base()],
        Arc::new(WallToHostConverter),
    )?;
    Ok(())
}
