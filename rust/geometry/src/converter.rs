// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter capabilities and root converters.
//!
//! A converter handles one family of objects. Converters may resolve other
//! converters through the registry carried in their context (composition);
//! the dependencies they resolve are declared at registration time.

use rebake_core::{Base, EntityData, EntityKind, Geometry, HostDocument, NativeId};

use crate::error::{Error, Result};
use crate::registry::{ConverterRegistry, SpeckleType};
use crate::settings::{ToHostSettings, ToSpeckleSettings};

/// Registry of host → Base converters.
pub type ToSpeckleRegistry = ConverterRegistry<EntityKind, dyn ToSpeckleConverter>;

/// Registry of Base → host converters.
pub type ToHostRegistry = ConverterRegistry<SpeckleType, dyn ToHostConverter>;

/// Everything a host → Base converter can read.
pub struct ToSpeckleContext<'a> {
    pub document: &'a HostDocument,
    pub settings: &'a ToSpeckleSettings,
    pub converters: &'a ToSpeckleRegistry,
}

/// Host entity → Base.
pub trait ToSpeckleConverter {
    fn convert(&self, entity: &EntityData, cx: &ToSpeckleContext<'_>) -> Result<Base>;
}

/// Everything a Base → host converter can read.
pub struct ToHostContext<'a> {
    pub settings: &'a ToHostSettings,
    pub converters: &'a ToHostRegistry,
}

/// A shape ready to be inserted into a host document.
#[derive(Debug, Clone, PartialEq)]
pub struct HostShape {
    /// Identity of the Base the shape was built from.
    pub application_id: String,
    pub name: String,
    pub category: String,
    /// Geometry in host units and host coordinates.
    pub geometry: Vec<Geometry>,
}

impl HostShape {
    /// Only solid (mesh) geometry can have materials painted on its faces.
    pub fn is_solid(&self) -> bool {
        self.geometry
            .iter()
            .any(|g| matches!(g, Geometry::Mesh { .. }))
    }
}

/// Base → host shape.
pub trait ToHostConverter {
    fn convert(&self, object: &Base, cx: &ToHostContext<'_>) -> Result<HostShape>;
}

/// Entry point for host → Base conversion of one atomic entity.
///
/// Rejects entities that cannot be converted on their own, resolves the
/// converter by the entity's kind and stamps the native id as
/// `application_id`.
pub struct RootToSpeckleConverter<'a> {
    registry: &'a ToSpeckleRegistry,
    allow_fallback: bool,
}

impl<'a> RootToSpeckleConverter<'a> {
    pub fn new(registry: &'a ToSpeckleRegistry, allow_fallback: bool) -> Self {
        Self {
            registry,
            allow_fallback,
        }
    }

    pub fn convert(
        &self,
        id: &NativeId,
        document: &HostDocument,
        settings: &ToSpeckleSettings,
    ) -> Result<Base> {
        let entity = document
            .get(id)
            .ok_or_else(|| rebake_core::Error::EntityNotFound(id.clone()))?;

        match entity.kind() {
            EntityKind::Unknown => {
                return Err(Error::validation(format!(
                    "conversion of {} is not supported",
                    entity.id
                )))
            }
            kind @ (EntityKind::Group | EntityKind::MultistoryStairs) => {
                return Err(Error::validation(format!(
                    "{kind} {} must be unpacked before conversion",
                    entity.id
                )))
            }
            _ => {}
        }

        let converter = self.registry.resolve(&entity.kind(), self.allow_fallback)?;
        let cx = ToSpeckleContext {
            document,
            settings,
            converters: self.registry,
        };
        let mut base = converter.convert(entity, &cx)?;
        base.application_id = Some(entity.id.to_string());
        base.units = Some(document.units());
        base.finalize()?;
        Ok(base)
    }
}

/// Entry point for Base → host conversion of one atomic object.
pub struct RootToHostConverter<'a> {
    registry: &'a ToHostRegistry,
    settings: &'a ToHostSettings,
}

impl<'a> RootToHostConverter<'a> {
    pub fn new(registry: &'a ToHostRegistry, settings: &'a ToHostSettings) -> Self {
        Self { registry, settings }
    }

    pub fn convert(&self, object: &Base) -> Result<HostShape> {
        let tag = SpeckleType::new(object.speckle_type.as_str());
        let converter = self.registry.resolve(&tag, true)?;
        let cx = ToHostContext {
            settings: self.settings,
            converters: self.registry,
        };
        converter.convert(object, &cx)
    }
}
