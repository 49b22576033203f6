// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host entity → Base converters.

use rebake_core::{Base, DictValue, EntityData, EntityKind, Geometry, HostEntity, NativeId};

use super::helpers::{copy_entity_metadata, display_geometry};
use crate::converter::{ToSpeckleContext, ToSpeckleConverter};
use crate::error::{Error, Result};

/// Generic element: metadata plus display geometry.
pub struct ElementToSpeckleConverter;

impl ToSpeckleConverter for ElementToSpeckleConverter {
    fn convert(&self, entity: &EntityData, cx: &ToSpeckleContext<'_>) -> Result<Base> {
        let mut base = Base::new("Objects.Data.DataObject");
        copy_entity_metadata(entity, &mut base);
        base.display_value = display_geometry(entity, cx)?;
        Ok(base)
    }
}

/// Family instances, and by fallback mullions and panels.
pub struct FamilyInstanceToSpeckleConverter;

impl ToSpeckleConverter for FamilyInstanceToSpeckleConverter {
    fn convert(&self, entity: &EntityData, cx: &ToSpeckleContext<'_>) -> Result<Base> {
        let mut base = Base::new("Objects.BuiltElements.Revit.FamilyInstance");
        copy_entity_metadata(entity, &mut base);
        base.properties
            .insert("kind".into(), entity.kind().as_str().into());
        if let Some(host) = entity.entity.host() {
            base.properties
                .insert("host".into(), host.to_string().into());
        }
        base.display_value = display_geometry(entity, cx)?;
        Ok(base)
    }
}

/// Model curves become raw geometry objects; one curve per entity.
pub struct ModelCurveToSpeckleConverter;

impl ToSpeckleConverter for ModelCurveToSpeckleConverter {
    fn convert(&self, entity: &EntityData, cx: &ToSpeckleContext<'_>) -> Result<Base> {
        let mut geometry = display_geometry(entity, cx)?;
        let curve = match geometry.len() {
            1 => geometry.remove(0),
            0 => return Err(Error::MissingGeometry(entity.id.to_string())),
            n => {
                return Err(Error::conversion(format!(
                    "model curve {} has {n} curves, expected one",
                    entity.id
                )))
            }
        };
        if !matches!(curve, Geometry::Line { .. } | Geometry::Polyline { .. }) {
            return Err(Error::conversion(format!(
                "model curve {} carries a {}",
                entity.id,
                curve.type_name()
            )));
        }
        let mut base = Base::new(format!("Objects.Geometry.{}", curve.type_name()));
        copy_entity_metadata(entity, &mut base);
        base.display_value.push(curve);
        Ok(base)
    }
}

/// Walls. Curtain walls carry their mullions and panels as nested elements,
/// converted through whatever converter the registry resolves for them.
pub struct WallToSpeckleConverter;

impl WallToSpeckleConverter {
    fn convert_child(&self, id: &NativeId, cx: &ToSpeckleContext<'_>) -> Option<Base> {
        let Some(child) = cx.document.get(id) else {
            tracing::warn!(id = %id, "curtain grid member not found in document");
            return None;
        };
        let converted = cx
            .converters
            .resolve(&child.kind(), true)
            .map_err(Error::from)
            .and_then(|c| c.convert(child, cx));
        match converted {
            Ok(mut base) => {
                base.application_id = Some(child.id.to_string());
                Some(base)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to convert curtain grid member");
                None
            }
        }
    }
}

impl ToSpeckleConverter for WallToSpeckleConverter {
    fn convert(&self, entity: &EntityData, cx: &ToSpeckleContext<'_>) -> Result<Base> {
        let HostEntity::Wall {
            curtain_grid,
            stacked_members,
        } = &entity.entity
        else {
            return Err(Error::validation(format!("{} is not a wall", entity.id)));
        };

        let element = cx.converters.resolve(&EntityKind::Element, false)?;
        let mut base = element.convert(entity, cx)?;
        base.speckle_type = "Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall".into();

        if let Some(grid) = curtain_grid {
            base.properties
                .insert("isCurtainWall".into(), DictValue::Bool(true));
            base.elements
                .extend(grid.member_ids().filter_map(|id| self.convert_child(id, cx)));
        }
        if !stacked_members.is_empty() {
            base.properties.insert(
                "stackedMembers".into(),
                DictValue::List(
                    stacked_members
                        .iter()
                        .map(|id| DictValue::String(id.to_string()))
                        .collect(),
                ),
            );
        }
        Ok(base)
    }
}
