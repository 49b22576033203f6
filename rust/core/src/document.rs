// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for host entities.
//!
//! The [`HostDocument`] owns all entities of one host document in a slot map
//! with stable, generational keys, plus a native-id index and an upward
//! ownership index (child → owners). The ownership index is what packing
//! queries: "is an owner of this entity also selected?".

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::entity::EntityData;
use crate::error::{Error, Result};
use crate::georef::{BasePoint, CrsOffsetRotation};
use crate::keys::{DocumentId, EntityKey, NativeId};
use crate::units::LengthUnit;

/// A host document: entities, units and georeferencing.
///
/// # Example
///
/// ```
/// use rebake_core::{EntityData, HostDocument, HostEntity};
///
/// let mut doc = HostDocument::new("Model.rvt");
/// doc.insert(EntityData::new("w1", HostEntity::Element)).unwrap();
///
/// assert_eq!(doc.len(), 1);
/// assert!(doc.contains(&"w1".into()));
/// ```
#[derive(Debug)]
pub struct HostDocument {
    id: DocumentId,
    name: String,
    units: LengthUnit,
    entities: SlotMap<EntityKey, EntityData>,
    index: FxHashMap<NativeId, EntityKey>,
    owners: FxHashMap<NativeId, FxHashSet<NativeId>>,
    base_points: Vec<BasePoint>,
    crs: CrsOffsetRotation,
}

impl HostDocument {
    /// Creates a new, empty document in meters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::next(),
            name: name.into(),
            units: LengthUnit::Meters,
            entities: SlotMap::with_key(),
            index: FxHashMap::default(),
            owners: FxHashMap::default(),
            base_points: Vec::new(),
            crs: CrsOffsetRotation::default(),
        }
    }

    pub fn with_units(mut self, units: LengthUnit) -> Self {
        self.units = units;
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> LengthUnit {
        self.units
    }

    // --- Entity operations ---

    /// Adds an entity. Native ids must be unique within a document.
    pub fn insert(&mut self, entity: EntityData) -> Result<EntityKey> {
        if self.index.contains_key(&entity.id) {
            return Err(Error::DuplicateId(entity.id));
        }
        let id = entity.id.clone();
        for owned in entity.entity.owned_ids() {
            self.owners.entry(owned.clone()).or_default().insert(id.clone());
        }
        if let Some(host) = entity.entity.host() {
            self.owners.entry(id.clone()).or_default().insert(host.clone());
        }
        let key = self.entities.insert(entity);
        self.index.insert(id, key);
        Ok(key)
    }

    /// Removes an entity and its ownership edges.
    pub fn remove(&mut self, id: &NativeId) -> Result<EntityData> {
        let key = self
            .index
            .remove(id)
            .ok_or_else(|| Error::EntityNotFound(id.clone()))?;
        let entity = self
            .entities
            .remove(key)
            .ok_or_else(|| Error::EntityNotFound(id.clone()))?;
        for owned in entity.entity.owned_ids() {
            if let Some(set) = self.owners.get_mut(owned) {
                set.remove(id);
            }
        }
        self.owners.remove(id);
        Ok(entity)
    }

    pub fn get(&self, id: &NativeId) -> Option<&EntityData> {
        self.index.get(id).and_then(|&k| self.entities.get(k))
    }

    pub fn get_mut(&mut self, id: &NativeId) -> Option<&mut EntityData> {
        let key = *self.index.get(id)?;
        self.entities.get_mut(key)
    }

    pub fn get_by_key(&self, key: EntityKey) -> Option<&EntityData> {
        self.entities.get(key)
    }

    /// Looks up several ids, returning the ids that are missing as errors.
    pub fn get_many<'a>(
        &'a self,
        ids: &'a [NativeId],
    ) -> impl Iterator<Item = Result<&'a EntityData>> + 'a {
        ids.iter()
            .map(|id| self.get(id).ok_or_else(|| Error::EntityNotFound(id.clone())))
    }

    pub fn contains(&self, id: &NativeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityData> {
        self.entities.values()
    }

    /// Entities that own `id` (groups, curtain walls, hosts, containers).
    pub fn owners_of(&self, id: &NativeId) -> impl Iterator<Item = &NativeId> {
        self.owners.get(id).into_iter().flatten()
    }

    // --- Georeferencing ---

    pub fn add_base_point(&mut self, point: BasePoint) {
        self.base_points.push(point);
    }

    /// The unshared base point.
    pub fn project_base_point(&self) -> Option<&BasePoint> {
        self.base_points.iter().find(|p| !p.shared)
    }

    /// The shared base point.
    pub fn survey_point(&self) -> Option<&BasePoint> {
        self.base_points.iter().find(|p| p.shared)
    }

    pub fn crs(&self) -> &CrsOffsetRotation {
        &self.crs
    }

    pub fn set_crs(&mut self, crs: CrsOffsetRotation) {
        self.crs = crs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CurtainGrid, HostEntity};
    use nalgebra::Point3;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut doc = HostDocument::new("doc");
        doc.insert(EntityData::new("a", HostEntity::Element)).unwrap();
        let err = doc
            .insert(EntityData::new("a", HostEntity::ModelCurve))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id.as_str() == "a"));
    }

    #[test]
    fn ownership_index_tracks_groups_and_hosts() {
        let mut doc = HostDocument::new("doc");
        doc.insert(EntityData::new(
            "g",
            HostEntity::Group {
                members: vec!["x".into()],
            },
        ))
        .unwrap();
        doc.insert(EntityData::new(
            "w",
            HostEntity::Wall {
                curtain_grid: Some(CurtainGrid {
                    mullions: vec!["m".into()],
                    panels: vec![],
                }),
                stacked_members: vec![],
            },
        ))
        .unwrap();
        doc.insert(EntityData::new("m", HostEntity::Mullion { host: "w".into() }))
            .unwrap();

        let owners: Vec<_> = doc.owners_of(&"x".into()).cloned().collect();
        assert_eq!(owners, vec![NativeId::from("g")]);
        let owners: Vec<_> = doc.owners_of(&"m".into()).cloned().collect();
        assert_eq!(owners, vec![NativeId::from("w")]);
    }

    #[test]
    fn remove_clears_index() {
        let mut doc = HostDocument::new("doc");
        doc.insert(EntityData::new(
            "g",
            HostEntity::Group {
                members: vec!["x".into()],
            },
        ))
        .unwrap();
        doc.remove(&"g".into()).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.owners_of(&"x".into()).count(), 0);
        assert!(doc.remove(&"g".into()).is_err());
    }

    #[test]
    fn base_points_split_by_shared_flag() {
        let mut doc = HostDocument::new("doc");
        doc.add_base_point(BasePoint::survey(Point3::new(1.0, 2.0, 0.0)));
        doc.add_base_point(BasePoint::project(Point3::new(5.0, 0.0, 0.0), 0.5));
        assert_eq!(doc.project_base_point().unwrap().angle, 0.5);
        assert_eq!(doc.survey_point().unwrap().position.y, 2.0);
    }
}
