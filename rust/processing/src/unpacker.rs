// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection unpacking
//!
//! Turns a coarse user selection into the ordered list of atomic entities
//! handed to converters:
//!
//! 1. **Flatten**: groups and multistory stairs are replaced by their members,
//!    family instances are preceded by their sub-components.
//! 2. **Dedup**: first occurrence of a native id wins.
//! 3. **Pack**: children already carried by a selected parent (curtain grid
//!    mullions and panels, instances hosted on a selected curtain wall,
//!    members of a selected stacked wall) are removed.
//!
//! Packing runs strictly after flattening, so a parent reached through a
//! group still absorbs a child that was selected on its own.

use rebake_core::{DocumentId, EntityData, EntityKind, HostDocument, HostEntity, NativeId};
use rustc_hash::FxHashSet;

/// Smallest unit submitted to a converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomicObject {
    pub id: NativeId,
    pub kind: EntityKind,
    /// Document the entity was read from. The atomic never owns it.
    pub document: DocumentId,
}

/// A child removed by packing, with the parent that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packing {
    pub parent: NativeId,
    pub removed: NativeId,
}

/// Result of [`ObjectUnpacker::unpack`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnpackedSelection {
    /// Atomic objects in conversion order, unique by id.
    pub atomics: Vec<AtomicObject>,
    pub packed: Vec<Packing>,
    /// Selected or referenced ids that do not exist in the document.
    pub skipped: Vec<NativeId>,
}

impl UnpackedSelection {
    pub fn ids(&self) -> Vec<NativeId> {
        self.atomics.iter().map(|a| a.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.atomics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atomics.is_empty()
    }
}

/// Flattens and packs host selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectUnpacker;

impl ObjectUnpacker {
    pub fn new() -> Self {
        Self
    }

    /// Unpacks `selection` into atomic objects.
    pub fn unpack(&self, document: &HostDocument, selection: &[NativeId]) -> UnpackedSelection {
        let _span = tracing::debug_span!("unpack", selected = selection.len()).entered();

        let mut flat = Vec::new();
        let mut skipped = Vec::new();
        let mut path = Vec::new();
        for id in selection {
            flatten(document, id, &mut path, &mut flat, &mut skipped);
        }

        let mut seen = FxHashSet::default();
        flat.retain(|e| seen.insert(e.id.clone()));

        let packed = pack(document, &mut flat);
        skipped.sort();
        skipped.dedup();

        let atomics = flat
            .into_iter()
            .map(|e| AtomicObject {
                id: e.id.clone(),
                kind: e.kind(),
                document: document.id(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            atomics = atomics.len(),
            packed = packed.len(),
            skipped = skipped.len(),
            "unpacked selection"
        );
        UnpackedSelection {
            atomics,
            packed,
            skipped,
        }
    }

    /// Ids of the atomic objects `object_ids` unpack to.
    pub fn get_unpacked_ids(&self, document: &HostDocument, object_ids: &[NativeId]) -> Vec<NativeId> {
        self.unpack(document, object_ids).ids()
    }

    /// Atomic ids plus the sub-elements converted as part of them: curtain
    /// grid mullions and panels of walls and footprint roofs, and the members
    /// of stacked walls. A change to any of these affects the sent result.
    pub fn element_and_subelement_ids(
        &self,
        document: &HostDocument,
        atomics: &[AtomicObject],
    ) -> Vec<NativeId> {
        let mut seen = FxHashSet::default();
        let mut ids = Vec::with_capacity(atomics.len());
        for atomic in atomics {
            if seen.insert(atomic.id.clone()) {
                ids.push(atomic.id.clone());
            }
            let Some(entity) = document.get(&atomic.id) else {
                continue;
            };
            let children: Vec<&NativeId> = match &entity.entity {
                HostEntity::Wall {
                    curtain_grid,
                    stacked_members,
                } => curtain_grid
                    .iter()
                    .flat_map(|g| g.member_ids())
                    .chain(stacked_members.iter())
                    .collect(),
                HostEntity::FootPrintRoof { curtain_grids } => {
                    curtain_grids.iter().flat_map(|g| g.member_ids()).collect()
                }
                _ => Vec::new(),
            };
            for child in children {
                if seen.insert(child.clone()) {
                    ids.push(child.clone());
                }
            }
        }
        ids
    }
}

fn flatten<'d>(
    document: &'d HostDocument,
    id: &NativeId,
    path: &mut Vec<NativeId>,
    out: &mut Vec<&'d EntityData>,
    skipped: &mut Vec<NativeId>,
) {
    let Some(entity) = document.get(id) else {
        tracing::warn!(id = %id, "selected entity not found in document, skipping");
        skipped.push(id.clone());
        return;
    };
    if path.contains(id) {
        tracing::warn!(id = %id, "membership cycle, not expanding again");
        return;
    }

    path.push(id.clone());
    match &entity.entity {
        HostEntity::Group { members } => {
            for member in members {
                flatten(document, member, path, out, skipped);
            }
        }
        HostEntity::MultistoryStairs { stairs } => {
            for stair in stairs {
                flatten(document, stair, path, out, skipped);
            }
        }
        HostEntity::FamilyInstance { sub_components, .. } => {
            for sub in sub_components {
                flatten(document, sub, path, out, skipped);
            }
            out.push(entity);
        }
        _ => out.push(entity),
    }
    path.pop();
}

/// Removes children carried by a present parent. Returns what was removed.
fn pack(document: &HostDocument, flat: &mut Vec<&EntityData>) -> Vec<Packing> {
    let present: FxHashSet<&NativeId> = flat.iter().map(|e| &e.id).collect();
    let mut packed = Vec::new();

    for entity in flat.iter() {
        if let Some(parent) = packing_parent(document, entity, &present) {
            packed.push(Packing {
                parent,
                removed: entity.id.clone(),
            });
        }
    }

    if !packed.is_empty() {
        let removed: FxHashSet<&NativeId> = packed.iter().map(|p| &p.removed).collect();
        flat.retain(|e| !removed.contains(&e.id));
    }
    packed
}

fn packing_parent(
    document: &HostDocument,
    entity: &EntityData,
    present: &FxHashSet<&NativeId>,
) -> Option<NativeId> {
    match &entity.entity {
        HostEntity::Mullion { host } | HostEntity::Panel { host } => {
            present.contains(host).then(|| host.clone())
        }
        HostEntity::FamilyInstance {
            host: Some(host), ..
        } => {
            let on_curtain_wall = document
                .get(host)
                .is_some_and(|h| h.entity.is_curtain_wall());
            (on_curtain_wall && present.contains(host)).then(|| host.clone())
        }
        HostEntity::Wall { .. } => document
            .owners_of(&entity.id)
            .find(|owner| {
                present.contains(owner)
                    && document.get(owner).is_some_and(|o| match &o.entity {
                        HostEntity::Wall {
                            stacked_members, ..
                        } => stacked_members.contains(&entity.id),
                        _ => false,
                    })
            })
            .cloned(),
        _ => None,
    }
}
