// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host entity families handled by the engine.
//!
//! Host applications expose deep, open class hierarchies. The engine only
//! needs to tell apart the families that change how a selection is unpacked
//! or which converter applies, so entities are a closed sum type with an
//! [`HostEntity::Unknown`] catch-all.

use serde::{Deserialize, Serialize};

use crate::base::Dictionary;
use crate::geometry::Geometry;
use crate::keys::NativeId;

/// Type tag of a host entity, used for converter dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Element,
    Group,
    FamilyInstance,
    MultistoryStairs,
    Wall,
    FootPrintRoof,
    Mullion,
    Panel,
    ModelCurve,
    DirectShape,
    Unknown,
}

impl EntityKind {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Element => "Element",
            EntityKind::Group => "Group",
            EntityKind::FamilyInstance => "FamilyInstance",
            EntityKind::MultistoryStairs => "MultistoryStairs",
            EntityKind::Wall => "Wall",
            EntityKind::FootPrintRoof => "FootPrintRoof",
            EntityKind::Mullion => "Mullion",
            EntityKind::Panel => "Panel",
            EntityKind::ModelCurve => "ModelCurve",
            EntityKind::DirectShape => "DirectShape",
            EntityKind::Unknown => "Unknown",
        }
    }

    /// The next more general kind, mirroring the host's class hierarchy.
    ///
    /// `Element` is the root; `Unknown` has no parent so nothing can be
    /// resolved for it by fallback.
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Mullion | EntityKind::Panel => Some(EntityKind::FamilyInstance),
            EntityKind::FamilyInstance
            | EntityKind::Group
            | EntityKind::MultistoryStairs
            | EntityKind::Wall
            | EntityKind::FootPrintRoof
            | EntityKind::ModelCurve
            | EntityKind::DirectShape => Some(EntityKind::Element),
            EntityKind::Element | EntityKind::Unknown => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mullions and panels of a curtain system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurtainGrid {
    pub mullions: Vec<NativeId>,
    pub panels: Vec<NativeId>,
}

impl CurtainGrid {
    /// All sub-element ids of the grid, mullions first.
    pub fn member_ids(&self) -> impl Iterator<Item = &NativeId> {
        self.mullions.iter().chain(self.panels.iter())
    }
}

/// Family-specific data of a host entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEntity {
    /// Plain element without sub-structure.
    Element,
    /// Group of members; the group itself is never converted.
    Group { members: Vec<NativeId> },
    /// Family instance, possibly with nested sub-component instances and a host.
    FamilyInstance {
        sub_components: Vec<NativeId>,
        host: Option<NativeId>,
    },
    /// Container of stair runs; the container itself is never converted.
    MultistoryStairs { stairs: Vec<NativeId> },
    /// Basic, curtain or stacked wall.
    Wall {
        curtain_grid: Option<CurtainGrid>,
        stacked_members: Vec<NativeId>,
    },
    /// Roof sketched by footprint, optionally with curtain grids.
    FootPrintRoof { curtain_grids: Vec<CurtainGrid> },
    Mullion { host: NativeId },
    Panel { host: NativeId },
    ModelCurve,
    DirectShape,
    /// Anything the engine has no family for.
    Unknown { type_name: String },
}

impl HostEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            HostEntity::Element => EntityKind::Element,
            HostEntity::Group { .. } => EntityKind::Group,
            HostEntity::FamilyInstance { .. } => EntityKind::FamilyInstance,
            HostEntity::MultistoryStairs { .. } => EntityKind::MultistoryStairs,
            HostEntity::Wall { .. } => EntityKind::Wall,
            HostEntity::FootPrintRoof { .. } => EntityKind::FootPrintRoof,
            HostEntity::Mullion { .. } => EntityKind::Mullion,
            HostEntity::Panel { .. } => EntityKind::Panel,
            HostEntity::ModelCurve => EntityKind::ModelCurve,
            HostEntity::DirectShape => EntityKind::DirectShape,
            HostEntity::Unknown { .. } => EntityKind::Unknown,
        }
    }

    /// The owning entity for hosted entities (mullions, panels, hosted instances).
    pub fn host(&self) -> Option<&NativeId> {
        match self {
            HostEntity::Mullion { host } | HostEntity::Panel { host } => Some(host),
            HostEntity::FamilyInstance { host, .. } => host.as_ref(),
            _ => None,
        }
    }

    /// True for walls carrying a curtain grid.
    pub fn is_curtain_wall(&self) -> bool {
        matches!(
            self,
            HostEntity::Wall {
                curtain_grid: Some(_),
                ..
            }
        )
    }

    /// Ids owned by this entity in the host's ownership graph.
    pub fn owned_ids(&self) -> Vec<&NativeId> {
        match self {
            HostEntity::Group { members } => members.iter().collect(),
            HostEntity::FamilyInstance { sub_components, .. } => sub_components.iter().collect(),
            HostEntity::MultistoryStairs { stairs } => stairs.iter().collect(),
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
        }
    }
}

/// An entity stored in a host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub id: NativeId,
    pub name: String,
    pub category: String,
    pub entity: HostEntity,
    /// Geometry in document units and document coordinates.
    pub geometry: Vec<Geometry>,
    pub properties: Dictionary,
}

impl EntityData {
    pub fn new(id: impl Into<NativeId>, entity: HostEntity) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            entity,
            geometry: Vec::new(),
            properties: Dictionary::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry.push(geometry);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_hierarchy_ends_at_element() {
        let mut kind = EntityKind::Mullion;
        let mut chain = vec![kind];
        while let Some(parent) = kind.parent() {
            chain.push(parent);
            kind = parent;
        }
        assert_eq!(
            chain,
            vec![
                EntityKind::Mullion,
                EntityKind::FamilyInstance,
                EntityKind::Element
            ]
        );
        assert_eq!(EntityKind::Unknown.parent(), None);
    }

    #[test]
    fn curtain_wall_owns_grid_members() {
        let wall = HostEntity::Wall {
            curtain_grid: Some(CurtainGrid {
                mullions: vec!["m1".into()],
                panels: vec!["p1".into(), "p2".into()],
            }),
            stacked_members: vec![],
        };
        assert!(wall.is_curtain_wall());
        let owned: Vec<&str> = wall.owned_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(owned, vec!["m1", "p1", "p2"]);
    }

    #[test]
    fn hosted_entities_report_host() {
        let panel = HostEntity::Panel { host: "w1".into() };
        assert_eq!(panel.host().map(NativeId::as_str), Some("w1"));
        assert_eq!(HostEntity::Element.host(), None);
    }
}
