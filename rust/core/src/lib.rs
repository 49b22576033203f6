// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Rebake Core
//!
//! Host document model and vendor-neutral object model shared by the
//! conversion engine.
//!
//! ## Overview
//!
//! - **Host documents**: arena storage ([slotmap](https://docs.rs/slotmap))
//!   of host entities, indexed by native id, with an upward ownership index
//! - **Host entities**: a closed set of entity families ([`HostEntity`]) with
//!   a type tag ([`EntityKind`]) used for converter dispatch
//! - **Base objects**: the vendor-neutral result of a conversion ([`Base`])
//! - **Units and georeferencing**: length unit factors, base points and CRS
//!   offsets
//!
//! ## Quick Start
//!
//! ```rust
//! use rebake_core::{EntityData, HostDocument, HostEntity, LengthUnit};
//!
//! let mut doc = HostDocument::new("Tower.rvt").with_units(LengthUnit::Feet);
//! doc.insert(EntityData::new("group-1", HostEntity::Group { members: vec!["wall-1".into()] }))
//!     .unwrap();
//! doc.insert(EntityData::new("wall-1", HostEntity::Element)).unwrap();
//!
//! let owners: Vec<_> = doc.owners_of(&"wall-1".into()).collect();
//! assert_eq!(owners.len(), 1);
//! ```

pub mod base;
pub mod document;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod georef;
pub mod keys;
pub mod units;

pub use base::{Base, DictValue, Dictionary, BASE_TYPE};
pub use document::HostDocument;
pub use entity::{CurtainGrid, EntityData, EntityKind, HostEntity};
pub use error::{Error, Result};
pub use geometry::Geometry;
pub use georef::{BasePoint, CrsOffsetRotation};
pub use keys::{DocumentId, EntityKey, NativeId};
pub use units::LengthUnit;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};
