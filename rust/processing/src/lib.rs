// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Rebake Processing
//!
//! Send and receive pipelines of the conversion engine.
//!
//! ## Send
//!
//! selection → [`ObjectUnpacker`] → [`ConversionCache`] lookup →
//! registry-resolved converter → Base result, one [`ConversionResult`] per
//! atomic object. [`ToSpeckleSettingsManager`] evicts cached objects when a
//! conversion-affecting card setting changes.
//!
//! ## Receive
//!
//! root Base → [`RootObjectUnpacker`] (atomic objects with composed
//! placements) → [`HostObjectBuilder`] running pre-clean, main and
//! post-process transactions against a [`ReceiveHost`].
//!
//! ## Example
//!
//! ```rust
//! use rebake_core::{EntityData, HostDocument, HostEntity, NativeId};
//! use rebake_processing::ObjectUnpacker;
//!
//! let mut doc = HostDocument::new("Tower.rvt");
//! doc.insert(EntityData::new("g", HostEntity::Group { members: vec!["a".into(), "b".into()] }))
//!     .unwrap();
//! doc.insert(EntityData::new("a", HostEntity::Element)).unwrap();
//! doc.insert(EntityData::new("b", HostEntity::Element)).unwrap();
//!
//! let ids = ObjectUnpacker::new().get_unpacked_ids(&doc, &["g".into()]);
//! assert_eq!(ids, vec![NativeId::from("a"), NativeId::from("b")]);
//! ```

pub mod bakers;
pub mod cache;
pub mod config;
pub mod datasets;
pub mod error;
pub mod host;
pub mod host_thread;
pub mod logging;
pub mod materializer;
pub mod progress;
pub mod receive;
pub mod results;
pub mod send;
pub mod settings;
pub mod transaction;
pub mod unpacker;

pub use bakers::{base_group_name, GroupBaker, MaterialBaker};
pub use cache::{ConversionCache, Fingerprint, SendConversionCache};
pub use config::EngineConfig;
pub use datasets::{
    DatasetStore, Feature, MemoryDatasetStore, NonNativeFeatureWriter, ObjectConversionTracker,
};
pub use error::{BuildError, ConfigurationError, HostError, SendError, TransactionError};
pub use host::{FailPoint, MemoryHost};
pub use host_thread::{CurrentThread, HostThread};
pub use materializer::{HostObjectBuilder, HostObjectBuilderResult};
pub use progress::{NoProgress, ProgressSink};
pub use receive::{
    LocalToGlobalMap, RenderMaterialProxy, RootObjectUnpacker, TraversalContext, UnpackedRoot,
    COLLECTION_TYPE, RENDER_MATERIAL_PROXY_TYPE,
};
pub use results::ConversionResult;
pub use send::{RootObjectBuilder, RootObjectBuilderResult};
pub use settings::{
    CardSetting, CardSettings, SendFilter, SenderModelCard, ToSpeckleSettingsManager,
    DETAIL_LEVEL_SETTING, REFERENCE_POINT_SETTING,
};
pub use transaction::{BuildStage, HostId, ReceiveHost, RenderMaterial, TransactionScope};
pub use unpacker::{AtomicObject, ObjectUnpacker, Packing, UnpackedSelection};

pub use tokio_util::sync::CancellationToken;
