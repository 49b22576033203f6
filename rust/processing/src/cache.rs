// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Send conversion cache
//!
//! Converted Base objects keyed by `(native id, settings fingerprint)`.
//! An entry is only valid for the fingerprint that produced it; the settings
//! manager evicts by id when a tracked setting changes.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rebake_core::{Base, NativeId};
use rebake_geometry::ToSpeckleSettings;
use rustc_hash::{FxHashMap, FxHasher};

/// Hash of every conversion-affecting setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(settings: &ToSpeckleSettings) -> Self {
        let mut hasher = FxHasher::default();
        settings.detail_level.hash(&mut hasher);
        match &settings.reference_point_transform {
            Some(m) => {
                1u8.hash(&mut hasher);
                for v in m.iter() {
                    v.to_bits().hash(&mut hasher);
                }
            }
            None => 0u8.hash(&mut hasher),
        }
        let crs = &settings.crs;
        crs.spatial_reference.hash(&mut hasher);
        crs.lat_offset.to_bits().hash(&mut hasher);
        crs.lon_offset.to_bits().hash(&mut hasher);
        crs.true_north_radians.to_bits().hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Cache of converted objects shared by sequential sends of one session.
pub trait ConversionCache {
    fn get(&self, id: &NativeId, fingerprint: Fingerprint) -> Option<Arc<Base>>;

    fn put(&mut self, id: NativeId, fingerprint: Fingerprint, result: Arc<Base>);

    /// Drops the entries of `ids` for every fingerprint.
    fn evict_objects(&mut self, ids: &[NativeId]);
}

/// In-memory [`ConversionCache`].
#[derive(Debug, Default)]
pub struct SendConversionCache {
    entries: FxHashMap<NativeId, FxHashMap<Fingerprint, Arc<Base>>>,
}

impl SendConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached (id, fingerprint) pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_object(&self, id: &NativeId) -> bool {
        self.entries.contains_key(id)
    }
}

impl ConversionCache for SendConversionCache {
    fn get(&self, id: &NativeId, fingerprint: Fingerprint) -> Option<Arc<Base>> {
        self.entries.get(id)?.get(&fingerprint).cloned()
    }

    fn put(&mut self, id: NativeId, fingerprint: Fingerprint, result: Arc<Base>) {
        self.entries.entry(id).or_default().insert(fingerprint, result);
    }

    fn evict_objects(&mut self, ids: &[NativeId]) {
        let mut evicted = 0;
        for id in ids {
            if let Some(per_id) = self.entries.remove(id) {
                evicted += per_id.len();
            }
        }
        tracing::debug!(requested = ids.len(), evicted, "evicted cached conversions");
    }
}
