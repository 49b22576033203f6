// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Non-native geometry datasets
//!
//! GIS hosts cannot hold received CAD/BIM geometry as native layers, so the
//! converted geometry is grouped into datasets (feature classes), one per
//! source parent, object type and active CRS offset. Receiving the same
//! commit again with another offset therefore writes separate datasets.
//!
//! Dataset names are limited to 128 characters:
//! `speckle_` + type (10) + `_SR_` + spatial reference (15) + offsets + id.

use rebake_core::{Base, CrsOffsetRotation, Dictionary, Geometry};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::HostError;

/// Conversion state of one received object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectConversionTracker {
    pub base: Base,
    /// Identity of the collection the object was received under.
    pub parent_id: Option<String>,
    /// Converted geometry not yet written to any dataset.
    pub host_geometry: Option<Vec<Geometry>>,
    pub dataset_id: Option<String>,
    pub dataset_row: Option<usize>,
    pub error: Option<String>,
}

impl ObjectConversionTracker {
    pub fn new(base: Base, parent_id: Option<String>, host_geometry: Vec<Geometry>) -> Self {
        Self {
            base,
            parent_id,
            host_geometry: Some(host_geometry),
            dataset_id: None,
            dataset_row: None,
            error: None,
        }
    }

    /// A GIS layer that was written natively.
    pub fn native(base: Base, dataset_id: impl Into<String>) -> Self {
        Self {
            base,
            parent_id: None,
            host_geometry: None,
            dataset_id: Some(dataset_id.into()),
            dataset_row: None,
            error: None,
        }
    }
}

/// One row of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub source_id: String,
    pub attributes: Dictionary,
    pub geometry: Vec<Geometry>,
}

/// Where datasets are written (a file geodatabase in a GIS host).
pub trait DatasetStore {
    /// Replaces the dataset `name` with `features`.
    fn write_dataset(&mut self, name: &str, features: Vec<Feature>) -> Result<(), HostError>;
}

/// In-memory [`DatasetStore`].
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    datasets: FxHashMap<String, Vec<Feature>>,
    rejected: FxHashSet<String>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes of `name` fail.
    pub fn reject(&mut self, name: impl Into<String>) {
        self.rejected.insert(name.into());
    }

    pub fn dataset(&self, name: &str) -> Option<&[Feature]> {
        self.datasets.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl DatasetStore for MemoryDatasetStore {
    fn write_dataset(&mut self, name: &str, features: Vec<Feature>) -> Result<(), HostError> {
        if self.rejected.contains(name) {
            return Err(HostError::rejected("write dataset", name));
        }
        self.datasets.insert(name.to_string(), features);
        Ok(())
    }
}

fn truncate(value: &str, limit: usize, keep: usize) -> &str {
    if value.chars().count() > limit {
        value
            .char_indices()
            .nth(keep)
            .map_or(value, |(i, _)| &value[..i])
    } else {
        value
    }
}

fn number_segment(value: f64, limit: usize, keep: usize) -> String {
    let text = value.to_string().replace('.', "_");
    truncate(&text, limit, keep).to_string()
}

/// Groups non-native geometry into datasets.
pub struct NonNativeFeatureWriter<'a> {
    crs: &'a CrsOffsetRotation,
}

impl<'a> NonNativeFeatureWriter<'a> {
    pub fn new(crs: &'a CrsOffsetRotation) -> Self {
        Self { crs }
    }

    /// Dataset name for an object of `speckle_type` under `parent_id`.
    pub fn dataset_key(&self, speckle_type: &str, parent_id: Option<&str>) -> String {
        let short_type = speckle_type.rsplit('.').next().unwrap_or(speckle_type);
        let short_type = truncate(short_type, 10, 9);

        let sr = &self.crs.spatial_reference;
        let sr_len = sr.chars().count().saturating_sub(1).min(15);
        let sr = truncate(sr, sr_len, sr_len);

        let x = number_segment(self.crs.lon_offset, 15, 14);
        let y = number_segment(self.crs.lat_offset, 15, 14);
        let north = number_segment(self.crs.true_north_radians, 10, 9);

        format!(
            "speckle_{short_type}_SR_{sr}_X_{x}_Y_{y}_North_{north}_speckleID_{}",
            parent_id.unwrap_or_default()
        )
    }

    /// Assigns every pending tracker a dataset and row, then writes the
    /// datasets. Failures are recorded on the affected trackers; nothing
    /// aborts the batch.
    pub fn write_geometries_to_datasets<S: DatasetStore + ?Sized>(
        &self,
        trackers: &mut [ObjectConversionTracker],
        store: &mut S,
    ) {
        let _span = tracing::debug_span!("write_datasets", objects = trackers.len()).entered();

        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        let mut by_key: FxHashMap<String, usize> = FxHashMap::default();

        for (i, tracker) in trackers.iter_mut().enumerate() {
            match (&tracker.host_geometry, &tracker.dataset_id) {
                (Some(_), None) => {
                    let key =
                        self.dataset_key(&tracker.base.speckle_type, tracker.parent_id.as_deref());
                    let slot = *by_key.entry(key.clone()).or_insert_with(|| {
                        groups.push((key.clone(), Vec::new()));
                        groups.len() - 1
                    });
                    let rows = &mut groups[slot].1;
                    rows.push(i);
                    tracker.dataset_row = Some(rows.len() - 1);
                    tracker.dataset_id = Some(key);
                }
                // Native layer, already written.
                (None, Some(_)) => {}
                _ => {
                    tracker.error = Some(format!(
                        "unexpected geometry and dataset values for {}",
                        tracker.base.identity()
                    ));
                }
            }
        }

        for (key, rows) in groups {
            let features = rows
                .iter()
                .map(|&i| Feature {
                    source_id: trackers[i].base.identity().to_string(),
                    attributes: trackers[i].base.properties.clone(),
                    geometry: trackers[i].host_geometry.clone().unwrap_or_default(),
                })
                .collect();
            if let Err(e) = store.write_dataset(&key, features) {
                tracing::warn!(dataset = %key, error = %e, "failed to write dataset");
                for &i in &rows {
                    trackers[i].error = Some(e.to_string());
                }
            } else {
                for &i in &rows {
                    trackers[i].host_geometry = None;
                }
            }
        }
    }
}
