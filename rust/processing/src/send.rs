// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Send pipeline: selection → atomic objects → cached or converted Base
//! objects, collected under a root collection per category.

use std::sync::Arc;

use rebake_core::{Base, HostDocument, NativeId};
use rebake_geometry::{RootToSpeckleConverter, ToSpeckleRegistry};
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::cache::{ConversionCache, Fingerprint};
use crate::config::EngineConfig;
use crate::error::SendError;
use crate::host_thread::HostThread;
use crate::progress::ProgressSink;
use crate::receive::COLLECTION_TYPE;
use crate::results::ConversionResult;
use crate::settings::{SenderModelCard, ToSpeckleSettingsManager};
use crate::unpacker::ObjectUnpacker;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone)]
pub struct RootObjectBuilderResult {
    /// Root collection with one child collection per category.
    pub root: Base,
    pub results: Vec<ConversionResult>,
    /// Atomic ids and their sub-elements; a change to any of them
    /// outdates the send.
    pub sent_ids: Vec<NativeId>,
    pub cache_hits: usize,
}

/// Builds the root object of a send.
pub struct RootObjectBuilder<'a> {
    converters: &'a ToSpeckleRegistry,
    unpacker: ObjectUnpacker,
    config: EngineConfig,
}

impl<'a> RootObjectBuilder<'a> {
    pub fn new(converters: &'a ToSpeckleRegistry, config: EngineConfig) -> Self {
        Self {
            converters,
            unpacker: ObjectUnpacker::new(),
            config,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn build<T, P>(
        &self,
        thread: &T,
        document: &HostDocument,
        card: &SenderModelCard,
        settings_manager: &mut ToSpeckleSettingsManager,
        cache: &mut dyn ConversionCache,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<RootObjectBuilderResult, SendError>
    where
        T: HostThread,
        P: ProgressSink + ?Sized,
    {
        thread
            .run_on_host(|| {
                self.build_sync(document, card, settings_manager, cache, progress, cancel)
            })
            .await
    }

    fn build_sync<P: ProgressSink + ?Sized>(
        &self,
        document: &HostDocument,
        card: &SenderModelCard,
        settings_manager: &mut ToSpeckleSettingsManager,
        cache: &mut dyn ConversionCache,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<RootObjectBuilderResult, SendError> {
        let _span = tracing::info_span!("send", model_card = %card.model_card_id).entered();

        let settings =
            settings_manager.get_to_speckle_settings(card, document, &self.unpacker, cache)?;
        let selection = &card.send_filter.selected_object_ids;
        if selection.is_empty() {
            return Err(SendError::EmptySelection);
        }

        let unpacked = self.unpacker.unpack(document, selection);
        let fingerprint = Fingerprint::of(&settings);
        let converter = RootToSpeckleConverter::new(self.converters, self.config.allow_converter_fallback);

        let mut collections: Vec<Base> = Vec::new();
        let mut by_category: FxHashMap<String, usize> = FxHashMap::default();
        let mut results = Vec::with_capacity(unpacked.len());
        let mut cache_hits = 0;
        let total = unpacked.len() as f64;

        for (k, atomic) in unpacked.atomics.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SendError::Cancelled);
            }

            let cached = if self.config.send_cache_enabled {
                cache.get(&atomic.id, fingerprint)
            } else {
                None
            };
            let converted = match cached {
                Some(hit) => {
                    cache_hits += 1;
                    Ok(Base::clone(&hit))
                }
                None => converter
                    .convert(&atomic.id, document, &settings)
                    .inspect(|base| {
                        if self.config.send_cache_enabled {
                            cache.put(atomic.id.clone(), fingerprint, Arc::new(base.clone()));
                        }
                    }),
            };

            match converted {
                Ok(base) => {
                    results.push(ConversionResult::success(
                        atomic.id.as_str(),
                        atomic.kind.as_str(),
                        base.id.as_str(),
                        base.speckle_type.as_str(),
                    ));
                    let category = base.get_str("category").unwrap_or(UNCATEGORIZED).to_string();
                    let slot = *by_category.entry(category.clone()).or_insert_with(|| {
                        collections.push(Base::new(COLLECTION_TYPE).with_property("name", category));
                        collections.len() - 1
                    });
                    collections[slot].elements.push(base);
                }
                Err(e) => {
                    tracing::warn!(id = %atomic.id, error = %e, "failed to convert object");
                    results.push(ConversionResult::error(
                        atomic.id.as_str(),
                        atomic.kind.as_str(),
                        &e,
                    ));
                }
            }
            progress.report("Converting", Some((k + 1) as f64 / total));
        }

        if !results.is_empty() && results.iter().all(|r| !r.is_success()) {
            return Err(SendError::NothingConverted(results.len()));
        }

        let mut root = Base::new(COLLECTION_TYPE)
            .with_application_id(document.id().to_string())
            .with_property("name", document.name())
            .with_units(document.units());
        root.elements = collections;
        root.finalize()?;

        tracing::info!(
            converted = root.elements.iter().map(|c| c.elements.len()).sum::<usize>(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            cache_hits,
            "send finished"
        );
        Ok(RootObjectBuilderResult {
            root,
            results,
            sent_ids: self
                .unpacker
                .element_and_subelement_ids(document, &unpacked.atomics),
            cache_hits,
        })
    }
}
