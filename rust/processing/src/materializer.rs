// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host materialization of received objects
//!
//! One receive runs three independent transactions:
//!
//! | Stage       | Work                                        | On failure            |
//! |-------------|---------------------------------------------|-----------------------|
//! | PreClean    | purge groups/materials of a prior receive   | logged, receive goes on |
//! | Main        | bake materials, convert and insert objects  | commit failure aborts |
//! | PostProcess | paint materials, bake groups                | logged, main stays committed |
//!
//! Within Main every object is isolated: a failed conversion or insert is
//! recorded as an error result and the batch continues. Cancellation is
//! checked before each object; already baked objects are still committed.

use rebake_core::Base;
use rebake_geometry::{RootToHostConverter, ToHostRegistry, ToHostSettings};
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::bakers::{base_group_name, GroupBaker, MaterialBaker};
use crate::config::EngineConfig;
use crate::error::{BuildError, HostError, Result};
use crate::host_thread::HostThread;
use crate::progress::ProgressSink;
use crate::receive::{LocalToGlobalMap, RootObjectUnpacker};
use crate::results::ConversionResult;
use crate::transaction::{BuildStage, HostId, ReceiveHost, TransactionScope};

/// Outcome of a receive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostObjectBuilderResult {
    /// Host ids of the created elements, in bake order.
    pub created_ids: Vec<HostId>,
    /// One entry per atomic object attempted.
    pub results: Vec<ConversionResult>,
}

/// What the main stage hands to post-processing.
#[derive(Default)]
struct Baked {
    result: HostObjectBuilderResult,
    /// Solid host ids with the identities whose material applies to them,
    /// the object first, then its collections from nearest to root.
    to_paint: Vec<(HostId, Vec<String>)>,
    groups: GroupBaker,
    cancelled: bool,
}

/// Materializes received root objects into a host document.
pub struct HostObjectBuilder<'a> {
    converters: &'a ToHostRegistry,
    settings: ToHostSettings,
    config: EngineConfig,
}

impl<'a> HostObjectBuilder<'a> {
    pub fn new(converters: &'a ToHostRegistry, settings: ToHostSettings, config: EngineConfig) -> Self {
        Self {
            converters,
            settings,
            config,
        }
    }

    /// Receives `root` into `host`, running all host work through `thread`.
    #[allow(clippy::too_many_arguments)]
    pub async fn build<T, H, P>(
        &self,
        thread: &T,
        host: &mut H,
        root: &Base,
        project_name: &str,
        model_name: &str,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<HostObjectBuilderResult>
    where
        T: HostThread,
        H: ReceiveHost + ?Sized,
        P: ProgressSink + ?Sized,
    {
        thread
            .run_on_host(|| self.build_sync(host, root, project_name, model_name, progress, cancel))
            .await
    }

    fn build_sync<H, P>(
        &self,
        host: &mut H,
        root: &Base,
        project_name: &str,
        model_name: &str,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<HostObjectBuilderResult>
    where
        H: ReceiveHost + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let _span = tracing::info_span!("build", project = project_name, model = model_name).entered();
        let group_name = base_group_name(project_name, model_name);
        progress.report("Converting", None);

        let mut stage = BuildStage::Idle.next();
        self.pre_clean(host, stage, project_name, &group_name);

        stage = stage.next();
        let unpacked = RootObjectUnpacker.unpack(root);
        let (baked, paint) = {
            let name = stage.transaction_name(project_name).unwrap_or_default();
            let mut scope = TransactionScope::start(host, name)?;
            let materials = MaterialBaker.bake_materials(
                scope.host(),
                &unpacked.render_material_proxies,
                &group_name,
            );
            let baked = self.bake_objects(scope.host(), &unpacked.objects, progress, cancel);
            scope.commit()?;

            // Objects inherit the material of their closest collection.
            let paint: Vec<(HostId, HostId)> = baked
                .to_paint
                .iter()
                .filter_map(|(element, candidates)| {
                    candidates
                        .iter()
                        .find_map(|id| materials.get(id))
                        .map(|material| (element.clone(), material.clone()))
                })
                .collect();
            (baked, paint)
        };

        if baked.cancelled {
            tracing::warn!(
                baked = baked.result.created_ids.len(),
                total = unpacked.objects.len(),
                "receive cancelled, skipping post-processing"
            );
            return Err(BuildError::Cancelled(Box::new(baked.result)));
        }

        stage = stage.next();
        self.post_process(host, stage, project_name, &group_name, &baked.groups, &paint);

        stage = stage.next();
        tracing::info!(
            stage = ?stage,
            created = baked.result.created_ids.len(),
            failed = baked.result.results.iter().filter(|r| !r.is_success()).count(),
            "receive finished"
        );
        Ok(baked.result)
    }

    /// Best-effort purge of what a previous receive into the same target
    /// created.
    fn pre_clean<H: ReceiveHost + ?Sized>(
        &self,
        host: &mut H,
        stage: BuildStage,
        project_name: &str,
        group_name: &str,
    ) {
        let name = stage.transaction_name(project_name).unwrap_or_default();
        let mut scope = match TransactionScope::start(host, name) {
            Ok(scope) => scope,
            Err(e) => {
                tracing::warn!(error = %e, "skipping pre-receive clean");
                return;
            }
        };
        match purge_previous_receive(scope.host(), group_name) {
            Ok((groups, materials)) => {
                tracing::debug!(groups, materials, "purged previous receive");
            }
            Err(e) => tracing::error!(error = %e, "failed to clean up before receive"),
        }
        if let Err(e) = scope.commit() {
            tracing::warn!(error = %e, "pre-receive clean was not committed");
        }
    }

    fn bake_objects<H, P>(
        &self,
        host: &mut H,
        maps: &[LocalToGlobalMap],
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Baked
    where
        H: ReceiveHost + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let _span = tracing::debug_span!("bake_objects", count = maps.len()).entered();
        let converter = RootToHostConverter::new(self.converters, &self.settings);
        let mut baked = Baked::default();
        let total = maps.len() as f64;

        for (k, map) in maps.iter().enumerate() {
            if cancel.is_cancelled() {
                baked.cancelled = true;
                break;
            }
            let object = map.transformed_object();
            let source_id = object.identity().to_string();
            let _object_span = tracing::trace_span!("bake_object", id = %source_id).entered();

            let inserted = converter
                .convert(&object)
                .map_err(|e| ConversionResult::error(&source_id, &object.speckle_type, &e))
                .and_then(|shape| {
                    let solid = shape.is_solid();
                    host.insert_shape(shape)
                        .map(|id| (id, solid))
                        .map_err(|e| ConversionResult::error(&source_id, &object.speckle_type, &e))
                });

            match inserted {
                Ok((host_id, solid)) => {
                    baked.result.results.push(ConversionResult::success(
                        &source_id,
                        &object.speckle_type,
                        &host_id,
                        "Direct Shape",
                    ));
                    baked.groups.add_to_group_mapping(&map.context, host_id.clone());
                    if solid && self.config.paint_materials {
                        let mut candidates = vec![source_id.clone()];
                        candidates.extend(map.context.ancestor_ids.iter().rev().cloned());
                        baked.to_paint.push((host_id.clone(), candidates));
                    }
                    baked.result.created_ids.push(host_id);
                }
                Err(result) => {
                    tracing::warn!(
                        id = %source_id,
                        error = result.error_message().unwrap_or_default(),
                        "failed to bake object"
                    );
                    baked.result.results.push(result);
                }
            }
            progress.report("Converting", Some((k + 1) as f64 / total));
        }
        baked
    }

    /// Paints materials and bakes groups once the main transaction is
    /// committed. Failures are logged only.
    fn post_process<H: ReceiveHost + ?Sized>(
        &self,
        host: &mut H,
        stage: BuildStage,
        project_name: &str,
        group_name: &str,
        groups: &GroupBaker,
        paint: &[(HostId, HostId)],
    ) {
        let name = stage.transaction_name(project_name).unwrap_or_default();
        let mut scope = match TransactionScope::start(host, name) {
            Ok(scope) => scope,
            Err(e) => {
                tracing::warn!(error = %e, "skipping post-processing");
                return;
            }
        };

        let mut painted: FxHashMap<&str, usize> = FxHashMap::default();
        for (element, material) in paint {
            match scope.host().paint(element, material) {
                Ok(()) => *painted.entry(material.as_str()).or_default() += 1,
                Err(e) => tracing::warn!(element = %element, error = %e, "failed to paint material"),
            }
        }
        tracing::debug!(materials = painted.len(), "painted received solids");

        if let Err(e) = groups.bake_groups(scope.host(), group_name) {
            tracing::error!(error = %e, "failed to create group after receiving elements");
        }
        if let Err(e) = scope.commit() {
            tracing::warn!(error = %e, "post-processing was not committed");
        }
    }
}

fn purge_previous_receive<H: ReceiveHost + ?Sized>(
    host: &mut H,
    group_name: &str,
) -> std::result::Result<(usize, usize), HostError> {
    let groups = GroupBaker::purge_groups(host, group_name)?;
    let materials = MaterialBaker::purge_materials(host, group_name)?;
    Ok((groups, materials))
}
