// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use rebake_core::{Base, Geometry, LengthUnit, Point3};
use rebake_geometry::{register_to_host_defaults, ToHostRegistry, ToHostSettings};
use rebake_processing::{
    base_group_name, BuildError, CancellationToken, CurrentThread, EngineConfig, FailPoint,
    HostObjectBuilder, MemoryHost, NoProgress, ReceiveHost, RenderMaterial, RenderMaterialProxy,
    TransactionError, COLLECTION_TYPE,
};

const PROJECT: &str = "Tower";
const MODEL: &str = "structure";

fn registry() -> ToHostRegistry {
    let mut registry = ToHostRegistry::new();
    register_to_host_defaults(&mut registry).unwrap();
    registry
}

fn config() -> EngineConfig {
    EngineConfig {
        allow_converter_fallback: true,
        send_cache_enabled: true,
        paint_materials: true,
        log_filter: "warn".into(),
    }
}

fn solid(id: &str) -> Base {
    Base::new("Objects.Data.DataObject")
        .with_application_id(id)
        .with_units(LengthUnit::Meters)
        .with_display_value(Geometry::Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            faces: vec![[0, 1, 2]],
        })
}

fn collection(name: &str, children: Vec<Base>) -> Base {
    let mut c = Base::new(COLLECTION_TYPE)
        .with_application_id(format!("col-{name}"))
        .with_property("name", name);
    c.elements = children;
    c
}

/// Root with `n` objects under one collection; object `broken` (if any) has
/// no geometry and fails to convert.
fn root(n: usize, broken: Option<usize>) -> Base {
    let objects = (0..n)
        .map(|i| {
            let id = format!("obj-{i}");
            if Some(i) == broken {
                Base::new("Objects.Data.DataObject").with_application_id(id)
            } else {
                solid(&id)
            }
        })
        .collect();
    collection("root", vec![collection("Level 1", objects)])
}

async fn receive(
    host: &mut MemoryHost,
    root: &Base,
) -> Result<rebake_processing::HostObjectBuilderResult, BuildError> {
    let registry = registry();
    let builder = HostObjectBuilder::new(&registry, ToHostSettings::default(), config());
    builder
        .build(
            &CurrentThread,
            host,
            root,
            PROJECT,
            MODEL,
            &mut NoProgress,
            &CancellationToken::new(),
        )
        .await
}

#[tokio::test]
async fn one_failure_does_not_abort_batch() {
    let mut host = MemoryHost::new();
    let result = receive(&mut host, &root(5, Some(2))).await.unwrap();

    assert_eq!(result.results.len(), 5);
    assert_eq!(result.results.iter().filter(|r| r.is_success()).count(), 4);
    let failed: Vec<_> = result.results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].source_id(), "obj-2");
    assert_eq!(result.created_ids.len(), 4);
    assert_eq!(host.shape_count(), 4);
}

#[tokio::test]
async fn insert_failure_is_isolated() {
    let mut host = MemoryHost::new();
    host.fail_on(FailPoint::Insert("obj-0".into()));
    let result = receive(&mut host, &root(3, None)).await.unwrap();

    assert_eq!(result.created_ids.len(), 2);
    assert!(!result.results[0].is_success());
    assert!(result.results[1].is_success());
}

#[tokio::test]
async fn all_three_stages_commit_in_order() {
    let mut host = MemoryHost::new();
    receive(&mut host, &root(2, None)).await.unwrap();

    assert_eq!(
        host.commits(),
        [
            "Pre-receive clean".to_string(),
            format!("Received data from {PROJECT}"),
            "Creating group".to_string(),
        ]
    );
    let name = base_group_name(PROJECT, MODEL);
    let level = host
        .group_named(&format!("{name}: Level 1"))
        .expect("collection group");
    assert_eq!(level.members.len(), 2);
    assert!(host.group_named(&name).is_some());
}

#[tokio::test]
async fn pre_clean_failure_does_not_stop_main() {
    let mut host = MemoryHost::new();
    receive(&mut host, &root(2, None)).await.unwrap();
    assert_eq!(host.find_groups(&base_group_name(PROJECT, MODEL)).len(), 2);

    // Purging the previous receive's groups now fails.
    host.fail_on(FailPoint::Delete);
    let result = receive(&mut host, &root(3, None)).await.unwrap();

    assert_eq!(result.created_ids.len(), 3);
    assert_eq!(host.shape_count(), 5);
    assert!(host
        .commits()
        .contains(&format!("Received data from {PROJECT}")));
}

#[tokio::test]
async fn pre_clean_commit_failure_is_rolled_back() {
    let mut host = MemoryHost::new();
    host.fail_on(FailPoint::Commit("Pre-receive clean".into()));
    let result = receive(&mut host, &root(2, None)).await.unwrap();

    assert_eq!(result.created_ids.len(), 2);
    assert_eq!(host.rollbacks(), 1);
    assert_eq!(host.commits()[0], format!("Received data from {PROJECT}"));
}

#[tokio::test]
async fn main_commit_failure_is_fatal() {
    let mut host = MemoryHost::new();
    host.fail_on(FailPoint::Commit(format!("Received data from {PROJECT}")));
    let err = receive(&mut host, &root(2, None)).await.unwrap_err();

    assert!(matches!(
        err,
        BuildError::HostTransaction(TransactionError::Commit { .. })
    ));
    assert_eq!(host.shape_count(), 0);
}

#[tokio::test]
async fn post_process_failure_keeps_main_results() {
    let mut host = MemoryHost::new();
    host.fail_on(FailPoint::CreateGroup);
    let result = receive(&mut host, &root(3, None)).await.unwrap();

    assert_eq!(result.created_ids.len(), 3);
    assert_eq!(host.shape_count(), 3);
    assert_eq!(host.groups().count(), 0);
}

#[tokio::test]
async fn cancellation_commits_partial_result() {
    let registry = registry();
    let builder = HostObjectBuilder::new(&registry, ToHostSettings::default(), config());
    let token = CancellationToken::new();
    let trigger = token.clone();
    let mut events = Vec::new();
    let mut progress = |stage: &str, fraction: Option<f64>| {
        events.push((stage.to_string(), fraction));
        if fraction.is_some_and(|f| f >= 0.4) {
            trigger.cancel();
        }
    };

    let mut host = MemoryHost::new();
    let err = builder
        .build(
            &CurrentThread,
            &mut host,
            &root(5, None),
            PROJECT,
            MODEL,
            &mut progress,
            &token,
        )
        .await
        .unwrap_err();

    let BuildError::Cancelled(partial) = err else {
        panic!("expected cancellation, got {err:?}");
    };
    assert_eq!(partial.created_ids.len(), 2);
    assert_eq!(host.shape_count(), 2);
    // Post-processing never ran.
    assert_eq!(host.groups().count(), 0);
    assert!(!host.commits().contains(&"Creating group".to_string()));
    assert_eq!(events[0], ("Converting".to_string(), None));
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn progress_reaches_completion() {
    let registry = registry();
    let builder = HostObjectBuilder::new(&registry, ToHostSettings::default(), config());
    let mut fractions = Vec::new();
    let mut progress = |_: &str, fraction: Option<f64>| fractions.push(fraction);

    let mut host = MemoryHost::new();
    builder
        .build(
            &CurrentThread,
            &mut host,
            &root(4, Some(1)),
            PROJECT,
            MODEL,
            &mut progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        fractions,
        vec![None, Some(0.25), Some(0.5), Some(0.75), Some(1.0)]
    );
}

#[tokio::test]
async fn collection_material_is_painted_on_solids() {
    let proxy = RenderMaterialProxy {
        application_id: "mat-glass".into(),
        material: RenderMaterial {
            name: "Glass".into(),
            diffuse: 0xFF00_88FF,
            opacity: 0.3,
        },
        objects: vec!["col-Level 1".into()],
    };
    let mut root = root(2, None);
    root.elements.push(proxy.to_base());

    let mut host = MemoryHost::new();
    let result = receive(&mut host, &root).await.unwrap();

    assert_eq!(host.material_count(), 1);
    for id in &result.created_ids {
        let material = host.painted_material(id).expect("painted");
        assert_eq!(host.material(material).unwrap().opacity, 0.3);
    }

    // A second receive purges and recreates the material.
    receive(&mut host, &root).await.unwrap();
    assert_eq!(host.material_count(), 1);
}

#[tokio::test]
async fn painting_can_be_disabled() {
    let proxy = RenderMaterialProxy {
        application_id: "mat".into(),
        material: RenderMaterial {
            name: "Red".into(),
            diffuse: 0xFFFF_0000,
            opacity: 1.0,
        },
        objects: vec!["obj-0".into()],
    };
    let mut root = root(1, None);
    root.elements.push(proxy.to_base());

    let registry = registry();
    let config = EngineConfig {
        paint_materials: false,
        ..config()
    };
    let builder = HostObjectBuilder::new(&registry, ToHostSettings::default(), config);
    let mut host = MemoryHost::new();
    let result = builder
        .build(
            &CurrentThread,
            &mut host,
            &root,
            PROJECT,
            MODEL,
            &mut NoProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(host.painted_material(&result.created_ids[0]).is_none());
}
