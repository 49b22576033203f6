// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use rebake_core::EntityKind;

use super::{ConverterRegistry, SpeckleType, TypeTag};
use crate::error::{RegistrationError, ResolutionError};

trait Named {
    fn name(&self) -> &'static str;
}

struct Fixed(&'static str);

impl Named for Fixed {
    fn name(&self) -> &'static str {
        self.0
    }
}

type Registry = ConverterRegistry<EntityKind, dyn Named>;

fn named(name: &'static str) -> Arc<dyn Named> {
    Arc::new(Fixed(name))
}

#[test]
fn test_exact_match_wins() {
    let mut registry = Registry::new();
    registry.register(EntityKind::Element, 0, &[], named("element")).unwrap();
    registry.register(EntityKind::Wall, 0, &[], named("wall")).unwrap();

    let c = registry.resolve(&EntityKind::Wall, true).unwrap();
    assert_eq!(c.name(), "wall");
}

#[test]
fn test_highest_rank_wins() {
    let mut registry = Registry::new();
    registry.register(EntityKind::Wall, 0, &[], named("low")).unwrap();
    registry.register(EntityKind::Wall, 10, &[], named("high")).unwrap();
    registry.register(EntityKind::Wall, 5, &[], named("mid")).unwrap();

    assert_eq!(registry.resolve(&EntityKind::Wall, false).unwrap().name(), "high");
}

#[test]
fn test_fallback_walks_hierarchy() {
    let mut registry = Registry::new();
    registry
        .register(EntityKind::FamilyInstance, 0, &[], named("family"))
        .unwrap();

    let c = registry.resolve(&EntityKind::Mullion, true).unwrap();
    assert_eq!(c.name(), "family");
}

#[test]
fn test_no_fallback_is_resolution_error() {
    let mut registry = Registry::new();
    registry.register(EntityKind::Element, 0, &[], named("element")).unwrap();

    let err = registry.resolve(&EntityKind::Panel, false).err().unwrap();
    assert_eq!(
        err,
        ResolutionError::NoConverter {
            type_name: "Panel".into()
        }
    );
}

#[test]
fn test_unknown_has_no_fallback() {
    let mut registry = Registry::new();
    registry.register(EntityKind::Element, 0, &[], named("element")).unwrap();

    let err = registry.resolve(&EntityKind::Unknown, true).err().unwrap();
    assert!(matches!(err, ResolutionError::NoFallback { .. }));
}

#[test]
fn test_cycle_detected_eagerly() {
    let mut registry = Registry::new();
    registry
        .register(EntityKind::Wall, 0, &[EntityKind::Mullion], named("wall"))
        .unwrap();
    registry
        .register(EntityKind::Mullion, 0, &[EntityKind::Panel], named("mullion"))
        .unwrap();

    let err = registry
        .register(EntityKind::Panel, 0, &[EntityKind::Wall], named("panel"))
        .unwrap_err();
    let RegistrationError::Cycle { path } = err;
    assert_eq!(path, vec!["Panel", "Wall", "Mullion", "Panel"]);

    // The rejected registration left nothing behind.
    assert!(!registry.contains(&EntityKind::Panel));
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let mut registry = Registry::new();
    let result = registry.register(EntityKind::Wall, 0, &[EntityKind::Wall], named("wall"));
    assert!(result.is_err());
}

#[test]
fn test_speckle_type_fallback_chain() {
    let mut tag = SpeckleType::new("Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall");
    let mut chain = vec![tag.to_string()];
    while let Some(next) = tag.fallback() {
        chain.push(next.to_string());
        tag = next;
    }
    assert_eq!(
        chain,
        vec![
            "Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall",
            "Objects.BuiltElements.Wall",
            "Base",
        ]
    );
}
