// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receive-side unpacking
//!
//! A received root object is a tree of collections whose leaves are the
//! atomic objects to convert. Render material proxies travel alongside as
//! root elements. Collections may carry a placement `transform`; the
//! placement of an atomic is the product of every transform on its path.

use nalgebra::Matrix4;
use rebake_core::{Base, DictValue};
use rebake_geometry::transform::{base_transform, TRANSFORM_KEY};

use crate::transaction::RenderMaterial;

pub const COLLECTION_TYPE: &str = "Speckle.Core.Models.Collections.Collection";
pub const RENDER_MATERIAL_PROXY_TYPE: &str = "Objects.Other.RenderMaterialProxy";

/// Position of an atomic object in the received tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalContext {
    /// Collection names from the root (exclusive) down to the object's parent.
    pub path: Vec<String>,
    /// Identities of those collections, same order.
    pub ancestor_ids: Vec<String>,
}

/// Render material and the objects (or collections) it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMaterialProxy {
    pub application_id: String,
    pub material: RenderMaterial,
    pub objects: Vec<String>,
}

impl RenderMaterialProxy {
    /// Reads a proxy from its Base form:
    /// `{ name, diffuse, opacity, objects: [..] }`.
    pub fn from_base(base: &Base) -> Option<Self> {
        let diffuse = base.get("diffuse").and_then(DictValue::as_i64)?;
        let objects = base
            .get("objects")
            .and_then(DictValue::as_list)?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        Some(Self {
            application_id: base.identity().to_string(),
            material: RenderMaterial {
                name: base.get_str("name").unwrap_or("material").to_string(),
                diffuse: u32::try_from(diffuse).ok()?,
                opacity: base.get("opacity").and_then(DictValue::as_f64).unwrap_or(1.0),
            },
            objects,
        })
    }

    pub fn to_base(&self) -> Base {
        Base::new(RENDER_MATERIAL_PROXY_TYPE)
            .with_application_id(self.application_id.clone())
            .with_property("name", self.material.name.clone())
            .with_property("diffuse", i64::from(self.material.diffuse))
            .with_property("opacity", self.material.opacity)
            .with_property(
                "objects",
                DictValue::List(
                    self.objects
                        .iter()
                        .map(|o| DictValue::String(o.clone()))
                        .collect(),
                ),
            )
    }
}

/// An atomic object with the placement and context it was found in.
/// Produced once per atomic object and consumed once by the materializer.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalToGlobalMap {
    pub atomic_object: Base,
    pub matrix: Matrix4<f64>,
    pub context: TraversalContext,
}

impl LocalToGlobalMap {
    /// The atomic object with its placement applied to every geometry,
    /// nested elements included. The stored transform is dropped.
    pub fn transformed_object(&self) -> Base {
        let mut object = self.atomic_object.clone();
        if self.matrix != Matrix4::identity() {
            apply(&mut object, &self.matrix);
        }
        object.properties.remove(TRANSFORM_KEY);
        object
    }
}

fn apply(base: &mut Base, matrix: &Matrix4<f64>) {
    for g in &mut base.display_value {
        *g = g.transformed(matrix);
    }
    for child in &mut base.elements {
        apply(child, matrix);
    }
}

/// Result of [`RootObjectUnpacker::unpack`].
#[derive(Debug, Clone, Default)]
pub struct UnpackedRoot {
    pub objects: Vec<LocalToGlobalMap>,
    pub render_material_proxies: Vec<RenderMaterialProxy>,
}

/// Splits a received root into atomic objects and proxies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootObjectUnpacker;

impl RootObjectUnpacker {
    pub fn unpack(&self, root: &Base) -> UnpackedRoot {
        let _span = tracing::debug_span!("unpack_root").entered();
        let mut out = UnpackedRoot::default();
        let matrix = placement(root);
        for child in &root.elements {
            self.visit(child, &matrix, &mut Vec::new(), &mut out);
        }
        tracing::debug!(
            objects = out.objects.len(),
            materials = out.render_material_proxies.len(),
            "unpacked root object"
        );
        out
    }

    fn visit(
        &self,
        base: &Base,
        parent: &Matrix4<f64>,
        path: &mut Vec<(String, String)>,
        out: &mut UnpackedRoot,
    ) {
        match base.speckle_type.as_str() {
            RENDER_MATERIAL_PROXY_TYPE => match RenderMaterialProxy::from_base(base) {
                Some(proxy) => out.render_material_proxies.push(proxy),
                None => tracing::warn!(id = base.identity(), "malformed render material proxy"),
            },
            COLLECTION_TYPE => {
                let matrix = parent * placement(base);
                let name = base.get_str("name").unwrap_or(base.identity()).to_string();
                path.push((name, base.identity().to_string()));
                for child in &base.elements {
                    self.visit(child, &matrix, path, out);
                }
                path.pop();
            }
            _ => {
                let (names, ids) = path.iter().cloned().unzip();
                out.objects.push(LocalToGlobalMap {
                    atomic_object: base.clone(),
                    matrix: parent * placement(base),
                    context: TraversalContext {
                        path: names,
                        ancestor_ids: ids,
                    },
                });
            }
        }
    }
}

/// Placement stored on a Base; malformed transforms are ignored.
fn placement(base: &Base) -> Matrix4<f64> {
    match base_transform(base) {
        Ok(Some(m)) => m,
        Ok(None) => Matrix4::identity(),
        Err(e) => {
            tracing::warn!(id = base.identity(), error = %e, "ignoring malformed transform");
            Matrix4::identity()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rebake_core::{Geometry, Point3};
    use rebake_geometry::transform::{set_base_transform, translation};

    fn point(x: f64) -> Base {
        Base::new("Objects.Geometry.Point")
            .with_application_id(format!("p{x}"))
            .with_display_value(Geometry::Point {
                location: Point3::new(x, 0.0, 0.0),
            })
    }

    fn collection(name: &str) -> Base {
        Base::new(COLLECTION_TYPE)
            .with_application_id(format!("c-{name}"))
            .with_property("name", name)
    }

    #[test]
    fn collections_compose_placements() {
        let mut level = collection("Level 1").with_element(point(1.0));
        set_base_transform(&mut level, &translation(&Point3::new(10.0, 0.0, 0.0)));
        let mut moved = point(2.0);
        set_base_transform(&mut moved, &translation(&Point3::new(0.0, 5.0, 0.0)));
        level.elements.push(moved);

        let root = collection("root")
            .with_element(level)
            .with_element(point(3.0));
        let unpacked = RootObjectUnpacker.unpack(&root);

        assert_eq!(unpacked.objects.len(), 3);
        assert_eq!(unpacked.objects[0].context.path, vec!["Level 1".to_string()]);
        assert_eq!(unpacked.objects[0].context.ancestor_ids, vec!["c-Level 1".to_string()]);
        assert!(unpacked.objects[2].context.path.is_empty());

        let moved = unpacked.objects[1].transformed_object();
        assert!(moved.get("transform").is_none());
        match &moved.display_value[0] {
            Geometry::Point { location } => {
                assert_relative_eq!(location.x, 12.0);
                assert_relative_eq!(location.y, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn proxies_are_split_from_objects() {
        let proxy = RenderMaterialProxy {
            application_id: "mat-1".into(),
            material: RenderMaterial {
                name: "Glass".into(),
                diffuse: 0xFF00_00FF,
                opacity: 0.4,
            },
            objects: vec!["p1".into()],
        };
        let root = collection("root")
            .with_element(point(1.0))
            .with_element(proxy.to_base());

        let unpacked = RootObjectUnpacker.unpack(&root);
        assert_eq!(unpacked.objects.len(), 1);
        assert_eq!(unpacked.render_material_proxies, vec![proxy]);
    }

    #[test]
    fn malformed_transform_is_identity() {
        let bad = point(1.0).with_property("transform", "nope");
        let root = collection("root").with_element(bad);
        let unpacked = RootObjectUnpacker.unpack(&root);
        assert_eq!(unpacked.objects[0].matrix, Matrix4::identity());
    }
}
