// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Groups and materials created around a receive.
//!
//! Both bakers name what they create after the base group name
//! (`Project {project}: Model {model}`), so a later receive into the same
//! target can find and purge it.

use rustc_hash::FxHashMap;

use crate::error::HostError;
use crate::receive::{RenderMaterialProxy, TraversalContext};
use crate::transaction::{HostId, ReceiveHost};

/// Name shared by everything one receive creates.
pub fn base_group_name(project_name: &str, model_name: &str) -> String {
    format!("Project {project_name}: Model {model_name}")
}

/// Collects created elements by collection path, then bakes one nested
/// group per collection.
#[derive(Debug, Default)]
pub struct GroupBaker {
    /// Collection path → directly contained elements, in insertion order.
    groups: Vec<(Vec<String>, Vec<HostId>)>,
    index: FxHashMap<Vec<String>, usize>,
}

impl GroupBaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_group_mapping(&mut self, context: &TraversalContext, element: HostId) {
        let slot = self.slot(&context.path);
        self.groups[slot].1.push(element);
        // Make sure every ancestor exists, so empty intermediate
        // collections still nest.
        for depth in (0..context.path.len()).rev() {
            self.slot(&context.path[..depth]);
        }
    }

    fn slot(&mut self, path: &[String]) -> usize {
        if let Some(&i) = self.index.get(path) {
            return i;
        }
        self.groups.push((path.to_vec(), Vec::new()));
        self.index.insert(path.to_vec(), self.groups.len() - 1);
        self.groups.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, members)| members.is_empty())
    }

    /// Creates the groups, deepest first. The root group is named
    /// `base_group_name`; nested groups are named by their path below it.
    /// Returns the root group id, or `None` if nothing was mapped.
    pub fn bake_groups<H: ReceiveHost + ?Sized>(
        &self,
        host: &mut H,
        base_group_name: &str,
    ) -> Result<Option<HostId>, HostError> {
        if self.is_empty() {
            return Ok(None);
        }

        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.groups[i].0.len()));

        let mut created: FxHashMap<&[String], HostId> = FxHashMap::default();
        for i in order {
            let (path, elements) = &self.groups[i];
            let mut members = elements.clone();
            // Children were baked before their parent.
            let mut children: Vec<(&[String], &HostId)> = created
                .iter()
                .filter(|(child, _)| child.len() == path.len() + 1 && child.starts_with(path))
                .map(|(child, id)| (*child, id))
                .collect();
            children.sort();
            members.extend(children.into_iter().map(|(_, id)| id.clone()));
            if members.is_empty() {
                continue;
            }

            let name = if path.is_empty() {
                base_group_name.to_string()
            } else {
                format!("{base_group_name}: {}", path.join(" / "))
            };
            let id = host.create_group(&name, &members)?;
            created.insert(path.as_slice(), id);
        }
        let root: &[String] = &[];
        Ok(created.get(root).cloned())
    }

    /// Deletes groups left by a previous receive into the same target.
    pub fn purge_groups<H: ReceiveHost + ?Sized>(
        host: &mut H,
        base_group_name: &str,
    ) -> Result<usize, HostError> {
        let stale = host.find_groups(base_group_name);
        for id in &stale {
            host.delete(id)?;
        }
        Ok(stale.len())
    }
}

/// Creates host materials from render material proxies.
#[derive(Debug, Default)]
pub struct MaterialBaker;

impl MaterialBaker {
    pub fn new() -> Self {
        Self
    }

    /// Creates one host material per proxy and returns the material id for
    /// every object (or collection) id the proxies list. A material that
    /// cannot be created is logged and skipped.
    pub fn bake_materials<H: ReceiveHost + ?Sized>(
        &self,
        host: &mut H,
        proxies: &[RenderMaterialProxy],
        base_group_name: &str,
    ) -> FxHashMap<String, HostId> {
        let _span = tracing::debug_span!("bake_materials", count = proxies.len()).entered();
        let mut by_object = FxHashMap::default();
        for proxy in proxies {
            let name = format!(
                "{}-({})-{base_group_name}",
                proxy.material.name, proxy.application_id
            );
            match host.create_material(&name, &proxy.material) {
                Ok(id) => {
                    for object in &proxy.objects {
                        by_object.insert(object.clone(), id.clone());
                    }
                }
                Err(e) => {
                    tracing::error!(material = %name, error = %e, "failed to create material");
                }
            }
        }
        by_object
    }

    /// Deletes materials left by a previous receive into the same target.
    pub fn purge_materials<H: ReceiveHost + ?Sized>(
        host: &mut H,
        base_group_name: &str,
    ) -> Result<usize, HostError> {
        let stale = host.find_materials(base_group_name);
        for id in &stale {
            host.delete(id)?;
        }
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FailPoint, MemoryHost};
    use crate::transaction::RenderMaterial;
    use rebake_core::{Geometry, Point3};
    use rebake_geometry::HostShape;

    fn context(path: &[&str]) -> TraversalContext {
        TraversalContext {
            path: path.iter().map(|s| s.to_string()).collect(),
            ancestor_ids: Vec::new(),
        }
    }

    fn insert(host: &mut MemoryHost, name: &str) -> HostId {
        host.insert_shape(HostShape {
            application_id: name.into(),
            name: name.into(),
            category: "Generic Models".into(),
            geometry: vec![Geometry::Point {
                location: Point3::origin(),
            }],
        })
        .unwrap()
    }

    #[test]
    fn groups_nest_by_collection_path() {
        let mut host = MemoryHost::new();
        host.start_transaction("t").unwrap();
        let a = insert(&mut host, "a");
        let b = insert(&mut host, "b");
        let c = insert(&mut host, "c");

        let mut baker = GroupBaker::new();
        baker.add_to_group_mapping(&context(&["Level 1", "Walls"]), a.clone());
        baker.add_to_group_mapping(&context(&["Level 1", "Walls"]), b.clone());
        baker.add_to_group_mapping(&context(&[]), c.clone());

        let name = base_group_name("Tower", "main");
        let root = baker.bake_groups(&mut host, &name).unwrap().unwrap();

        let walls = host.group_named("Project Tower: Model main: Level 1 / Walls").unwrap();
        assert_eq!(walls.members, vec![a, b]);
        let level = host.group_named("Project Tower: Model main: Level 1").unwrap();
        assert_eq!(level.members.len(), 1);
        let top = host.group_named(&name).unwrap();
        assert_eq!(top.members.len(), 2);
        assert!(top.members.contains(&c));
        assert_eq!(host.find_groups(&name).len(), 3);
        assert!(host.find_groups(&name).contains(&root));

        assert_eq!(GroupBaker::purge_groups(&mut host, &name).unwrap(), 3);
        assert!(host.find_groups(&name).is_empty());
    }

    #[test]
    fn nothing_mapped_bakes_nothing() {
        let mut host = MemoryHost::new();
        host.start_transaction("t").unwrap();
        assert_eq!(GroupBaker::new().bake_groups(&mut host, "g").unwrap(), None);
    }

    #[test]
    fn failed_material_is_skipped() {
        let proxy = |id: &str| RenderMaterialProxy {
            application_id: id.into(),
            material: RenderMaterial {
                name: "Brick".into(),
                diffuse: 0xFFAA_3300,
                opacity: 1.0,
            },
            objects: vec![format!("{id}-object")],
        };

        let mut host = MemoryHost::new();
        host.start_transaction("t").unwrap();
        let map = MaterialBaker.bake_materials(&mut host, &[proxy("m1")], "Project P: Model M");
        let material = &map["m1-object"];
        assert_eq!(
            host.material(material).unwrap().name,
            "Brick-(m1)-Project P: Model M"
        );
        assert_eq!(
            MaterialBaker::purge_materials(&mut host, "Project P: Model M").unwrap(),
            1
        );

        host.fail_on(FailPoint::CreateMaterial);
        let map = MaterialBaker.bake_materials(&mut host, &[proxy("m2")], "Project P: Model M");
        assert!(map.is_empty());
    }
}
