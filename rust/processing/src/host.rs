// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process [`ReceiveHost`]
//!
//! Keeps shapes, groups and materials in memory with snapshot-based
//! transactions. Failures can be injected per operation to exercise the
//! materializer's isolation rules.

use rebake_geometry::HostShape;
use rustc_hash::FxHashMap;

use crate::error::HostError;
use crate::transaction::{HostId, ReceiveHost, RenderMaterial};

/// Operation that should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    /// Starting the transaction with this name.
    Start(String),
    /// Committing the transaction with this name.
    Commit(String),
    /// Inserting the shape built from this application id.
    Insert(String),
    Delete,
    CreateGroup,
    CreateMaterial,
    Paint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostGroup {
    pub name: String,
    pub members: Vec<HostId>,
}

#[derive(Debug, Clone, Default)]
struct State {
    shapes: FxHashMap<HostId, HostShape>,
    groups: FxHashMap<HostId, HostGroup>,
    materials: FxHashMap<HostId, RenderMaterial>,
    /// element id → material id
    paint: FxHashMap<HostId, HostId>,
}

/// Reference host document.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: State,
    /// Name and pre-transaction snapshot of the open transaction.
    open: Option<(String, State)>,
    next_id: u64,
    fail_points: Vec<FailPoint>,
    commits: Vec<String>,
    rollbacks: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&mut self, point: FailPoint) {
        self.fail_points.push(point);
    }

    fn fails(&self, point: &FailPoint) -> bool {
        self.fail_points.contains(point)
    }

    fn check_open(&self) -> Result<(), HostError> {
        match self.open {
            Some(_) => Ok(()),
            None => Err(HostError::NoActiveTransaction),
        }
    }

    fn allocate(&mut self, prefix: &str) -> HostId {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    pub fn shape_count(&self) -> usize {
        self.state.shapes.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&HostId, &HostGroup)> {
        self.state.groups.iter()
    }

    pub fn group_named(&self, name: &str) -> Option<&HostGroup> {
        self.state.groups.values().find(|g| g.name == name)
    }

    pub fn material(&self, id: &str) -> Option<&RenderMaterial> {
        self.state.materials.get(id)
    }

    pub fn material_count(&self) -> usize {
        self.state.materials.len()
    }

    pub fn painted_material(&self, element: &str) -> Option<&str> {
        self.state.paint.get(element).map(String::as_str)
    }

    /// Names of committed transactions, in order.
    pub fn commits(&self) -> &[String] {
        &self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }
}

impl ReceiveHost for MemoryHost {
    fn start_transaction(&mut self, name: &str) -> Result<(), HostError> {
        if let Some((open, _)) = &self.open {
            return Err(HostError::TransactionActive(open.clone()));
        }
        if self.fails(&FailPoint::Start(name.to_string())) {
            return Err(HostError::rejected("start", name));
        }
        self.open = Some((name.to_string(), self.state.clone()));
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), HostError> {
        let name = match &self.open {
            Some((name, _)) => name.clone(),
            None => return Err(HostError::NoActiveTransaction),
        };
        if self.fails(&FailPoint::Commit(name.clone())) {
            return Err(HostError::rejected("commit", name));
        }
        self.open = None;
        self.commits.push(name);
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        if let Some((_, snapshot)) = self.open.take() {
            self.state = snapshot;
            self.rollbacks += 1;
        }
    }

    fn insert_shape(&mut self, shape: HostShape) -> Result<HostId, HostError> {
        self.check_open()?;
        if self.fails(&FailPoint::Insert(shape.application_id.clone())) {
            return Err(HostError::rejected("insert", shape.application_id));
        }
        let id = self.allocate("shape");
        self.state.shapes.insert(id.clone(), shape);
        Ok(id)
    }

    fn shape(&self, id: &str) -> Option<&HostShape> {
        self.state.shapes.get(id)
    }

    fn delete(&mut self, id: &str) -> Result<(), HostError> {
        self.check_open()?;
        if self.fails(&FailPoint::Delete) {
            return Err(HostError::rejected("delete", id));
        }
        let found = self.state.shapes.remove(id).is_some()
            | self.state.groups.remove(id).is_some()
            | self.state.materials.remove(id).is_some();
        if !found {
            return Err(HostError::NotFound(id.to_string()));
        }
        self.state.paint.retain(|element, material| element != id && material != id);
        for group in self.state.groups.values_mut() {
            group.members.retain(|m| m != id);
        }
        Ok(())
    }

    fn find_groups(&self, prefix: &str) -> Vec<HostId> {
        let mut ids: Vec<HostId> = self
            .state
            .groups
            .iter()
            .filter(|(_, g)| g.name.starts_with(prefix))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn create_group(&mut self, name: &str, members: &[HostId]) -> Result<HostId, HostError> {
        self.check_open()?;
        if self.fails(&FailPoint::CreateGroup) {
            return Err(HostError::rejected("create group", name));
        }
        if let Some(missing) = members.iter().find(|m| {
            !self.state.shapes.contains_key(*m) && !self.state.groups.contains_key(*m)
        }) {
            return Err(HostError::NotFound(missing.clone()));
        }
        let id = self.allocate("group");
        self.state.groups.insert(
            id.clone(),
            HostGroup {
                name: name.to_string(),
                members: members.to_vec(),
            },
        );
        Ok(id)
    }

    fn find_materials(&self, pattern: &str) -> Vec<HostId> {
        let mut ids: Vec<HostId> = self
            .state
            .materials
            .iter()
            .filter(|(_, m)| m.name.contains(pattern))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn create_material(
        &mut self,
        name: &str,
        material: &RenderMaterial,
    ) -> Result<HostId, HostError> {
        self.check_open()?;
        if self.fails(&FailPoint::CreateMaterial) {
            return Err(HostError::rejected("create material", name));
        }
        let id = self.allocate("material");
        self.state.materials.insert(
            id.clone(),
            RenderMaterial {
                name: name.to_string(),
                ..material.clone()
            },
        );
        Ok(id)
    }

    fn paint(&mut self, element: &str, material: &str) -> Result<(), HostError> {
        self.check_open()?;
        if self.fails(&FailPoint::Paint) {
            return Err(HostError::rejected("paint", element));
        }
        let shape = self
            .state
            .shapes
            .get(element)
            .ok_or_else(|| HostError::NotFound(element.to_string()))?;
        if !shape.is_solid() {
            return Err(HostError::rejected("paint", format!("{element} is not a solid")));
        }
        if !self.state.materials.contains_key(material) {
            return Err(HostError::NotFound(material.to_string()));
        }
        self.state
            .paint
            .insert(element.to_string(), material.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> RenderMaterial {
        RenderMaterial {
            name: "red".into(),
            diffuse: 0xFFFF_0000,
            opacity: 1.0,
        }
    }

    #[test]
    fn nested_transactions_are_rejected() {
        let mut host = MemoryHost::new();
        host.start_transaction("a").unwrap();
        assert_eq!(
            host.start_transaction("b"),
            Err(HostError::TransactionActive("a".into()))
        );
    }

    #[test]
    fn delete_cleans_references() {
        let mut host = MemoryHost::new();
        host.start_transaction("t").unwrap();
        let material = host.create_material("red (p)", &red()).unwrap();
        let group = host.create_group("g", &[]).unwrap();
        assert_eq!(host.find_materials("(p)"), vec![material.clone()]);
        assert_eq!(host.find_groups("g"), vec![group.clone()]);

        host.delete(&material).unwrap();
        host.delete(&group).unwrap();
        assert_eq!(host.delete(&group), Err(HostError::NotFound(group)));
        host.commit_transaction().unwrap();
        assert_eq!(host.material_count(), 0);
        assert_eq!(host.commits(), ["t".to_string()]);
    }
}
