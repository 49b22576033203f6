// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter dependency graph with eager cycle detection.

use rustc_hash::{FxHashMap, FxHashSet};

use super::TypeTag;
use crate::error::RegistrationError;

pub(super) struct DependencyGraph<K: TypeTag> {
    edges: FxHashMap<K, FxHashSet<K>>,
}

impl<K: TypeTag> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self {
            edges: FxHashMap::default(),
        }
    }
}

impl<K: TypeTag> DependencyGraph<K> {
    /// Adds `from -> dep` for every dep, or nothing if any edge closes a cycle.
    pub(super) fn add_edges(&mut self, from: &K, deps: &[K]) -> Result<(), RegistrationError> {
        for dep in deps {
            if let Some(mut path) = self.path(dep, from) {
                path.insert(0, from.to_string());
                return Err(RegistrationError::Cycle { path });
            }
        }
        if !deps.is_empty() {
            self.edges
                .entry(from.clone())
                .or_default()
                .extend(deps.iter().cloned());
        }
        Ok(())
    }

    /// Depth-first search for a path `start ->* target`, as tag names.
    fn path(&self, start: &K, target: &K) -> Option<Vec<String>> {
        let mut visited = FxHashSet::default();
        let mut stack = vec![(start.clone(), vec![start.to_string()])];
        while let Some((node, path)) = stack.pop() {
            if &node == target {
                return Some(path);
            }
            if !visited.insert(node.clone()) {
                continue;
            }
            if let Some(next) = self.edges.get(&node) {
                for n in next {
                    let mut p = path.clone();
                    p.push(n.to_string());
                    stack.push((n.clone(), p));
                }
            }
        }
        None
    }
}
