// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter Registry - dispatch to typed converters
//!
//! Routes objects to the converter registered for their runtime type tag.
//! Each tag holds a ranked list of converters (highest rank wins). When a tag
//! has no registration, resolution can walk the tag's fallback chain (base
//! class / capability match).

mod graph;

#[cfg(test)]
mod tests;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rebake_core::{EntityKind, BASE_TYPE};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{RegistrationError, ResolutionError};
use graph::DependencyGraph;

/// A runtime type tag converters are registered under.
pub trait TypeTag: Clone + Eq + Hash + fmt::Display {
    /// The next more general tag, if any.
    fn fallback(&self) -> Option<Self>;
}

impl TypeTag for EntityKind {
    fn fallback(&self) -> Option<Self> {
        self.parent()
    }
}

/// A Base `speckle_type` chain, e.g. `Objects.Geometry.Line` or
/// `Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeckleType(String);

impl SpeckleType {
    pub fn new(chain: impl Into<String>) -> Self {
        Self(chain.into())
    }

    pub fn base() -> Self {
        Self(BASE_TYPE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TypeTag for SpeckleType {
    /// Drops the most derived segment; every chain ends at `Base`.
    fn fallback(&self) -> Option<Self> {
        match self.0.rsplit_once(':') {
            Some((parent, _)) => Some(SpeckleType(parent.to_string())),
            None if self.0 != BASE_TYPE => Some(SpeckleType::base()),
            None => None,
        }
    }
}

impl fmt::Display for SpeckleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeckleType {
    fn from(s: &str) -> Self {
        SpeckleType::new(s)
    }
}

struct Ranked<C: ?Sized> {
    rank: i32,
    converter: Arc<C>,
}

/// Registry mapping type tags to ranked converters.
///
/// `C` is the converter capability, usually a trait object such as
/// `dyn ToSpeckleConverter`.
pub struct ConverterRegistry<K: TypeTag, C: ?Sized> {
    converters: FxHashMap<K, SmallVec<[Ranked<C>; 2]>>,
    dependencies: DependencyGraph<K>,
}

impl<K: TypeTag, C: ?Sized> ConverterRegistry<K, C> {
    pub fn new() -> Self {
        Self {
            converters: FxHashMap::default(),
            dependencies: DependencyGraph::default(),
        }
    }

    /// Register a converter for `tag` at `rank`.
    ///
    /// `depends_on` lists the tags this converter resolves while converting.
    /// A registration that would make a tag (transitively) depend on itself
    /// is rejected and leaves the registry unchanged.
    pub fn register(
        &mut self,
        tag: K,
        rank: i32,
        depends_on: &[K],
        converter: Arc<C>,
    ) -> Result<(), RegistrationError> {
        self.dependencies.add_edges(&tag, depends_on)?;

        let entries = self.converters.entry(tag).or_default();
        let pos = entries
            .iter()
            .position(|r| r.rank < rank)
            .unwrap_or(entries.len());
        entries.insert(pos, Ranked { rank, converter });
        Ok(())
    }

    /// Resolve the converter for `tag`.
    ///
    /// With `allow_fallback`, walks [`TypeTag::fallback`] until a registered
    /// tag is found.
    pub fn resolve(&self, tag: &K, allow_fallback: bool) -> Result<Arc<C>, ResolutionError> {
        if let Some(found) = self.best(tag) {
            return Ok(found);
        }
        if !allow_fallback {
            return Err(ResolutionError::NoConverter {
                type_name: tag.to_string(),
            });
        }

        let mut current = tag.fallback();
        while let Some(candidate) = current {
            if let Some(found) = self.best(&candidate) {
                return Ok(found);
            }
            current = candidate.fallback();
        }
        Err(ResolutionError::NoFallback {
            type_name: tag.to_string(),
        })
    }

    /// Whether a converter is registered for exactly this tag.
    pub fn contains(&self, tag: &K) -> bool {
        self.converters.get(tag).is_some_and(|v| !v.is_empty())
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    fn best(&self, tag: &K) -> Option<Arc<C>> {
        self.converters
            .get(tag)
            .and_then(|entries| entries.first())
            .map(|r| Arc::clone(&r.converter))
    }
}

impl<K: TypeTag, C: ?Sized> Default for ConverterRegistry<K, C> {
    fn default() -> Self {
        Self::new()
    }
}
