// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity types for host entities and documents.
//!
//! Entities are stored in a `slotmap::SlotMap` and addressed by
//! [`EntityKey`] inside one document. Across documents, sessions and the
//! conversion cache they are addressed by their host-assigned [`NativeId`].

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Arena key of an entity inside a [`crate::HostDocument`].
    pub struct EntityKey;
}

/// Host-assigned identity of an entity (Revit UniqueId, AutoCAD handle, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeId(String);

impl NativeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NativeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NativeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NativeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a host document.
///
/// Atomic objects carry this instead of a reference so the engine never
/// extends the lifetime of a document it did not create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Allocates a process-unique document id.
    pub fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}
