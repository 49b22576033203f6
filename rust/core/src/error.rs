// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the host document model.

use crate::keys::NativeId;
use thiserror::Error;

/// Result type alias for document model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a host document.
#[derive(Error, Debug)]
pub enum Error {
    /// An entity with the same native id is already stored in the document.
    #[error("duplicate native id: {0}")]
    DuplicateId(NativeId),

    /// A referenced entity was not found in the document.
    #[error("entity not found: {0}")]
    EntityNotFound(NativeId),

    /// A length unit string could not be recognised.
    #[error("unknown length unit: {0}")]
    UnknownUnit(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
