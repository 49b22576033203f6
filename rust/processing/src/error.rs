// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the send and receive pipelines.
//!
//! Per-object failures (resolution, conversion) never appear here; they are
//! captured in [`crate::ConversionResult`]s. Only what aborts an operation
//! does.

use thiserror::Error;

use crate::materializer::HostObjectBuilderResult;

/// Invalid or missing model card setting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown value '{value}' for setting '{setting}'")]
    UnknownValue { setting: String, value: String },

    #[error("Missing setting '{0}'")]
    MissingSetting(String),

    #[error("Setting '{setting}' must be a string, found {found}")]
    InvalidType { setting: String, found: String },

    #[error("Document has no {0} base point")]
    MissingBasePoint(&'static str),
}

/// Failure reported by a host document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Transaction '{0}' is already active")]
    TransactionActive(String),

    #[error("Host element not found: {0}")]
    NotFound(String),

    #[error("Host rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
}

impl HostError {
    pub fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
        HostError::Rejected {
            operation,
            message: message.into(),
        }
    }
}

/// A transaction scope could not be opened or committed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Failed to start transaction '{name}': {source}")]
    Start { name: String, source: HostError },

    #[error("Failed to commit transaction '{name}': {source}")]
    Commit { name: String, source: HostError },
}

/// Errors that abort a receive.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Main transaction failed: {0}")]
    HostTransaction(#[from] TransactionError),

    /// The operation was cancelled; objects baked before the cancellation
    /// were committed and are reported in the partial result.
    #[error("Receive cancelled after {} objects", .0.results.len())]
    Cancelled(Box<HostObjectBuilderResult>),
}

/// Errors that abort a send.
#[derive(Error, Debug)]
pub enum SendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Send cancelled")]
    Cancelled,

    #[error("Failed to convert all {0} objects")]
    NothingConverted(usize),

    #[error("Nothing to send: the selection is empty")]
    EmptySelection,

    #[error("Failed to finalize root object: {0}")]
    Core(#[from] rebake_core::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
