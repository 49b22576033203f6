// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// No converter could be resolved for a type tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no converter registered for type {type_name}")]
    NoConverter { type_name: String },

    #[error("no converter registered for type {type_name} or any of its fallbacks")]
    NoFallback { type_name: String },
}

/// Registration rejected at start-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The converter's dependencies lead back to its own type.
    #[error("converter dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// Errors that can occur while converting a single object
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("object {0} has no convertible geometry")]
    MissingGeometry(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("core model error: {0}")]
    Core(#[from] rebake_core::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Error::Conversion(msg.into())
    }
}
