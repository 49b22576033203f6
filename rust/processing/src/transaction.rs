// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receive host capabilities and transaction scopes
//!
//! [`ReceiveHost`] is what the materializer needs from a host document.
//! [`TransactionScope`] wraps one host transaction: it is started on
//! creation, committed explicitly, and rolled back on drop if it was not
//! committed, whichever way the enclosing code exits.

use rebake_geometry::HostShape;

use crate::error::{HostError, TransactionError};

/// Identifier of an element, group or material in the host document.
pub type HostId = String;

/// Colour and opacity of a render material.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMaterial {
    pub name: String,
    /// ARGB
    pub diffuse: u32,
    pub opacity: f64,
}

/// Host document operations used while receiving.
///
/// Writes are only valid inside a transaction.
pub trait ReceiveHost {
    fn start_transaction(&mut self, name: &str) -> Result<(), HostError>;
    fn commit_transaction(&mut self) -> Result<(), HostError>;
    fn rollback_transaction(&mut self);

    /// Inserts a shape and returns its host id.
    fn insert_shape(&mut self, shape: HostShape) -> Result<HostId, HostError>;
    fn shape(&self, id: &str) -> Option<&HostShape>;

    /// Deletes an element, group or material.
    fn delete(&mut self, id: &str) -> Result<(), HostError>;

    /// Groups whose name starts with `prefix`.
    fn find_groups(&self, prefix: &str) -> Vec<HostId>;
    fn create_group(&mut self, name: &str, members: &[HostId]) -> Result<HostId, HostError>;

    /// Materials whose name contains `pattern`.
    fn find_materials(&self, pattern: &str) -> Vec<HostId>;
    fn create_material(&mut self, name: &str, material: &RenderMaterial)
        -> Result<HostId, HostError>;

    /// Paints every face of a solid shape with a material.
    fn paint(&mut self, element: &str, material: &str) -> Result<(), HostError>;
}

/// Stages of one receive, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildStage {
    #[default]
    Idle,
    PreClean,
    Main,
    PostProcess,
    Done,
}

impl BuildStage {
    /// The following stage; `Done` stays `Done`.
    pub fn next(self) -> Self {
        match self {
            BuildStage::Idle => BuildStage::PreClean,
            BuildStage::PreClean => BuildStage::Main,
            BuildStage::Main => BuildStage::PostProcess,
            BuildStage::PostProcess | BuildStage::Done => BuildStage::Done,
        }
    }

    /// Name of the host transaction opened by the stage.
    pub fn transaction_name(self, project_name: &str) -> Option<String> {
        match self {
            BuildStage::PreClean => Some("Pre-receive clean".to_string()),
            BuildStage::Main => Some(format!("Received data from {project_name}")),
            BuildStage::PostProcess => Some("Creating group".to_string()),
            BuildStage::Idle | BuildStage::Done => None,
        }
    }
}

/// An open host transaction, rolled back on drop unless committed.
pub struct TransactionScope<'h, H: ReceiveHost + ?Sized> {
    host: &'h mut H,
    name: String,
    committed: bool,
}

impl<'h, H: ReceiveHost + ?Sized> TransactionScope<'h, H> {
    pub fn start(host: &'h mut H, name: impl Into<String>) -> Result<Self, TransactionError> {
        let name = name.into();
        host.start_transaction(&name)
            .map_err(|source| TransactionError::Start {
                name: name.clone(),
                source,
            })?;
        tracing::debug!(transaction = %name, "transaction started");
        Ok(Self {
            host,
            name,
            committed: false,
        })
    }

    pub fn host(&mut self) -> &mut H {
        self.host
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commits the transaction. On failure the scope rolls back when dropped.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        let _span = tracing::debug_span!("commit", transaction = %self.name).entered();
        match self.host.commit_transaction() {
            Ok(()) => {
                self.committed = true;
                Ok(())
            }
            Err(source) => Err(TransactionError::Commit {
                name: self.name.clone(),
                source,
            }),
        }
    }
}

impl<H: ReceiveHost + ?Sized> Drop for TransactionScope<'_, H> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::warn!(transaction = %self.name, "rolling back uncommitted transaction");
            self.host.rollback_transaction();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FailPoint, MemoryHost};
    use rebake_core::{Geometry, Point3};

    fn shape(id: &str) -> HostShape {
        HostShape {
            application_id: id.to_string(),
            name: id.to_string(),
            category: "Generic Models".into(),
            geometry: vec![Geometry::Point {
                location: Point3::origin(),
            }],
        }
    }

    #[test]
    fn stages_advance_in_order() {
        let mut stage = BuildStage::default();
        let mut seen = vec![stage];
        while stage != BuildStage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                BuildStage::Idle,
                BuildStage::PreClean,
                BuildStage::Main,
                BuildStage::PostProcess,
                BuildStage::Done
            ]
        );
        assert_eq!(
            BuildStage::Main.transaction_name("Tower").as_deref(),
            Some("Received data from Tower")
        );
    }

    #[test]
    fn committed_scope_keeps_changes() {
        let mut host = MemoryHost::new();
        let mut scope = TransactionScope::start(&mut host, "t").unwrap();
        scope.host().insert_shape(shape("a")).unwrap();
        scope.commit().unwrap();
        assert_eq!(host.shape_count(), 1);
    }

    #[test]
    fn dropped_scope_rolls_back() {
        let mut host = MemoryHost::new();
        {
            let mut scope = TransactionScope::start(&mut host, "t").unwrap();
            scope.host().insert_shape(shape("a")).unwrap();
        }
        assert_eq!(host.shape_count(), 0);
        assert_eq!(host.rollbacks(), 1);
    }

    #[test]
    fn failed_commit_rolls_back() {
        let mut host = MemoryHost::new();
        host.fail_on(FailPoint::Commit("t".into()));
        let mut scope = TransactionScope::start(&mut host, "t").unwrap();
        scope.host().insert_shape(shape("a")).unwrap();
        let err = scope.commit().unwrap_err();
        assert!(matches!(err, TransactionError::Commit { .. }));
        assert_eq!(host.shape_count(), 0);
    }

    #[test]
    fn writes_outside_transaction_are_rejected() {
        let mut host = MemoryHost::new();
        assert_eq!(
            host.insert_shape(shape("a")),
            Err(HostError::NoActiveTransaction)
        );
    }
}
