// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduling bridge to the host's exclusive execution context.
//!
//! Host document APIs are not reentrant. Everything that touches host state
//! runs through [`HostThread::run_on_host`]; connectors implement it by
//! marshaling onto the host's API thread. The engine itself never spawns.

use std::future::Future;

pub trait HostThread {
    /// Runs `work` on the host context and resolves to its result.
    fn run_on_host<F, R>(&self, work: F) -> impl Future<Output = R>
    where
        F: FnOnce() -> R;
}

/// Runs work inline on the calling task. For hosts whose API is callable from
/// wherever the engine runs, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentThread;

impl HostThread for CurrentThread {
    fn run_on_host<F, R>(&self, work: F) -> impl Future<Output = R>
    where
        F: FnOnce() -> R,
    {
        async move { work() }
    }
}
