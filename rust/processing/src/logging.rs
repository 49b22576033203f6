// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracing subscriber setup for connector processes.

use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

/// Installs a global `fmt` subscriber. `RUST_LOG` wins over the configured
/// default filter. Returns `false` if a subscriber was already installed.
pub fn init(config: &EngineConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        let config = EngineConfig {
            log_filter: "warn".into(),
            ..EngineConfig::default()
        };
        init(&config);
        assert!(!init(&config));
        tracing::warn!(test = "logging", "subscriber installed");
    }
}
