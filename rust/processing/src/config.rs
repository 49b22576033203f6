// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration loaded from environment variables.

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Resolve converters through the type fallback chain on send.
    pub allow_converter_fallback: bool,
    /// Reuse converted objects across sends of the same card.
    pub send_cache_enabled: bool,
    /// Paint render materials onto received solids.
    pub paint_materials: bool,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            allow_converter_fallback: env_flag("REBAKE_ALLOW_CONVERTER_FALLBACK", true),
            send_cache_enabled: env_flag("REBAKE_SEND_CACHE", true),
            paint_materials: env_flag("REBAKE_PAINT_MATERIALS", true),
            log_filter: std::env::var("REBAKE_LOG")
                .unwrap_or_else(|_| "info,rebake_processing=debug".into()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
