// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-object conversion outcomes, reported for send and receive.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionResult {
    #[serde(rename_all = "camelCase")]
    Success {
        source_id: String,
        source_type: String,
        /// Id of the created object (Base id on send, host id on receive).
        result_id: String,
        result_type: String,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        source_id: String,
        source_type: String,
        error: String,
    },
}

impl ConversionResult {
    pub fn success(
        source_id: impl Into<String>,
        source_type: impl Into<String>,
        result_id: impl Into<String>,
        result_type: impl Into<String>,
    ) -> Self {
        ConversionResult::Success {
            source_id: source_id.into(),
            source_type: source_type.into(),
            result_id: result_id.into(),
            result_type: result_type.into(),
        }
    }

    pub fn error(
        source_id: impl Into<String>,
        source_type: impl Into<String>,
        error: &dyn std::error::Error,
    ) -> Self {
        ConversionResult::Error {
            source_id: source_id.into(),
            source_type: source_type.into(),
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }

    pub fn source_id(&self) -> &str {
        match self {
            ConversionResult::Success { source_id, .. } | ConversionResult::Error { source_id, .. } => {
                source_id
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConversionResult::Error { error, .. } => Some(error),
            ConversionResult::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_status_tag() {
        let ok = ConversionResult::success("a", "Wall", "host-1", "Direct Shape");
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["resultId"], "host-1");

        let err = ConversionResult::error(
            "b",
            "Panel",
            &rebake_geometry::Error::validation("bad panel"),
        );
        assert!(!err.is_success());
        assert_eq!(err.source_id(), "b");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "ERROR");
        assert!(json["error"].as_str().unwrap().contains("bad panel"));
    }
}
