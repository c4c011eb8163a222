// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge rejections — the structured failure handed back to the application
// shell when a scan call does not resolve.
//
// Every `ScanError` maps to a stable machine-readable code, a sentence the
// shell can show as-is, and the underlying cause when there is one.

use serde::{Deserialize, Serialize};

use crate::error::{PageError, ScanError};

/// Rejection payload sent across the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRejection {
    /// Upper-snake error code, e.g. `BUSY`.
    pub code: String,
    /// Plain sentence describing what went wrong.
    pub message: String,
    /// Lower-level detail, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Whether issuing the same call again may succeed.
    pub retriable: bool,
}

impl BridgeRejection {
    fn new(code: &str, message: &str, retriable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            cause: None,
            retriable,
        }
    }

    fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl std::fmt::Display for BridgeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({}: {})", self.message, self.code, cause),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

/// Convert a `ScanError` into the rejection the caller receives.
pub fn rejection_for(err: &ScanError) -> BridgeRejection {
    match err {
        ScanError::NotReady => {
            BridgeRejection::new("NOT_READY", "Document scanner is not ready.", false)
        }

        ScanError::Busy => {
            BridgeRejection::new("BUSY", "Another scan is in progress.", true)
        }

        ScanError::NoHostContext => BridgeRejection::new(
            "NO_HOST_CONTEXT",
            "No screen is available to show the document scanner.",
            true,
        ),

        ScanError::LaunchFailed(detail) => BridgeRejection::new(
            "LAUNCH_FAILED",
            "Unable to start document scanner.",
            true,
        )
        .with_cause(detail.clone()),

        ScanError::NoData => {
            BridgeRejection::new("NO_DATA", "Document scanner returned no data.", true)
        }

        ScanError::UnparsableResult(detail) => BridgeRejection::new(
            "UNPARSABLE_RESULT",
            "Unable to parse document scan result.",
            false,
        )
        .with_cause(detail.clone()),

        ScanError::PageProcessingFailed { index, source } => BridgeRejection::new(
            "PAGE_PROCESSING_FAILED",
            "Failed to process scanned images.",
            page_is_retriable(source),
        )
        .with_cause(format!("page {index}: {source}")),

        ScanError::Abandoned => BridgeRejection::new(
            "ABANDONED",
            "The scan ended before a result was delivered.",
            true,
        ),

        ScanError::Bridge(detail) => BridgeRejection::new(
            "BRIDGE",
            "A device-specific feature didn't work.",
            true,
        )
        .with_cause(detail.clone()),

        ScanError::PlatformUnavailable => BridgeRejection::new(
            "UNAVAILABLE",
            "Document scanning is not supported on this device.",
            false,
        ),

        ScanError::Io(e) => {
            BridgeRejection::new("IO", "There was a problem reading or writing a file.", true)
                .with_cause(e.to_string())
        }

        ScanError::Serialization(e) => {
            BridgeRejection::new("SERIALIZATION", "The scanner had an internal data problem.", false)
                .with_cause(e.to_string())
        }
    }
}

/// Undecodable pages stay undecodable; I/O trouble may clear up.
fn page_is_retriable(err: &PageError) -> bool {
    matches!(err, PageError::Read(_) | PageError::Write(_))
}
