// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds where no scanning engine is wired in.
//
// Every call returns `PlatformUnavailable`, so a scan request fails cleanly
// with `LaunchFailed` instead of waiting for a result that never comes.

use docscan_core::error::{Result, ScanError};
use docscan_core::types::ScannerOptions;

use crate::traits::*;

/// No-op scanner returned when the host registers no engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubScanner;

impl DocumentScanner for StubScanner {
    fn engine_name(&self) -> &str {
        "Unavailable (stub)"
    }

    fn start_scan(&self, _options: &ScannerOptions, _surface: &HostSurface) -> Result<LaunchToken> {
        tracing::warn!("DocumentScanner::start_scan called on stub scanner");
        Err(ScanError::PlatformUnavailable)
    }
}

impl ActivityLauncher for StubScanner {
    fn launch(&self, _token: LaunchToken) -> Result<()> {
        tracing::warn!("ActivityLauncher::launch called on stub scanner");
        Err(ScanError::PlatformUnavailable)
    }
}
