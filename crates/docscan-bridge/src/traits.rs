// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the scanning seams.
//
// A scan crosses three host-owned pieces: the vision engine that hands out a
// launch token, the launcher that presents the engine's UI, and the host
// context that owns the screen, the cache directory and page storage. The
// result of the UI comes back separately, as an `ActivityResult` delivered to
// the coordinator.

use std::io::Read;
use std::path::PathBuf;

use docscan_core::error::Result;
use docscan_core::types::ScannerOptions;

/// Host-provided document scanning engine.
pub trait DocumentScanner: Send + Sync {
    /// Human-readable engine name (e.g. "ML Kit", "Directory").
    fn engine_name(&self) -> &str;

    /// Prepare the engine UI for `options` on `surface`.
    ///
    /// Returns the token the launcher needs to present the UI. An error here
    /// means the scan never started.
    fn start_scan(&self, options: &ScannerOptions, surface: &HostSurface) -> Result<LaunchToken>;
}

/// Presents the engine UI. The outcome is delivered later as an
/// `ActivityResult`, never as the return value of `launch`.
pub trait ActivityLauncher: Send + Sync {
    fn launch(&self, token: LaunchToken) -> Result<()>;
}

/// Services the host application owns.
pub trait HostContext: Send + Sync {
    /// The surface the scanner UI would be shown on, if one is active.
    fn surface(&self) -> Option<HostSurface>;

    /// Root of the process-local cache directory, if the host has one.
    fn cache_dir(&self) -> Option<PathBuf>;

    /// Open the bytes behind an engine image URI.
    fn open_page(&self, uri: &str) -> std::io::Result<Box<dyn Read + Send>>;
}

// ---------------------------------------------------------------------------
// Handles passed across the seams
// ---------------------------------------------------------------------------

/// The foreground surface (activity, view controller, window) hosting the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSurface {
    pub name: String,
}

impl HostSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Engine-issued handle that starts the scanner UI when launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchToken {
    /// Engine-specific reference (intent sender id, folder path, ...).
    pub handle: String,
    /// Options the engine accepted for this launch.
    pub options: ScannerOptions,
}
