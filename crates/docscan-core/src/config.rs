// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Persistent scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Subdirectory of the host cache directory that receives page files.
    pub cache_subdir: String,
    /// Prefix of page file names (`<prefix>_<index>_<millis>.jpg`).
    pub file_prefix: String,
    /// Let the engine import existing photos instead of using the camera.
    pub allow_gallery_import: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cache_subdir: "document_scanner".into(),
            file_prefix: "DOCUMENT_SCAN".into(),
            allow_gallery_import: false,
        }
    }
}

impl ScannerConfig {
    /// Load settings from a JSON file, or defaults if it is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no scanner config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid scanner config, using defaults");
                Self::default()
            }
        }
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
