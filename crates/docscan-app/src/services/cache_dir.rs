// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware cache directory resolution.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "docscan";

/// Return the application cache directory.
///
/// An explicit override wins; otherwise the conventional per-user cache
/// location is used. On mobile the host bridge supplies its own cache dir.
pub fn cache_dir(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => resolve(
            std::env::var_os("XDG_CACHE_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        ),
    }
}

/// Settings file read when no `--config` is given.
pub fn default_config_path(cache: &Path) -> PathBuf {
    cache.join("config.json")
}

fn resolve(xdg_cache: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg_cache
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);
    base.join(APP_DIR)
}
