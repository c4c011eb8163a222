// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge — stands in for the mobile scanning engine on desktop and CI.
//
// `DirectoryScanner` treats a folder of images as the pages a user just
// scanned: launching it lists the folder and delivers the `ActivityResult`
// through a Tokio channel, the same way a mobile host forwards the scanner
// activity's result. `DesktopHost` supplies the cache directory and reads
// `file://` page URIs from disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info};

use docscan_core::error::{Result, ScanError};
use docscan_core::types::{ActivityResult, ScanPayload, ScannerOptions};

use crate::traits::*;

/// Extensions picked up as scanned pages. The engine contract is JPEG output,
/// so other image files in the folder are skipped.
const PAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

// ---------------------------------------------------------------------------
// URIs
// ---------------------------------------------------------------------------

/// Render a path as a `file://` URI.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Accept both `file://` URIs and bare paths.
pub fn path_from_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Desktop host: one always-present surface and an on-disk cache directory.
#[derive(Debug, Clone)]
pub struct DesktopHost {
    cache_dir: Option<PathBuf>,
    surface: Option<HostSurface>,
}

impl DesktopHost {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
            surface: Some(HostSurface::new("desktop")),
        }
    }

    /// A host whose window is gone, e.g. during shutdown.
    pub fn without_surface(mut self) -> Self {
        self.surface = None;
        self
    }

    /// A host that exposes no cache directory.
    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }
}

impl HostContext for DesktopHost {
    fn surface(&self) -> Option<HostSurface> {
        self.surface.clone()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone()
    }

    fn open_page(&self, uri: &str) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(path_from_uri(uri))?;
        Ok(Box::new(file))
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Scanner that "scans" the images already present in a folder.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    pages_dir: PathBuf,
    results: mpsc::UnboundedSender<ActivityResult>,
}

impl DirectoryScanner {
    /// Create a scanner and the receiving end of its activity results.
    ///
    /// The host must forward every received result to the coordinator.
    pub fn channel(pages_dir: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<ActivityResult>) {
        let (results, rx) = mpsc::unbounded_channel();
        let scanner = Self {
            pages_dir: pages_dir.into(),
            results,
        };
        (scanner, rx)
    }

    /// Image files in name order, at most `limit` of them.
    fn list_pages(&self, limit: usize) -> Result<Vec<PathBuf>> {
        let mut pages = Vec::new();
        for entry in std::fs::read_dir(&self.pages_dir)? {
            let path = entry?.path();
            let is_page = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_page {
                pages.push(path);
            }
        }
        pages.sort();
        pages.truncate(limit);
        Ok(pages)
    }
}

impl DocumentScanner for DirectoryScanner {
    fn engine_name(&self) -> &str {
        "Directory"
    }

    fn start_scan(&self, options: &ScannerOptions, surface: &HostSurface) -> Result<LaunchToken> {
        if !self.pages_dir.is_dir() {
            return Err(ScanError::Bridge(format!(
                "pages directory {} does not exist",
                self.pages_dir.display()
            )));
        }
        debug!(surface = %surface.name, dir = %self.pages_dir.display(), "directory scan prepared");
        Ok(LaunchToken {
            handle: self.pages_dir.display().to_string(),
            options: options.clone(),
        })
    }
}

impl ActivityLauncher for DirectoryScanner {
    fn launch(&self, token: LaunchToken) -> Result<()> {
        let pages = self.list_pages(usize::from(token.options.page_limit))?;
        info!(pages = pages.len(), dir = %token.handle, "directory scan finished");

        // An empty folder behaves like a user backing out of the scanner.
        let result = if pages.is_empty() {
            ActivityResult::canceled()
        } else {
            let payload = ScanPayload::from_uris(pages.iter().map(|p| file_uri(p)));
            ActivityResult::ok(serde_json::to_value(payload)?)
        };

        self.results
            .send(result)
            .map_err(|_| ScanError::Bridge("activity result receiver dropped".into()))
    }
}
