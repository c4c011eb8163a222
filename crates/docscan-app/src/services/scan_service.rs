// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan service — wires the desktop bridge to the plugin.
//
// The directory scanner delivers its activity result on a channel; a
// forwarding task hands every result to the plugin, which is what a mobile
// host does from its activity-result callback. Settling a scan decodes,
// recompresses and writes pages synchronously, so it runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use docscan_bridge::{DesktopHost, DirectoryScanner};
use docscan_core::config::ScannerConfig;
use docscan_core::rejection::BridgeRejection;
use docscan_plugin::{DocumentScannerPlugin, ScanCoordinator};

pub struct ScanService {
    plugin: Arc<DocumentScannerPlugin>,
    forwarder: JoinHandle<()>,
    cache_dir: PathBuf,
}

impl ScanService {
    /// Build the service around `pages_dir`. Must be called inside a Tokio runtime.
    pub fn start(pages_dir: &Path, cache_dir: PathBuf, config: ScannerConfig) -> Self {
        info!(
            pages = %pages_dir.display(),
            cache = %cache_dir.display(),
            "initialising scan service"
        );

        let (scanner, mut results) = DirectoryScanner::channel(pages_dir);
        let scanner = Arc::new(scanner);
        let host = Arc::new(DesktopHost::new(cache_dir.clone()));

        let coordinator = ScanCoordinator::new(scanner.clone(), host, config);
        coordinator.register_launcher(scanner);
        let plugin = Arc::new(DocumentScannerPlugin::new(Arc::new(coordinator)));

        let sink = Arc::clone(&plugin);
        let forwarder = tokio::spawn(async move {
            while let Some(result) = results.recv().await {
                debug!(code = ?result.code, "forwarding activity result");
                let plugin = Arc::clone(&sink);
                let settled =
                    tokio::task::spawn_blocking(move || plugin.handle_activity_result(result)).await;
                if let Err(e) = settled {
                    warn!(error = %e, "activity result handler did not complete");
                }
            }
        });

        Self {
            plugin,
            forwarder,
            cache_dir,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub async fn scan(&self, options: &Value) -> Result<Value, BridgeRejection> {
        self.plugin.call("scanDocument", options).await
    }
}

impl Drop for ScanService {
    fn drop(&mut self) {
        self.plugin.handle_on_destroy();
        self.forwarder.abort();
    }
}
