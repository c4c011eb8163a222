// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge-facing plugin surface.
//
// Application shells call in with a method name and loosely typed JSON
// arguments and get back either a JSON value or a `BridgeRejection`.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use docscan_core::error::ScanError;
use docscan_core::rejection::{BridgeRejection, rejection_for};
use docscan_core::types::{ActivityResult, CallId, ScanOptions, ScanRequest};

use crate::coordinator::ScanCoordinator;

/// Version reported by `getVersion`.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct DocumentScannerPlugin {
    coordinator: Arc<ScanCoordinator>,
}

impl DocumentScannerPlugin {
    pub fn new(coordinator: Arc<ScanCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<ScanCoordinator> {
        &self.coordinator
    }

    /// `scanDocument`: run one scan and return the serialized `ScanResult`.
    pub async fn scan_document(&self, options: &Value) -> Result<Value, BridgeRejection> {
        let request = ScanRequest::new(CallId::new(), &ScanOptions::from_json(options));
        debug!(call_id = %request.call_id, ?options, "scanDocument");
        let result = self
            .coordinator
            .request_scan(request)
            .await
            .map_err(|e| rejection_for(&e))?;
        serde_json::to_value(result).map_err(|e| rejection_for(&ScanError::from(e)))
    }

    /// `getVersion`: `{ "version": "<semver>" }`.
    pub fn get_version(&self) -> Value {
        json!({ "version": PLUGIN_VERSION })
    }

    /// Forward the scanner activity's result from the host.
    pub fn handle_activity_result(&self, result: ActivityResult) {
        self.coordinator.handle_scan_result(result);
    }

    /// Host teardown: any outstanding scan resolves with `ABANDONED`.
    pub fn handle_on_destroy(&self) {
        self.coordinator.abandon();
    }

    /// Dispatch a bridge call by method name.
    pub async fn call(&self, method: &str, args: &Value) -> Result<Value, BridgeRejection> {
        match method {
            "scanDocument" => self.scan_document(args).await,
            "getVersion" | "getPluginVersion" => Ok(self.get_version()),
            other => {
                warn!(method = other, "unknown plugin method");
                Err(rejection_for(&ScanError::Bridge(format!(
                    "unknown method {other}"
                ))))
            }
        }
    }
}
