// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Scan session coordination and the plugin surface exposed to
// application shells.

pub mod coordinator;
mod pending;
pub mod plugin;

pub use coordinator::ScanCoordinator;
pub use pending::ScanState;
pub use plugin::{DocumentScannerPlugin, PLUGIN_VERSION};
