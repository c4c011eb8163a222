// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod rejection;
pub mod types;

pub use config::ScannerConfig;
pub use error::{CodecError, PageError, ScanError};
pub use rejection::{BridgeRejection, rejection_for};
pub use types::*;
