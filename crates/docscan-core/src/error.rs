// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docscan.

use thiserror::Error;

/// Top-level error type for all scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Request admission --
    #[error("document scanner is not ready")]
    NotReady,

    #[error("another scan is in progress")]
    Busy,

    #[error("no host surface is available to present the scanner")]
    NoHostContext,

    #[error("unable to start document scanner: {0}")]
    LaunchFailed(String),

    // -- Activity result --
    #[error("document scanner returned no data")]
    NoData,

    #[error("unable to parse document scan result: {0}")]
    UnparsableResult(String),

    #[error("failed to process scanned page {index}: {source}")]
    PageProcessingFailed {
        index: usize,
        #[source]
        source: PageError,
    },

    #[error("scan was abandoned before a result was delivered")]
    Abandoned,

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Underlying codec failure, kept as the error's source.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while turning one scanned page into its response representation.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("unable to read scanned image: {0}")]
    Read(#[source] std::io::Error),

    #[error("unable to decode scanned image: {0}")]
    Decode(#[source] CodecError),

    #[error("unable to compress scanned image: {0}")]
    Encode(#[source] CodecError),

    #[error("unable to save scanned image: {0}")]
    Write(#[source] std::io::Error),
}

impl ScanError {
    /// Wrap a page failure with the index of the page that produced it.
    pub fn page(index: usize, source: PageError) -> Self {
        Self::PageProcessingFailed { index, source }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
