// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document — Page handling for the document scanner.
//
// Provides JPEG recompression of scanned pages and the page encoder that turns
// each page into either inline base64 text or a file in the host cache.

pub mod encode;
pub mod image;

// Re-export the primary structs so callers can use `docscan_document::PageEncoder` etc.
pub use encode::PageEncoder;
pub use crate::image::processor::ImageProcessor;
