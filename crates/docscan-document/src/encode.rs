// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page encoder — turns the raw bytes of one scanned page into the string the
// caller asked for: base64 text, or the absolute path of a JPEG file in the
// host cache.

use std::io::Read;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use tracing::{debug, instrument};

use docscan_core::error::PageError;
use docscan_core::types::ResponseFormat;

use crate::image::processor::recompress_jpeg;

/// Quality at which engine bytes are passed through untouched.
const PASSTHROUGH_QUALITY: u8 = 100;

/// Default page file prefix, matching `ScannerConfig::default()`.
const DEFAULT_FILE_PREFIX: &str = "DOCUMENT_SCAN";

/// Stateless per-scan page encoder.
///
/// One encoder is built per completed scan from the pending request's
/// quality and response format, then applied to every page in order.
#[derive(Debug, Clone)]
pub struct PageEncoder {
    quality: u8,
    format: ResponseFormat,
    /// Directory receiving page files. Only used for `ResponseFormat::FilePath`.
    output_dir: Option<PathBuf>,
    file_prefix: String,
}

impl PageEncoder {
    pub fn new(quality: u8, format: ResponseFormat) -> Self {
        Self {
            quality: quality.min(PASSTHROUGH_QUALITY),
            format,
            output_dir: None,
            file_prefix: DEFAULT_FILE_PREFIX.into(),
        }
    }

    /// Directory that page files are written to; created on first write.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode one page read from `source`.
    #[instrument(skip(self, source), fields(quality = self.quality, format = ?self.format))]
    pub fn encode(&self, source: impl Read, index: usize) -> Result<String, PageError> {
        let mut bytes = read_all(source)?;
        if self.quality < PASSTHROUGH_QUALITY {
            bytes = recompress_jpeg(&bytes, self.quality)?;
        }

        match self.format {
            ResponseFormat::Inline => {
                let encoded = STANDARD.encode(&bytes);
                debug!(index, bytes = bytes.len(), base64_len = encoded.len(), "page encoded inline");
                Ok(encoded)
            }
            ResponseFormat::FilePath => {
                let path = self.write_page(&bytes, index)?;
                debug!(index, path = %path.display(), "page written");
                Ok(path.to_string_lossy().into_owned())
            }
        }
    }

    /// Persist page bytes as `<prefix>_<index>_<unix millis>.jpg`.
    fn write_page(&self, bytes: &[u8], index: usize) -> Result<PathBuf, PageError> {
        let dir = self.output_dir.as_deref().ok_or_else(|| {
            PageError::Write(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "cache directory unavailable",
            ))
        })?;
        std::fs::create_dir_all(dir).map_err(PageError::Write)?;

        let file_name = format!(
            "{}_{}_{}.jpg",
            self.file_prefix,
            index,
            Utc::now().timestamp_millis()
        );
        let path = absolute(&dir.join(file_name))?;
        std::fs::write(&path, bytes).map_err(PageError::Write)?;
        Ok(path)
    }
}

/// Drain a page source completely.
pub fn read_all(mut source: impl Read) -> Result<Vec<u8>, PageError> {
    let mut buffer = Vec::new();
    source.read_to_end(&mut buffer).map_err(PageError::Read)?;
    Ok(buffer)
}

fn absolute(path: &Path) -> Result<PathBuf, PageError> {
    std::path::absolute(path).map_err(PageError::Write)
}
