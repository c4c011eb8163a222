// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decodes a scanned page and re-encodes it as JPEG at a
// caller-chosen quality. Operates on in-memory images using the `image` crate.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, instrument};

use docscan_core::error::PageError;

/// A single decoded page held in memory.
///
/// The decoded pixels live exactly as long as the processor; dropping it
/// releases them.
///
/// ```ignore
/// let smaller = ImageProcessor::from_bytes(&jpeg)?.to_jpeg_bytes(70)?;
/// ```
pub struct ImageProcessor {
    /// The decoded image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PageError> {
        let img = image::load_from_memory(data).map_err(|err| PageError::Decode(err.into()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the image as JPEG bytes with the given quality.
    ///
    /// JPEG has no quality 0; values below 1 are encoded at 1. Alpha is
    /// discarded.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, PageError> {
        let quality = quality.clamp(1, 100);
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| PageError::Encode(err.into()))?;
        if buffer.is_empty() {
            return Err(PageError::Encode("encoder produced no output".into()));
        }
        debug!(quality, bytes = buffer.len(), "JPEG encoded");
        Ok(buffer)
    }
}

/// Decode `source` and re-encode it as JPEG at `quality`.
///
/// The decoded image is dropped before returning on every path.
pub fn recompress_jpeg(source: &[u8], quality: u8) -> Result<Vec<u8>, PageError> {
    let processor = ImageProcessor::from_bytes(source)?;
    processor.to_jpeg_bytes(quality)
}
