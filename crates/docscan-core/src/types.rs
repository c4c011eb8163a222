// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the document scanner plugin.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ScannerConfig;

/// Identifier of the bridge call that started a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How scanned pages are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseFormat {
    /// Base64-encoded JPEG bytes embedded in the response.
    Inline,
    /// Absolute path of a JPEG written to the host cache directory.
    #[default]
    FilePath,
}

impl ResponseFormat {
    /// Normalise a caller-supplied format name.
    ///
    /// Unknown or missing values fall back to [`ResponseFormat::FilePath`].
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("inline") | Some("base64") => Self::Inline,
            _ => Self::FilePath,
        }
    }
}

/// Interaction mode requested from the scanning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerMode {
    /// Detection plus user-adjustable crop and filters.
    Full,
    /// Detection only; the user cannot adjust the crop.
    Base,
}

/// Image container the engine is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFormat {
    Jpeg,
}

/// Raw options object received over the bridge.
///
/// Fields hold whatever the caller sent, before clamping. A field with the
/// wrong JSON type is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub quality: Option<i64>,
    pub response_format: Option<String>,
    pub page_limit: Option<i64>,
    pub allow_manual_crop: Option<bool>,
}

impl ScanOptions {
    /// Read options from a bridge JSON object. Accepts both the short option
    /// names and the plugin's historical ones (`croppedImageQuality`,
    /// `responseType`, `maxNumDocuments`, `letUserAdjustCrop`).
    pub fn from_json(value: &Value) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|name| value.get(*name));
        let int = |names: &[&str]| {
            field(names).and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        };

        Self {
            quality: int(&["quality", "croppedImageQuality"]),
            response_format: field(&["responseFormat", "responseType"])
                .and_then(Value::as_str)
                .map(str::to_owned),
            page_limit: int(&["pageLimit", "maxNumDocuments"]),
            allow_manual_crop: field(&["allowManualCrop", "letUserAdjustCrop"])
                .and_then(Value::as_bool),
        }
    }
}

/// A normalised scan request, one per bridge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub call_id: CallId,
    pub response_format: ResponseFormat,
    /// JPEG quality in `0..=100`. 100 means "hand back the engine's bytes".
    pub quality: u8,
    /// Maximum number of pages, in `1..=24`.
    pub page_limit: u8,
    pub allow_manual_crop: bool,
}

impl ScanRequest {
    pub const MAX_QUALITY: u8 = 100;
    pub const MAX_PAGE_LIMIT: u8 = 24;

    /// Clamp and default the raw options.
    pub fn new(call_id: CallId, options: &ScanOptions) -> Self {
        Self {
            call_id,
            response_format: ResponseFormat::normalize(options.response_format.as_deref()),
            quality: clamp_or_max(options.quality, 0, Self::MAX_QUALITY),
            page_limit: clamp_or_max(options.page_limit, 1, Self::MAX_PAGE_LIMIT),
            allow_manual_crop: options.allow_manual_crop.unwrap_or(true),
        }
    }

    pub fn scanner_mode(&self) -> ScannerMode {
        if self.allow_manual_crop {
            ScannerMode::Full
        } else {
            ScannerMode::Base
        }
    }

    /// Whether pages must be decoded and re-encoded before delivery.
    pub fn needs_recompression(&self) -> bool {
        self.quality < Self::MAX_QUALITY
    }
}

/// Missing values take the upper bound.
fn clamp_or_max(value: Option<i64>, min: u8, max: u8) -> u8 {
    match value {
        Some(v) => v.clamp(i64::from(min), i64::from(max)) as u8,
        None => max,
    }
}

/// What the scanning engine is asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerOptions {
    pub page_limit: u8,
    pub mode: ScannerMode,
    pub gallery_import_allowed: bool,
    pub result_format: ResultFormat,
}

impl ScannerOptions {
    pub fn for_request(request: &ScanRequest, config: &ScannerConfig) -> Self {
        Self {
            page_limit: request.page_limit,
            mode: request.scanner_mode(),
            gallery_import_allowed: config.allow_gallery_import,
            result_format: ResultFormat::Jpeg,
        }
    }
}

/// Terminal outcome reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    /// The user dismissed the scanner. Not an error.
    Cancel,
}

/// Successful response of a scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub status: ScanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ScanResult {
    pub fn success(images: Vec<String>) -> Self {
        Self {
            status: ScanStatus::Success,
            images: Some(images),
        }
    }

    pub fn cancel() -> Self {
        Self {
            status: ScanStatus::Cancel,
            images: None,
        }
    }
}

/// Result code attached to a finished scanner activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    Ok,
    Canceled,
}

/// Completion signal delivered by the host when the scanner UI closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub code: ResultCode,
    /// Engine payload; expected to parse as [`ScanPayload`].
    pub data: Option<Value>,
}

impl ActivityResult {
    pub fn ok(data: Value) -> Self {
        Self {
            code: ResultCode::Ok,
            data: Some(data),
        }
    }

    pub fn ok_without_data() -> Self {
        Self {
            code: ResultCode::Ok,
            data: None,
        }
    }

    pub fn canceled() -> Self {
        Self {
            code: ResultCode::Canceled,
            data: None,
        }
    }
}

/// Parsed engine payload: the ordered pages of a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    /// Missing or `null` means the engine finished with no pages.
    #[serde(default, deserialize_with = "pages_or_empty")]
    pub pages: Vec<PagePayload>,
}

fn pages_or_empty<'de, D>(deserializer: D) -> Result<Vec<PagePayload>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<PagePayload>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    #[serde(default)]
    pub image_uri: Option<String>,
}

impl ScanPayload {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Build a payload from a list of image URIs, in order.
    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: uris
                .into_iter()
                .map(|uri| PagePayload {
                    image_uri: Some(uri.into()),
                })
                .collect(),
        }
    }

    /// Number the pages in delivery order.
    pub fn into_pages(self) -> Vec<ScanPage> {
        self.pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| ScanPage {
                index,
                image_uri: page.image_uri,
            })
            .collect()
    }
}

/// One page of a completed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Zero-based position in the scan.
    pub index: usize,
    /// Handle to the engine's image bytes. `None` when the engine omitted it.
    pub image_uri: Option<String>,
}
