// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session coordinator.
//
// Owns the single pending scan: admits a request, asks the engine for a
// launch token, presents the scanner UI, and turns the one activity result
// that comes back into the caller's response.
//
//   Idle -> Launching -> AwaitingResult -> Settling -> Idle
//              |                                        ^
//              +------------ launch failure ------------+

use std::sync::{Arc, OnceLock};

use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use docscan_bridge::traits::{ActivityLauncher, DocumentScanner, HostContext};
use docscan_core::config::ScannerConfig;
use docscan_core::error::{PageError, Result, ScanError};
use docscan_core::types::{
    ActivityResult, CallId, ResultCode, ScanPage, ScanPayload, ScanRequest, ScanResult,
    ScannerOptions,
};
use docscan_document::PageEncoder;

use crate::pending::{PendingSlot, ScanState, Settlement};

/// Coordinates at most one in-flight scan.
///
/// Share it behind an `Arc`: `request_scan` is awaited by the bridge call
/// while the host delivers `handle_scan_result` from whichever thread it
/// receives the scanner activity's result on.
pub struct ScanCoordinator {
    scanner: Arc<dyn DocumentScanner>,
    host: Arc<dyn HostContext>,
    /// Registered once when the host is ready to present activities.
    launcher: OnceLock<Arc<dyn ActivityLauncher>>,
    config: ScannerConfig,
    pending: PendingSlot,
}

impl ScanCoordinator {
    pub fn new(
        scanner: Arc<dyn DocumentScanner>,
        host: Arc<dyn HostContext>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            scanner,
            host,
            launcher: OnceLock::new(),
            config,
            pending: PendingSlot::new(),
        }
    }

    /// Register the activity launcher. Returns `false` if one was already set.
    pub fn register_launcher(&self, launcher: Arc<dyn ActivityLauncher>) -> bool {
        let registered = self.launcher.set(launcher).is_ok();
        if registered {
            info!(engine = self.scanner.engine_name(), "scanner launcher registered");
        } else {
            warn!("scanner launcher already registered; keeping the first one");
        }
        registered
    }

    pub fn is_ready(&self) -> bool {
        self.launcher.get().is_some()
    }

    pub fn state(&self) -> ScanState {
        self.pending.state()
    }

    /// Call id of the outstanding scan, if any.
    pub fn pending_call(&self) -> Option<CallId> {
        self.pending.call_id()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    // -- Requests -------------------------------------------------------------

    /// Run one scan to completion.
    ///
    /// Fails immediately with `NotReady`, `Busy`, `NoHostContext` or
    /// `LaunchFailed`; otherwise resolves when the host delivers the activity
    /// result through [`ScanCoordinator::handle_scan_result`].
    pub async fn request_scan(&self, request: ScanRequest) -> Result<ScanResult> {
        let receiver = self.launch(&request)?;
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(call_id = %request.call_id, "pending scan dropped without a result");
                Err(ScanError::Abandoned)
            }
        }
    }

    /// Admit `request` and present the scanner UI.
    #[instrument(skip(self, request), fields(call_id = %request.call_id))]
    fn launch(&self, request: &ScanRequest) -> Result<oneshot::Receiver<Result<ScanResult>>> {
        let launcher = self.launcher.get().ok_or(ScanError::NotReady)?;
        if self.pending.is_occupied() {
            return Err(ScanError::Busy);
        }
        let surface = self.host.surface().ok_or(ScanError::NoHostContext)?;

        let (responder, receiver) = oneshot::channel();
        self.pending.claim(request, responder)?;

        let options = ScannerOptions::for_request(request, &self.config);
        info!(
            engine = self.scanner.engine_name(),
            page_limit = options.page_limit,
            mode = ?options.mode,
            format = ?request.response_format,
            quality = request.quality,
            "starting document scan"
        );

        let token = match self.scanner.start_scan(&options, &surface) {
            Ok(token) => token,
            Err(e) => return Err(self.abort_launch(request.call_id, e)),
        };
        if let Err(e) = launcher.launch(token) {
            return Err(self.abort_launch(request.call_id, e));
        }

        self.pending.mark_awaiting(request.call_id);
        Ok(receiver)
    }

    fn abort_launch(&self, call_id: CallId, cause: ScanError) -> ScanError {
        error!(call_id = %call_id, error = %cause, "failed to start scanner");
        self.pending.release(call_id);
        ScanError::LaunchFailed(cause.to_string())
    }

    // -- Completion -----------------------------------------------------------

    /// Deliver the scanner activity's result.
    ///
    /// Settles the outstanding scan exactly once. A result that arrives with
    /// no scan outstanding, or while one is already settling, is ignored.
    pub fn handle_scan_result(&self, result: ActivityResult) {
        let Some(settlement) = self.pending.begin_settle() else {
            debug!(code = ?result.code, "ignoring activity result with no pending scan");
            return;
        };

        let outcome = self.settle(&settlement, result);
        self.pending.release(settlement.call_id);

        match &outcome {
            Ok(scan) => info!(
                call_id = %settlement.call_id,
                status = ?scan.status,
                pages = scan.images.as_ref().map_or(0, Vec::len),
                "scan settled"
            ),
            Err(e) => warn!(call_id = %settlement.call_id, error = %e, "scan failed"),
        }

        if settlement.responder.send(outcome).is_err() {
            warn!(call_id = %settlement.call_id, "scan caller went away before the result");
        }
    }

    fn settle(&self, settlement: &Settlement, result: ActivityResult) -> Result<ScanResult> {
        if result.code == ResultCode::Canceled {
            return Ok(ScanResult::cancel());
        }

        let data = result.data.ok_or(ScanError::NoData)?;
        let payload = ScanPayload::from_value(data)
            .map_err(|e| ScanError::UnparsableResult(e.to_string()))?;

        let encoder = self.encoder_for(settlement);
        let images = payload
            .into_pages()
            .into_iter()
            .map(|page| self.encode_page(&encoder, page))
            .collect::<Result<Vec<_>>>()?;
        Ok(ScanResult::success(images))
    }

    fn encoder_for(&self, settlement: &Settlement) -> PageEncoder {
        let encoder = PageEncoder::new(settlement.quality, settlement.response_format)
            .with_file_prefix(self.config.file_prefix.clone());
        match self.host.cache_dir() {
            Some(dir) => encoder.with_output_dir(dir.join(&self.config.cache_subdir)),
            None => encoder,
        }
    }

    fn encode_page(&self, encoder: &PageEncoder, page: ScanPage) -> Result<String> {
        let index = page.index;
        let uri = page.image_uri.ok_or_else(|| {
            ScanError::page(
                index,
                PageError::Read(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "missing image URI for scanned page",
                )),
            )
        })?;
        let source = self
            .host
            .open_page(&uri)
            .map_err(|e| ScanError::page(index, PageError::Read(e)))?;
        encoder
            .encode(source, index)
            .map_err(|e| ScanError::page(index, e))
    }

    // -- Teardown -------------------------------------------------------------

    /// Drop the outstanding scan, if any. Its caller resolves with `Abandoned`.
    pub fn abandon(&self) -> Option<CallId> {
        let dropped = self.pending.clear();
        if let Some(call_id) = dropped {
            warn!(call_id = %call_id, "abandoning pending scan");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use docscan_bridge::traits::{HostSurface, LaunchToken};
    use docscan_core::types::{ResponseFormat, ScanOptions, ScanStatus, ScannerMode};
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use tokio::task::JoinHandle;

    // -- Fakes ----------------------------------------------------------------

    #[derive(Default)]
    struct FakeScanner {
        fail: bool,
        started: Mutex<Vec<ScannerOptions>>,
    }

    impl DocumentScanner for FakeScanner {
        fn engine_name(&self) -> &str {
            "Fake"
        }

        fn start_scan(&self, options: &ScannerOptions, _surface: &HostSurface) -> Result<LaunchToken> {
            if self.fail {
                return Err(ScanError::Bridge("engine unavailable".into()));
            }
            self.started.lock().unwrap().push(options.clone());
            Ok(LaunchToken {
                handle: "fake".into(),
                options: options.clone(),
            })
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launched: AtomicUsize,
    }

    impl ActivityLauncher for FakeLauncher {
        fn launch(&self, _token: LaunchToken) -> Result<()> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeHost {
        no_surface: bool,
        cache_dir: Option<PathBuf>,
        pages: HashMap<String, Vec<u8>>,
    }

    impl HostContext for FakeHost {
        fn surface(&self) -> Option<HostSurface> {
            (!self.no_surface).then(|| HostSurface::new("fake"))
        }

        fn cache_dir(&self) -> Option<PathBuf> {
            self.cache_dir.clone()
        }

        fn open_page(&self, uri: &str) -> std::io::Result<Box<dyn Read + Send>> {
            match self.pages.get(uri) {
                Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
                None => Err(std::io::Error::new(std::io::ErrorKind::NotFound, uri.to_owned())),
            }
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn jpeg_page(shade: u8) -> Vec<u8> {
        let img = RgbImage::from_fn(48, 64, |x, y| Rgb([shade, (x * 3) as u8, (y * 2) as u8]));
        let mut buf = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 95))
            .unwrap();
        buf
    }

    fn host_with_pages(count: usize) -> FakeHost {
        FakeHost {
            pages: (0..count)
                .map(|i| (format!("page://{i}"), jpeg_page(i as u8 * 40)))
                .collect(),
            ..Default::default()
        }
    }

    fn payload(uris: &[&str]) -> ActivityResult {
        ActivityResult::ok(serde_json::to_value(ScanPayload::from_uris(uris.iter().copied())).unwrap())
    }

    fn ready(scanner: FakeScanner, host: FakeHost) -> Arc<ScanCoordinator> {
        let coordinator = ScanCoordinator::new(Arc::new(scanner), Arc::new(host), ScannerConfig::default());
        assert!(coordinator.register_launcher(Arc::new(FakeLauncher::default())));
        Arc::new(coordinator)
    }

    fn request(options: serde_json::Value) -> ScanRequest {
        ScanRequest::new(CallId::new(), &ScanOptions::from_json(&options))
    }

    fn spawn_scan(coordinator: &Arc<ScanCoordinator>, request: ScanRequest) -> JoinHandle<Result<ScanResult>> {
        let coordinator = Arc::clone(coordinator);
        tokio::spawn(async move { coordinator.request_scan(request).await })
    }

    async fn wait_for(coordinator: &ScanCoordinator, state: ScanState) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.state() != state {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("coordinator never reached the expected state");
    }

    /// Start a scan, deliver `result`, and return what the caller received.
    async fn scan_with(
        coordinator: &Arc<ScanCoordinator>,
        options: serde_json::Value,
        result: ActivityResult,
    ) -> Result<ScanResult> {
        let task = spawn_scan(coordinator, request(options));
        wait_for(coordinator, ScanState::AwaitingResult).await;
        coordinator.handle_scan_result(result);
        let outcome = task.await.unwrap();
        assert_eq!(coordinator.state(), ScanState::Idle);
        outcome
    }

    // -- Admission ------------------------------------------------------------

    #[tokio::test]
    async fn not_ready_without_launcher() {
        let coordinator = ScanCoordinator::new(
            Arc::new(FakeScanner::default()),
            Arc::new(FakeHost::default()),
            ScannerConfig::default(),
        );
        assert!(!coordinator.is_ready());
        let err = coordinator.request_scan(request(json!({}))).await.unwrap_err();
        assert!(matches!(err, ScanError::NotReady));
        assert_eq!(coordinator.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn no_host_surface() {
        let coordinator = ready(
            FakeScanner::default(),
            FakeHost {
                no_surface: true,
                ..Default::default()
            },
        );
        let err = coordinator.request_scan(request(json!({}))).await.unwrap_err();
        assert!(matches!(err, ScanError::NoHostContext));
        assert_eq!(coordinator.state(), ScanState::Idle);
    }

    #[test]
    fn launcher_registers_once() {
        let coordinator = ScanCoordinator::new(
            Arc::new(FakeScanner::default()),
            Arc::new(FakeHost::default()),
            ScannerConfig::default(),
        );
        assert!(coordinator.register_launcher(Arc::new(FakeLauncher::default())));
        assert!(!coordinator.register_launcher(Arc::new(FakeLauncher::default())));
        assert!(coordinator.is_ready());
    }

    #[tokio::test]
    async fn launch_failure_releases_the_slot() {
        let coordinator = ready(
            FakeScanner {
                fail: true,
                ..Default::default()
            },
            FakeHost::default(),
        );
        let err = coordinator.request_scan(request(json!({}))).await.unwrap_err();
        match err {
            ScanError::LaunchFailed(detail) => assert!(detail.contains("engine unavailable")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(coordinator.state(), ScanState::Idle);
        assert!(coordinator.pending_call().is_none());
    }

    #[tokio::test]
    async fn engine_receives_request_options() {
        let scanner = Arc::new(FakeScanner::default());
        let coordinator = Arc::new(ScanCoordinator::new(
            scanner.clone(),
            Arc::new(FakeHost::default()),
            ScannerConfig::default(),
        ));
        coordinator.register_launcher(Arc::new(FakeLauncher::default()));

        let task = spawn_scan(&coordinator, request(json!({ "pageLimit": 5, "allowManualCrop": false })));
        wait_for(&coordinator, ScanState::AwaitingResult).await;
        coordinator.handle_scan_result(ActivityResult::canceled());
        task.await.unwrap().unwrap();

        let started = scanner.started.lock().unwrap();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].page_limit, 5);
        assert_eq!(started[0].mode, ScannerMode::Base);
        assert!(!started[0].gallery_import_allowed);
    }

    #[tokio::test]
    async fn second_request_while_pending_is_busy() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let first = request(json!({}));
        let first_id = first.call_id;
        let task = spawn_scan(&coordinator, first);
        wait_for(&coordinator, ScanState::AwaitingResult).await;

        let err = coordinator.request_scan(request(json!({}))).await.unwrap_err();
        assert!(matches!(err, ScanError::Busy));
        assert_eq!(coordinator.pending_call(), Some(first_id));
        assert_eq!(coordinator.state(), ScanState::AwaitingResult);

        coordinator.handle_scan_result(ActivityResult::canceled());
        assert_eq!(task.await.unwrap().unwrap(), ScanResult::cancel());
    }

    // -- Completion -----------------------------------------------------------

    #[tokio::test]
    async fn user_cancel_resolves_with_cancel() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let result = scan_with(&coordinator, json!({}), ActivityResult::canceled())
            .await
            .unwrap();
        assert_eq!(result, ScanResult::cancel());
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "status": "cancel" }));
    }

    #[tokio::test]
    async fn three_pages_inline_at_reduced_quality() {
        let coordinator = ready(FakeScanner::default(), host_with_pages(3));
        let result = scan_with(
            &coordinator,
            json!({ "pageLimit": 5, "responseFormat": "inline", "quality": 80 }),
            payload(&["page://0", "page://1", "page://2"]),
        )
        .await
        .unwrap();

        assert_eq!(result.status, ScanStatus::Success);
        let images = result.images.unwrap();
        assert_eq!(images.len(), 3);
        for encoded in &images {
            let bytes = STANDARD.decode(encoded).unwrap();
            assert!(!bytes.is_empty());
            assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        }
    }

    #[tokio::test]
    async fn full_quality_inline_returns_engine_bytes() {
        let host = host_with_pages(1);
        let original = host.pages["page://0"].clone();
        let coordinator = ready(FakeScanner::default(), host);
        let result = scan_with(
            &coordinator,
            json!({ "responseFormat": "base64" }),
            payload(&["page://0"]),
        )
        .await
        .unwrap();
        let images = result.images.unwrap();
        assert_eq!(STANDARD.decode(&images[0]).unwrap(), original);
    }

    #[tokio::test]
    async fn file_paths_land_in_the_cache_subdirectory() {
        let cache = tempfile::tempdir().unwrap();
        let host = FakeHost {
            cache_dir: Some(cache.path().to_path_buf()),
            ..host_with_pages(2)
        };
        let coordinator = ready(FakeScanner::default(), host);
        let result = scan_with(&coordinator, json!({ "quality": 50 }), payload(&["page://0", "page://1"]))
            .await
            .unwrap();

        let images = result.images.unwrap();
        assert_eq!(images.len(), 2);
        assert_ne!(images[0], images[1]);
        for path in &images {
            let path = PathBuf::from(path);
            assert!(path.is_absolute());
            assert!(path.starts_with(cache.path().join("document_scanner")));
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        }
    }

    #[tokio::test]
    async fn empty_scan_is_an_empty_success() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let result = scan_with(&coordinator, json!({}), payload(&[])).await.unwrap();
        assert_eq!(result, ScanResult::success(Vec::new()));
    }

    #[tokio::test]
    async fn completion_without_data() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let err = scan_with(&coordinator, json!({}), ActivityResult::ok_without_data())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoData));
    }

    #[tokio::test]
    async fn completion_with_unparsable_data() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let err = scan_with(&coordinator, json!({}), ActivityResult::ok(json!("not a scan")))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::UnparsableResult(_)));
    }

    #[tokio::test]
    async fn completion_without_pages_is_an_empty_success() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        for data in [json!({ "pdf": "x" }), json!({ "pages": null })] {
            let result = scan_with(&coordinator, json!({}), ActivityResult::ok(data))
                .await
                .unwrap();
            assert_eq!(result, ScanResult::success(Vec::new()));
        }
    }

    #[tokio::test]
    async fn corrupt_page_fails_the_whole_scan() {
        let mut host = host_with_pages(3);
        host.pages.insert("page://1".into(), b"\xFF\xD8 not really a jpeg".to_vec());
        let coordinator = ready(FakeScanner::default(), host);

        let err = scan_with(
            &coordinator,
            json!({ "responseFormat": "inline", "quality": 60 }),
            payload(&["page://0", "page://1", "page://2"]),
        )
        .await
        .unwrap_err();

        match err {
            ScanError::PageProcessingFailed { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, PageError::Decode(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreadable_page_is_a_read_error() {
        let coordinator = ready(FakeScanner::default(), host_with_pages(1));
        let err = scan_with(&coordinator, json!({}), payload(&["page://0", "page://missing"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::PageProcessingFailed {
                index: 1,
                source: PageError::Read(_)
            }
        ));
    }

    #[tokio::test]
    async fn page_without_uri_is_a_read_error() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let err = scan_with(
            &coordinator,
            json!({ "responseFormat": "inline" }),
            ActivityResult::ok(json!({ "pages": [{}] })),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ScanError::PageProcessingFailed {
                index: 0,
                source: PageError::Read(_)
            }
        ));
    }

    #[tokio::test]
    async fn file_path_without_cache_dir_is_a_write_error() {
        let coordinator = ready(FakeScanner::default(), host_with_pages(1));
        let err = scan_with(&coordinator, json!({}), payload(&["page://0"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::PageProcessingFailed {
                source: PageError::Write(_),
                ..
            }
        ));
    }

    // -- Stray signals and teardown -------------------------------------------

    #[tokio::test]
    async fn stray_results_are_ignored() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        coordinator.handle_scan_result(ActivityResult::canceled());
        coordinator.handle_scan_result(payload(&["page://0"]));
        assert_eq!(coordinator.state(), ScanState::Idle);

        let result = scan_with(&coordinator, json!({}), ActivityResult::canceled())
            .await
            .unwrap();
        assert_eq!(result, ScanResult::cancel());

        // A duplicate of the result that already settled the scan.
        coordinator.handle_scan_result(ActivityResult::canceled());
        assert_eq!(coordinator.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn coordinator_accepts_the_next_scan_after_a_failure() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        scan_with(&coordinator, json!({}), ActivityResult::ok_without_data())
            .await
            .unwrap_err();
        let result = scan_with(&coordinator, json!({}), ActivityResult::canceled())
            .await
            .unwrap();
        assert_eq!(result.status, ScanStatus::Cancel);
    }

    #[tokio::test]
    async fn abandoning_wakes_the_caller() {
        let coordinator = ready(FakeScanner::default(), FakeHost::default());
        let scan = request(json!({}));
        let call_id = scan.call_id;
        let task = spawn_scan(&coordinator, scan);
        wait_for(&coordinator, ScanState::AwaitingResult).await;

        assert_eq!(coordinator.abandon(), Some(call_id));
        assert!(matches!(task.await.unwrap(), Err(ScanError::Abandoned)));
        assert_eq!(coordinator.state(), ScanState::Idle);
        assert!(coordinator.abandon().is_none());
    }

    #[test]
    fn response_format_is_taken_from_the_request() {
        let req = request(json!({ "responseFormat": "inline", "quality": 30 }));
        assert_eq!(req.response_format, ResponseFormat::Inline);
        assert_eq!(req.quality, 30);
    }
}
