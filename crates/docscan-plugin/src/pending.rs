// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-slot pending scan.
//
// At most one scan is outstanding at a time. The slot is claimed with a
// check-and-set under one lock guard, stays occupied while the scanner UI is
// up and while the result is being encoded, and is released exactly once
// when the caller's response is handed over.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use docscan_core::error::{Result, ScanError};
use docscan_core::types::{CallId, ResponseFormat, ScanRequest, ScanResult};

/// Sending half that resolves the waiting `request_scan` call.
pub(crate) type Responder = oneshot::Sender<Result<ScanResult>>;

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No scan outstanding; a new request is accepted.
    Idle,
    /// Slot claimed, engine being asked for a launch token.
    Launching,
    /// Scanner UI presented; waiting for the activity result.
    AwaitingResult,
    /// Activity result received; pages being encoded.
    Settling,
}

/// The one outstanding scan.
#[derive(Debug)]
struct PendingScan {
    call_id: CallId,
    response_format: ResponseFormat,
    quality: u8,
    state: ScanState,
    /// Taken when settlement starts.
    responder: Option<Responder>,
}

/// Everything the completion handler needs to finish a scan.
#[derive(Debug)]
pub(crate) struct Settlement {
    pub call_id: CallId,
    pub response_format: ResponseFormat,
    pub quality: u8,
    pub responder: Responder,
}

#[derive(Debug, Default)]
pub(crate) struct PendingSlot {
    inner: Mutex<Option<PendingScan>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic while holding the guard cannot leave the `Option` half-written,
    /// so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<PendingScan>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for `request`, or fail with `Busy` leaving the current
    /// occupant untouched.
    pub fn claim(&self, request: &ScanRequest, responder: Responder) -> Result<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(ScanError::Busy);
        }
        *slot = Some(PendingScan {
            call_id: request.call_id,
            response_format: request.response_format,
            quality: request.quality,
            state: ScanState::Launching,
            responder: Some(responder),
        });
        Ok(())
    }

    /// Record that the scanner UI is up. No-op if the result already arrived.
    pub fn mark_awaiting(&self, call_id: CallId) {
        let mut slot = self.lock();
        match slot.as_mut() {
            Some(pending) if pending.call_id == call_id && pending.state == ScanState::Launching => {
                pending.state = ScanState::AwaitingResult;
            }
            _ => {}
        }
    }

    /// Start settling the outstanding scan.
    ///
    /// Returns `None` when nothing is outstanding or settlement has already
    /// started, so a repeated or stray activity result has nothing to act on.
    /// The slot itself stays occupied until [`PendingSlot::release`].
    pub fn begin_settle(&self) -> Option<Settlement> {
        let mut slot = self.lock();
        let pending = slot.as_mut()?;
        let responder = pending.responder.take()?;
        pending.state = ScanState::Settling;
        Some(Settlement {
            call_id: pending.call_id,
            response_format: pending.response_format,
            quality: pending.quality,
            responder,
        })
    }

    /// Empty the slot if it still belongs to `call_id`. Returns whether it did.
    ///
    /// Dropping an unsent responder wakes the waiting caller with `Abandoned`.
    pub fn release(&self, call_id: CallId) -> bool {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(pending) if pending.call_id == call_id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Empty the slot regardless of owner, returning the dropped call id.
    pub fn clear(&self) -> Option<CallId> {
        self.lock().take().map(|pending| pending.call_id)
    }

    pub fn state(&self) -> ScanState {
        self.lock()
            .as_ref()
            .map_or(ScanState::Idle, |pending| pending.state)
    }

    pub fn call_id(&self) -> Option<CallId> {
        self.lock().as_ref().map(|pending| pending.call_id)
    }

    pub fn is_occupied(&self) -> bool {
        self.lock().is_some()
    }
}
