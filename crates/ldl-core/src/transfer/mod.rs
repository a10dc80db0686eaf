//! Per-item resumable transfer: state machine, progress cell, blocking worker.
//!
//! One `ResumableTransfer` drives one URL to one file. The scheduler starts
//! it, polls its shared progress, and walks its status through
//! `Idle → Active → Paused → Done`. The status field itself belongs to the
//! scheduler; the worker communicates purely through the progress cell.

mod auth;
mod error;
mod progress;
mod worker;

pub use auth::{rewrite_url_auth, AuthRewrite, ResolvedRequest};
pub use error::TransferError;
pub use progress::{TransferProgress, TOTAL_UNKNOWN};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::list::ListEntry;
use worker::TransferJob;

/// Lifecycle stage of one transfer. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Queued, not admitted yet.
    Idle,
    /// Worker running (or finished but not yet observed by the scheduler).
    Active,
    /// Worker done; pacing delay counting down.
    Paused,
    /// Retired. Terminal.
    Done,
}

/// Plain-data view of one transfer, handed to progress sinks.
#[derive(Debug, Clone)]
pub struct TransferSnapshot {
    pub url: String,
    pub caption: String,
    pub seq: usize,
    pub status: TransferStatus,
    pub transferred_bytes: i64,
    /// -1 until the server reports a length (and forever for servers that
    /// never do, until completion settles it).
    pub total_bytes: i64,
    /// Empty means the item has not failed.
    pub error: String,
    /// 0 unless the failure was protocol-level.
    pub http_status: u32,
    /// Remaining pacing delay; nonzero only while `Paused`.
    pub pause_remaining_ms: u64,
    /// Resolved final path once known, staging path before that.
    pub path: PathBuf,
}

impl TransferSnapshot {
    pub fn is_failed(&self) -> bool {
        !self.error.is_empty()
    }
}

/// One queued URL→file transfer with resume support.
pub struct ResumableTransfer {
    entry: ListEntry,
    seq: usize,
    staging_path: PathBuf,
    headers: HashMap<String, String>,
    auth_mode: AuthRewrite,
    pause: Duration,
    progress: Arc<TransferProgress>,
    status: TransferStatus,
    pause_deadline: Option<Instant>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ResumableTransfer {
    pub fn new(
        entry: ListEntry,
        seq: usize,
        staging_path: PathBuf,
        headers: HashMap<String, String>,
        auth_mode: AuthRewrite,
        pause: Duration,
    ) -> Self {
        Self {
            entry,
            seq,
            staging_path,
            headers,
            auth_mode,
            pause,
            progress: Arc::new(TransferProgress::default()),
            status: TransferStatus::Idle,
            pause_deadline: None,
            handle: None,
        }
    }

    pub fn entry(&self) -> &ListEntry {
        &self.entry
    }

    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn progress(&self) -> &Arc<TransferProgress> {
        &self.progress
    }

    /// Spawns the blocking worker. Idempotent: only the first call spawns.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let job = TransferJob {
            url: self.entry.url.clone(),
            staging_path: self.staging_path.clone(),
            headers: self.headers.clone(),
            auth_mode: self.auth_mode,
        };
        let progress = Arc::clone(&self.progress);
        tracing::info!(seq = self.seq, url = %job.url, "starting transfer");
        self.handle = Some(tokio::task::spawn_blocking(move || {
            worker::run_transfer(&job, &progress)
        }));
    }

    /// True once the worker has signalled completion (success or failure).
    pub fn worker_finished(&self) -> bool {
        self.progress.is_finished()
    }

    /// Scheduler-only: records the admission.
    pub(crate) fn mark_active(&mut self) {
        self.status = TransferStatus::Active;
    }

    /// Scheduler-only: joins the finished worker and starts the pacing
    /// countdown. The join returns promptly because the worker has already
    /// signalled completion.
    pub(crate) async fn mark_paused(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(join_err) = handle.await {
                self.progress
                    .fail(format!("transfer task panicked: {}", join_err));
            }
        }
        self.status = TransferStatus::Paused;
        self.pause_deadline = Some(Instant::now() + self.pause);
    }

    /// Scheduler-only: true once the pacing delay has elapsed.
    pub(crate) fn pause_elapsed(&self) -> bool {
        match self.pause_deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => true,
        }
    }

    /// Scheduler-only: final transition.
    pub(crate) fn mark_done(&mut self) {
        self.status = TransferStatus::Done;
        self.pause_deadline = None;
    }

    pub fn snapshot(&self) -> TransferSnapshot {
        let pause_remaining_ms = match (self.status, self.pause_deadline) {
            (TransferStatus::Paused, Some(deadline)) => deadline
                .saturating_duration_since(Instant::now())
                .as_millis() as u64,
            _ => 0,
        };
        TransferSnapshot {
            url: self.entry.url.clone(),
            caption: self.entry.caption.clone(),
            seq: self.seq,
            status: self.status,
            transferred_bytes: self.progress.transferred(),
            total_bytes: self.progress.total(),
            error: self.progress.error(),
            http_status: self.progress.http_status(),
            pause_remaining_ms,
            path: self
                .progress
                .final_path()
                .unwrap_or_else(|| self.staging_path.clone()),
        }
    }
}
