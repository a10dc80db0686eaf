//! Transfer scheduler: admission-controlled poll loop.
//!
//! Owns all queued transfers, keeps at most `max_concurrent` of them active,
//! reports every tracked item to the progress sink once per poll pass, and
//! retires finished items (counting successes and failures, notifying the
//! source mutator) until none remain.

mod pacing;

pub use pacing::PacingBounds;

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::list::ListEntry;
use crate::naming;
use crate::transfer::{AuthRewrite, ResumableTransfer, TransferSnapshot, TransferStatus};

/// Consumer of per-item progress snapshots. Called once per tracked item per
/// poll pass and once at retirement; must not block for long, it runs on the
/// scheduler's control path.
pub trait ProgressSink {
    fn report(&mut self, snapshot: &TransferSnapshot);
}

/// Sink that discards everything (headless runs, tests).
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&mut self, _snapshot: &TransferSnapshot) {}
}

/// Invoked once per successfully completed item, e.g. to drop the entry from
/// the origin list file. Errors are absorbed into the item's outcome.
pub trait SourceMutator {
    fn on_success(&mut self, entry: &ListEntry) -> Result<()>;
}

/// Scheduler-wide configuration, copied onto each item at `add` time.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Directory all files land in. Must exist before `run`.
    pub dest_dir: PathBuf,
    /// Maximum simultaneously admitted transfers (floored to 1).
    pub max_concurrent: usize,
    /// Sleep between poll passes.
    pub poll_interval: Duration,
    /// Prefix filenames with the item's sequence number.
    pub numerate_files: bool,
    /// Post-transfer pause bounds.
    pub pacing: PacingBounds,
    /// Extra request headers shared by all items.
    pub headers: HashMap<String, String>,
    /// URL credential handling shared by all items.
    pub auth_mode: AuthRewrite,
}

/// Aggregate result of one `run`.
#[derive(Debug)]
pub struct RunSummary {
    pub ok: u32,
    pub failed: u32,
    /// Final snapshot of every item, in retirement order.
    pub outcomes: Vec<TransferSnapshot>,
}

pub struct TransferScheduler {
    opts: SchedulerOptions,
    transfers: Vec<ResumableTransfer>,
    next_seq: usize,
}

impl TransferScheduler {
    pub fn new(opts: SchedulerOptions) -> Self {
        Self {
            opts,
            transfers: Vec::new(),
            next_seq: 0,
        }
    }

    /// Queues one transfer per entry, assigning ascending sequence numbers
    /// and snapshotting the current options onto each item. Options changed
    /// afterwards do not affect items already added.
    pub fn add(&mut self, entries: Vec<ListEntry>) {
        for entry in entries {
            self.next_seq += 1;
            let seq = self.next_seq;

            let mut staging_path = naming::build_file_path(
                &self.opts.dest_dir,
                &entry.caption,
                naming::STAGING_SUFFIX,
            );
            if self.opts.numerate_files {
                staging_path =
                    naming::apply_file_prefix(&staging_path, &naming::number_prefix(seq));
            }

            self.transfers.push(ResumableTransfer::new(
                entry,
                seq,
                staging_path,
                self.opts.headers.clone(),
                self.opts.auth_mode,
                self.opts.pacing.next_pause(),
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Drives every queued transfer to `Done`.
    ///
    /// Each pass visits items in sequence order: idle items are admitted
    /// while slots are free, finished workers move into their pacing pause,
    /// elapsed pauses retire the item (final report, mutator call, counters).
    /// An item holds its admission slot until retirement, so pacing throttles
    /// the request rate. Mutator errors are recorded on the item and never
    /// abort the loop.
    pub async fn run(
        &mut self,
        sink: &mut dyn ProgressSink,
        mut mutator: Option<&mut dyn SourceMutator>,
    ) -> RunSummary {
        let max_concurrent = self.opts.max_concurrent.max(1);
        let mut active = 0usize;
        let mut ok = 0u32;
        let mut failed = 0u32;
        let mut outcomes = Vec::new();

        tracing::info!(
            items = self.transfers.len(),
            max_concurrent,
            "scheduler starting"
        );

        while !self.transfers.is_empty() {
            let mut i = 0;
            while i < self.transfers.len() {
                match self.transfers[i].status() {
                    TransferStatus::Idle => {
                        if active < max_concurrent {
                            let item = &mut self.transfers[i];
                            item.start();
                            item.mark_active();
                            active += 1;
                            sink.report(&item.snapshot());
                        }
                        i += 1;
                    }
                    TransferStatus::Active => {
                        let item = &mut self.transfers[i];
                        if item.worker_finished() {
                            item.mark_paused().await;
                        }
                        sink.report(&item.snapshot());
                        i += 1;
                    }
                    TransferStatus::Paused => {
                        if self.transfers[i].pause_elapsed() {
                            let mut item = self.transfers.remove(i);
                            item.mark_done();

                            if !item.progress().is_failed() {
                                if let Some(m) = mutator.as_deref_mut() {
                                    if let Err(err) = m.on_success(item.entry()) {
                                        tracing::warn!(
                                            url = %item.entry().url,
                                            "source mutator failed: {:#}", err
                                        );
                                        item.progress()
                                            .fail(format!("list update failed: {:#}", err));
                                    }
                                }
                            }

                            let snapshot = item.snapshot();
                            sink.report(&snapshot);
                            if snapshot.is_failed() {
                                failed += 1;
                            } else {
                                ok += 1;
                            }
                            active -= 1;
                            tracing::info!(
                                seq = snapshot.seq,
                                failed = snapshot.is_failed(),
                                bytes = snapshot.transferred_bytes,
                                "transfer retired"
                            );
                            outcomes.push(snapshot);
                            // removal shifted the next item into slot i
                        } else {
                            sink.report(&self.transfers[i].snapshot());
                            i += 1;
                        }
                    }
                    TransferStatus::Done => {
                        // Done items retire in the Paused arm; nothing lingers here.
                        i += 1;
                    }
                }
            }

            if self.transfers.is_empty() {
                break;
            }
            tokio::time::sleep(self.opts.poll_interval).await;
        }

        tracing::info!(ok, failed, "scheduler finished");
        RunSummary {
            ok,
            failed,
            outcomes,
        }
    }
}
