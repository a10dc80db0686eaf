//! Shared progress cell for one transfer.
//!
//! The blocking worker is the only writer; the scheduler's control loop reads
//! it once per poll pass. Reads may observe a slightly stale byte count, which
//! is fine for display purposes. `finished` is the worker's completion signal.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;

/// Total size sentinel meaning "server never reported a length".
pub const TOTAL_UNKNOWN: i64 = -1;

#[derive(Debug)]
pub struct TransferProgress {
    transferred: AtomicI64,
    total: AtomicI64,
    http_status: AtomicU32,
    finished: AtomicBool,
    error: Mutex<String>,
    final_path: Mutex<Option<PathBuf>>,
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self {
            transferred: AtomicI64::new(0),
            total: AtomicI64::new(TOTAL_UNKNOWN),
            http_status: AtomicU32::new(0),
            finished: AtomicBool::new(false),
            error: Mutex::new(String::new()),
            final_path: Mutex::new(None),
        }
    }
}

impl TransferProgress {
    pub fn transferred(&self) -> i64 {
        self.transferred.load(Ordering::Relaxed)
    }

    pub fn set_transferred(&self, bytes: i64) {
        self.transferred.store(bytes, Ordering::Relaxed);
    }

    pub fn add_transferred(&self, bytes: i64) {
        self.transferred.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn total(&self) -> i64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn set_total(&self, bytes: i64) {
        self.total.store(bytes, Ordering::Relaxed);
    }

    pub fn http_status(&self) -> u32 {
        self.http_status.load(Ordering::Relaxed)
    }

    pub fn set_http_status(&self, code: u32) {
        self.http_status.store(code, Ordering::Relaxed);
    }

    /// Records a failure message. The first message wins; later failures on
    /// the same item (e.g. cleanup errors) are logged by the caller instead.
    pub fn fail(&self, message: impl Into<String>) {
        let mut error = self.error.lock().unwrap_or_else(|e| e.into_inner());
        if error.is_empty() {
            *error = message.into();
        }
    }

    pub fn error(&self) -> String {
        self.error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_failed(&self) -> bool {
        !self
            .error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    pub fn set_final_path(&self, path: PathBuf) {
        *self.final_path.lock().unwrap_or_else(|e| e.into_inner()) = Some(path);
    }

    pub fn final_path(&self) -> Option<PathBuf> {
        self.final_path
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Marks the worker as done. Must be the worker's last write.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_unfinished() {
        let p = TransferProgress::default();
        assert_eq!(p.transferred(), 0);
        assert_eq!(p.total(), TOTAL_UNKNOWN);
        assert_eq!(p.http_status(), 0);
        assert!(!p.is_finished());
        assert!(!p.is_failed());
    }

    #[test]
    fn first_failure_wins() {
        let p = TransferProgress::default();
        p.fail("first");
        p.fail("second");
        assert_eq!(p.error(), "first");
        assert!(p.is_failed());
    }

    #[test]
    fn byte_accounting() {
        let p = TransferProgress::default();
        p.set_transferred(10);
        p.add_transferred(5);
        assert_eq!(p.transferred(), 15);
        p.set_total(100);
        assert_eq!(p.total(), 100);
    }
}
