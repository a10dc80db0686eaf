//! Blocking transfer worker: one URL to one file, resumable.
//!
//! Runs on the blocking pool. All outcomes, success or failure, end with the
//! progress cell marked finished; nothing escapes as a panic or error.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{self, AuthRewrite};
use super::progress::TransferProgress;
use super::TransferError;
use crate::naming;

/// Everything the worker needs, detached from the scheduler's bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct TransferJob {
    pub url: String,
    pub staging_path: PathBuf,
    pub headers: HashMap<String, String>,
    pub auth_mode: AuthRewrite,
}

/// Headers the transport computes itself or that are unsafe to override.
const BLOCKED_HEADERS: [&str; 3] = ["content-length", "host", "keep-alive"];

fn is_blocked_header(name: &str) -> bool {
    BLOCKED_HEADERS
        .iter()
        .any(|blocked| name.trim().eq_ignore_ascii_case(blocked))
}

/// Entry point for the blocking task. Converts every failure into the item's
/// error text, settles `total` for unknown-length transfers, and signals
/// completion.
pub(crate) fn run_transfer(job: &TransferJob, progress: &Arc<TransferProgress>) {
    if let Err(err) = transfer_inner(job, progress) {
        if let Some(code) = err.http_status() {
            progress.set_http_status(code);
        }
        tracing::warn!(url = %job.url, "transfer failed: {}", err);
        progress.fail(err.to_string());
    }
    if progress.total() < 0 {
        progress.set_total(progress.transferred());
    }
    progress.finish();
}

/// Per-response state gathered from header callbacks and consumed when the
/// first body bytes arrive.
struct ResponseCtx {
    status: Cell<u32>,
    content_length: Cell<Option<u64>>,
    total_from_range: Cell<Option<u64>>,
    content_type: RefCell<Option<String>>,
    file: RefCell<Option<File>>,
    abort: Cell<Option<Abort>>,
    io_error: RefCell<Option<std::io::Error>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    /// The resolved final file already exists; nothing to fetch.
    AlreadyComplete,
    /// Non-2xx status; the body is an error page and must not reach disk.
    HttpError,
}

impl ResponseCtx {
    fn new() -> Self {
        Self {
            status: Cell::new(0),
            content_length: Cell::new(None),
            total_from_range: Cell::new(None),
            content_type: RefCell::new(None),
            file: RefCell::new(None),
            abort: Cell::new(None),
            io_error: RefCell::new(None),
        }
    }

    /// Parses one response header line. A new status line (redirect hop)
    /// resets everything gathered from the previous hop.
    fn observe_header(&self, line: &str) {
        if let Some(rest) = line.strip_prefix("HTTP/") {
            let code = rest
                .split_whitespace()
                .nth(1)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            self.status.set(code);
            self.content_length.set(None);
            self.total_from_range.set(None);
            *self.content_type.borrow_mut() = None;
            return;
        }
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => self.content_length.set(value.parse::<u64>().ok()),
            "content-range" => {
                // e.g. "bytes 500-999/1000"
                let total = value
                    .rsplit('/')
                    .next()
                    .and_then(|t| t.parse::<u64>().ok());
                self.total_from_range.set(total);
            }
            "content-type" => *self.content_type.borrow_mut() = Some(value.to_string()),
            _ => {}
        }
    }

    /// Body-byte sink. Returns false to abort the transfer (reason stored in
    /// `abort` or `io_error`).
    fn sink(
        &self,
        data: &[u8],
        job: &TransferJob,
        progress: &TransferProgress,
        resume_offset: u64,
    ) -> bool {
        if self.abort.get().is_some() {
            return false;
        }
        if self.file.borrow().is_none() {
            match self.begin_body(job, progress, resume_offset) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    *self.io_error.borrow_mut() = Some(e);
                    return false;
                }
            }
        }
        let mut file = self.file.borrow_mut();
        let Some(file) = file.as_mut() else {
            return false;
        };
        if let Err(e) = file.write_all(data) {
            *self.io_error.borrow_mut() = Some(e);
            return false;
        }
        progress.add_transferred(data.len() as i64);
        true
    }

    /// First-body-byte decisions: HTTP errors, already-complete final files,
    /// and resume-vs-restart. Opens the staging file accordingly.
    fn begin_body(
        &self,
        job: &TransferJob,
        progress: &TransferProgress,
        resume_offset: u64,
    ) -> std::io::Result<bool> {
        let status = self.status.get();
        if !(200..300).contains(&status) {
            self.abort.set(Some(Abort::HttpError));
            return Ok(false);
        }

        // The pre-request check covers URLs with an extension; when the
        // extension comes from the content type the final path only becomes
        // known here.
        if naming::ext_from_url(&job.url).is_none() {
            let final_path = self.resolve_final_path(job);
            if final_path.exists() {
                let size = fs::metadata(&final_path)?.len() as i64;
                progress.set_transferred(size);
                progress.set_total(size);
                progress.set_final_path(final_path);
                self.abort.set(Some(Abort::AlreadyComplete));
                return Ok(false);
            }
        }

        let resumed = status == 206 && resume_offset > 0;
        let file = if resumed {
            progress.set_transferred(resume_offset as i64);
            let total = self
                .total_from_range
                .get()
                .or_else(|| self.content_length.get().map(|len| len + resume_offset));
            if let Some(total) = total {
                progress.set_total(total as i64);
            }
            OpenOptions::new().append(true).open(&job.staging_path)?
        } else {
            // Plain 200: the server ignored the range (or there was none),
            // so any partial file restarts from zero.
            progress.set_transferred(0);
            if let Some(len) = self.content_length.get() {
                progress.set_total(len as i64);
            }
            File::create(&job.staging_path)?
        };
        *self.file.borrow_mut() = Some(file);
        Ok(true)
    }

    /// Final path from the URL extension, else the response content type,
    /// else the bare staging stem.
    fn resolve_final_path(&self, job: &TransferJob) -> PathBuf {
        let ext = naming::ext_from_url(&job.url).unwrap_or_else(|| {
            self.content_type
                .borrow()
                .as_deref()
                .and_then(naming::ext_for_mime)
                .unwrap_or("")
                .to_string()
        });
        naming::replace_extension(&job.staging_path, &ext)
    }
}

fn transfer_inner(job: &TransferJob, progress: &Arc<TransferProgress>) -> Result<(), TransferError> {
    let resolved = auth::rewrite_url_auth(&job.url, job.auth_mode)?;

    // When the URL itself carries an extension the final path is known up
    // front; an existing file there means there is nothing to do.
    if let Some(ext) = naming::ext_from_url(&job.url) {
        let final_path = naming::replace_extension(&job.staging_path, &ext);
        if final_path.exists() {
            let size = fs::metadata(&final_path)?.len() as i64;
            progress.set_transferred(size);
            progress.set_total(size);
            tracing::debug!(path = %final_path.display(), "already downloaded");
            progress.set_final_path(final_path);
            return Ok(());
        }
    }

    let resume_offset = fs::metadata(&job.staging_path).map(|m| m.len()).unwrap_or(0);

    let mut easy = curl::easy::Easy::new();
    easy.url(&resolved.url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;

    let mut list = curl::easy::List::new();
    let mut appended = 0usize;
    // Resume goes in as a plain header, not CURLOPT_RESUME_FROM: a server
    // that ignores the range then answers 200 and the restart-from-zero path
    // applies, where libcurl's own resume handling would abort the transfer.
    if resume_offset > 0 {
        list.append(&format!("Range: bytes={}-", resume_offset))?;
        appended += 1;
    }
    for (name, value) in &job.headers {
        if is_blocked_header(name) {
            continue;
        }
        // The computed Basic header always wins over a caller-supplied one.
        if resolved.basic_auth.is_some() && name.trim().eq_ignore_ascii_case("authorization") {
            continue;
        }
        list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        appended += 1;
    }
    if let Some(value) = &resolved.basic_auth {
        list.append(&format!("Authorization: {}", value))?;
        appended += 1;
    }
    if appended > 0 {
        easy.http_headers(list)?;
    }

    let ctx = ResponseCtx::new();
    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                ctx.observe_header(line.trim_end());
            }
            true
        })?;
        transfer.write_function(|data| {
            if ctx.sink(data, job, progress, resume_offset) {
                Ok(data.len())
            } else {
                Ok(0) // abort; reason recorded in ctx
            }
        })?;
        transfer.perform()
    };

    if let Some(io_err) = ctx.io_error.borrow_mut().take() {
        return Err(io_err.into());
    }
    if ctx.abort.get() == Some(Abort::AlreadyComplete) {
        return Ok(());
    }

    // 416 against our own resume offset means the staging file already holds
    // the whole body (e.g. a crash between the last byte and the rename);
    // only the rename is left.
    let status = ctx.status.get();
    if status == 416 && resume_offset > 0 && ctx.total_from_range.get() == Some(resume_offset) {
        progress.set_transferred(resume_offset as i64);
        progress.set_total(resume_offset as i64);
        let final_path = ctx.resolve_final_path(job);
        if final_path != job.staging_path {
            fs::rename(&job.staging_path, &final_path)?;
        }
        tracing::debug!(url = %job.url, path = %final_path.display(), "staging file was already complete");
        progress.set_final_path(final_path);
        return Ok(());
    }
    if ctx.abort.get() == Some(Abort::HttpError) {
        return Err(TransferError::Http(status));
    }
    perform_result?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }

    if let Some(file) = ctx.file.borrow_mut().take() {
        file.sync_all()?;
    } else if !job.staging_path.exists() {
        // Zero-length body: no write callback ever fired.
        File::create(&job.staging_path)?;
    }

    let total = progress.total();
    if total >= 0 && progress.transferred() != total {
        return Err(TransferError::PartialTransfer {
            expected: total,
            received: progress.transferred(),
        });
    }

    let final_path = ctx.resolve_final_path(job);
    if final_path != job.staging_path {
        fs::rename(&job.staging_path, &final_path)?;
    }
    tracing::debug!(url = %job.url, path = %final_path.display(), bytes = progress.transferred(), "transfer complete");
    progress.set_final_path(final_path);
    Ok(())
}
