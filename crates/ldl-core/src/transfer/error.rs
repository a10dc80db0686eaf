//! Transfer failure taxonomy.
//!
//! Failures never propagate out of a transfer task; they are rendered into
//! the item's error text, with protocol-level status codes kept separately so
//! the caller can surface them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// libcurl reported an error (timeout, connection refused, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The transfer ended with fewer bytes than the server announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: i64, received: i64 },
    /// Local file I/O failed (disk full, permission denied, ...).
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl TransferError {
    /// Protocol-level status code, when the failure carries one.
    pub fn http_status(&self) -> Option<u32> {
        match self {
            TransferError::Http(code) => Some(*code),
            _ => None,
        }
    }
}
