//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body; supports Range GETs with 206 responses,
//! optional suppression of Content-Length (close-delimited bodies), forced
//! error statuses, per-response delays, and records every raw request so
//! tests can assert on what actually went over the wire.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit Content-Length and delimit the body by closing.
    pub send_length: bool,
    /// Force this status on every GET (0 = behave normally).
    pub force_status: u32,
    /// Content-Type header to send, if any.
    pub content_type: Option<&'static str>,
    /// Sleep this long before sending each response.
    pub response_delay_ms: u64,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            send_length: true,
            force_status: 0,
            content_type: None,
            response_delay_ms: 0,
        }
    }
}

/// Running test server: base URL plus the raw text of every request seen.
pub struct RangeServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RangeServer {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// True if any recorded request contains `needle` (e.g. a header line).
    pub fn saw(&self, needle: &str) -> bool {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.contains(needle))
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let requests_bg = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let requests = Arc::clone(&requests_bg);
            thread::spawn(move || handle(stream, &body, opts, &requests));
        }
    });
    RangeServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    requests: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s.to_string(),
        Err(_) => return,
    };
    requests.lock().unwrap().push(request.clone());

    if opts.response_delay_ms > 0 {
        thread::sleep(Duration::from_millis(opts.response_delay_ms));
    }

    let (method, range) = parse_request(&request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    if opts.force_status != 0 {
        let message = b"error page";
        let response = format!(
            "HTTP/1.1 {} Test Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            opts.force_status,
            message.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(message);
        return;
    }

    let total = body.len() as u64;
    let (status, extra_headers, slice) = match range {
        Some((start, end_incl)) if opts.support_ranges => {
            let start = start.min(total);
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl {
                (
                    "416 Range Not Satisfiable".to_string(),
                    format!("Content-Range: bytes */{}\r\n", total),
                    &body[0..0],
                )
            } else {
                let start_us = start as usize;
                let end_excl = (end_incl + 1).min(total) as usize;
                (
                    "206 Partial Content".to_string(),
                    format!(
                        "Content-Range: bytes {}-{}/{}\r\n",
                        start_us,
                        end_excl - 1,
                        total
                    ),
                    &body[start_us..end_excl],
                )
            }
        }
        _ => ("200 OK".to_string(), String::new(), body),
    };

    let mut headers = String::new();
    if opts.send_length {
        headers.push_str(&format!("Content-Length: {}\r\n", slice.len()));
    }
    headers.push_str(&extra_headers);
    if opts.support_ranges {
        headers.push_str("Accept-Ranges: bytes\r\n");
    }
    if let Some(ct) = opts.content_type {
        headers.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    headers.push_str("Connection: close\r\n");

    let response = format!("HTTP/1.1 {}\r\n{}\r\n", status, headers);
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Returns (method, optional (start, end_inclusive) for `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
