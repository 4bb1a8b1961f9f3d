// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 transport for the automation server API.
//!
//! One request per connection (`Connection: close`). Responses are framed by
//! Content-Length, chunked transfer encoding, or connection close.

use super::JenkinsError;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Where requests go: socket address, Host header, and path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Endpoint {
    pub addr: String,
    pub host: String,
    pub prefix: String,
}

impl Endpoint {
    /// Parse an `http://host[:port][/prefix]` URL.
    pub fn parse(url: &str) -> Result<Self, JenkinsError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| JenkinsError::Transport(format!("unsupported URL '{}'", url)))?;
        let (authority, prefix) = match rest.find('/') {
            Some(i) => (&rest[..i], rest[i..].trim_end_matches('/')),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(JenkinsError::Transport(format!("missing host in '{}'", url)));
        }
        let addr =
            if authority.contains(':') { authority.to_string() } else { format!("{}:80", authority) };
        Ok(Self { addr, host: authority.to_string(), prefix: prefix.to_string() })
    }
}

/// Format a request with basic auth and an optional body.
pub(super) fn format_request(
    method: &str,
    endpoint: &Endpoint,
    path: &str,
    authorization: &str,
    body: Option<(&str, &str)>,
) -> String {
    let mut request = format!(
        "{} {}{} HTTP/1.1\r\nHost: {}\r\nAuthorization: {}\r\nConnection: close\r\n",
        method, endpoint.prefix, path, endpoint.host, authorization
    );
    match body {
        Some((content_type, body)) => {
            request.push_str(&format!(
                "Content-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
                content_type,
                body.len(),
                body
            ));
        }
        None => request.push_str("Content-Length: 0\r\n\r\n"),
    }
    request
}

/// Percent-encode pairs as `application/x-www-form-urlencoded`.
pub(super) fn form_encode<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a path segment or form value.
pub(super) fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Connect, send, and read with a timeout covering the entire exchange.
pub(super) async fn send(
    addr: &str,
    request: &str,
    timeout: Duration,
) -> Result<HttpResponse, JenkinsError> {
    tokio::time::timeout(timeout, send_request(addr, request))
        .await
        .map_err(|_| JenkinsError::Transport("HTTP request timed out".into()))?
}

async fn send_request(addr: &str, request: &str) -> Result<HttpResponse, JenkinsError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| JenkinsError::Transport(format!("TCP connect to {} failed: {}", addr, e)))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| JenkinsError::Transport(format!("write failed: {}", e)))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub(super) async fn read_http_response<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<HttpResponse, JenkinsError> {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| JenkinsError::Transport(format!("read status failed: {}", e)))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| JenkinsError::Transport(format!("bad status line '{}'", status_line.trim())))?;

    // Headers (case-insensitive)
    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read header failed: {}", e)))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().ok();
        } else if let Some(val) = line_lower.strip_prefix("transfer-encoding:") {
            chunked = val.trim() == "chunked";
        }
    }

    let bytes = if chunked {
        read_chunked(reader).await?
    } else if let Some(len) = content_length {
        let mut buf = vec![0u8; len];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read body failed: {}", e)))?;
        buf
    } else {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read body failed: {}", e)))?;
        buf
    };

    Ok(HttpResponse { status, body: String::from_utf8_lossy(&bytes).into_owned() })
}

async fn read_chunked<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Vec<u8>, JenkinsError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader
            .read_line(&mut size_line)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read chunk size failed: {}", e)))?;
        // Chunk extensions follow ';'
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| JenkinsError::Transport(format!("bad chunk size '{}'", size_hex)))?;
        if size == 0 {
            break;
        }
        let mut chunk = vec![0u8; size + 2];
        reader
            .read_exact(&mut chunk)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read chunk failed: {}", e)))?;
        chunk.truncate(size);
        body.extend_from_slice(&chunk);
    }
    // Trailers
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| JenkinsError::Transport(format!("read trailer failed: {}", e)))?;
        if n == 0 || line == "\r\n" {
            break;
        }
    }
    Ok(body)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
