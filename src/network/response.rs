//! HTTP response types and the HTTP/1.1 response parser

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Read};

use crate::utils::{FetchError, Result};

/// Response headers: lower-cased keys, last write wins
pub type Headers = HashMap<String, String>;

/// Status line and headers, before the body has been read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub protocol: String,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
}

impl ResponseHead {
    /// Get a header by its lower-case name
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    /// Check if the response is a redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Whether the server refused to keep the connection open
    pub fn connection_close(&self) -> bool {
        self.header("connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }
}

/// Read the status line and header block
pub fn read_head<R: BufRead>(reader: &mut R) -> Result<ResponseHead> {
    let (protocol, status, reason) = read_status_line(reader)?;
    let headers = read_headers(reader)?;
    Ok(ResponseHead {
        protocol,
        status,
        reason,
        headers,
    })
}

/// Read `<proto> <code> [reason]`
pub fn read_status_line<R: BufRead>(reader: &mut R) -> Result<(String, u16, String)> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before status line",
        )
        .into());
    }
    let line = String::from_utf8_lossy(&raw);
    let line = line.trim_end_matches(['\r', '\n']);

    let (protocol, rest) = line
        .split_once(' ')
        .ok_or_else(|| FetchError::MalformedStatusLine(line.to_string()))?;

    let rest = rest.trim_start();
    let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    let status = code
        .parse::<u16>()
        .map_err(|_| FetchError::InvalidStatus(code.to_string()))?;

    Ok((protocol.to_string(), status, reason.trim().to_string()))
}

/// Read header lines up to the blank line that ends the block
pub fn read_headers<R: BufRead>(reader: &mut R) -> Result<Headers> {
    let mut headers = Headers::new();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }

        match line.split_once(':') {
            Some((key, value)) => {
                headers.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            None => log::warn!("skipping header line without a colon: {:?}", line),
        }
    }

    if let Some(encoding) = headers.get("transfer-encoding") {
        return Err(FetchError::TransferEncodingUnsupported(encoding.clone()));
    }

    Ok(headers)
}

/// Read the body that follows a header block.
///
/// With keep-alive the body is exactly `content-length` bytes; without it
/// the body runs to the end of the stream.
pub fn read_body<R: BufRead>(
    reader: &mut R,
    headers: &Headers,
    keep_alive: bool,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    if !keep_alive {
        reader.read_to_end(&mut body)?;
        return Ok(body);
    }

    let raw = headers
        .get("content-length")
        .ok_or(FetchError::MissingContentLength)?;
    let length: u64 = raw
        .trim()
        .parse()
        .map_err(|_| FetchError::InvalidContentLength(raw.clone()))?;

    reader.take(length).read_to_end(&mut body)?;
    if (body.len() as u64) < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("body ended after {} of {} bytes", body.len(), length),
        )
        .into());
    }
    Ok(body)
}

/// A complete response handed to the renderer.
///
/// Responses for `file:` and `data:` URLs never touched the network: their
/// protocol and reason are empty, the status is 0 and there are no headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    protocol: String,
    status: u16,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
    view_source: bool,
    keep_alive: bool,
}

impl Response {
    /// Assemble a network response from its parsed parts
    pub fn from_head(
        head: ResponseHead,
        body: Vec<u8>,
        view_source: bool,
        keep_alive: bool,
    ) -> Self {
        Self {
            protocol: head.protocol,
            status: head.status,
            reason: head.reason,
            headers: head.headers,
            body,
            view_source,
            keep_alive,
        }
    }

    /// A response produced without any network activity
    pub fn local(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub(crate) fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response is a redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Get response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a specific header by lower-case name
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn view_source(&self) -> bool {
        self.view_source
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protocol: {}", self.protocol)?;
        writeln!(f, "Status: {} {}", self.status, self.reason)?;
        writeln!(f, "Headers:")?;
        let mut keys: Vec<_> = self.headers.keys().collect();
        keys.sort();
        for key in keys {
            writeln!(f, "\t{}: {}", key, self.headers[key])?;
        }
        write!(f, "Content:\n{}", self.text())
    }
}
