//! Error types for the fetch engine

use thiserror::Error;

/// Every way a fetch can fail.
///
/// All variants are fatal for the fetch that produced them; retrying means
/// starting a new fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed
    #[error("malformed URL '{0}'")]
    MalformedUrl(String),
    /// `view-source:` prefix without a target behind it
    #[error("invalid view-source URL '{0}'")]
    InvalidViewSource(String),
    /// Scheme outside http, https, file and data
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    /// `data:` URL without the comma separating metadata from content
    #[error("invalid data URL '{0}'")]
    InvalidDataUrl(String),
    /// Dial or TLS handshake failure
    #[error("connection to {host}:{port} failed: {reason}")]
    ConnectionError {
        host: String,
        port: u16,
        reason: String,
    },
    /// Status line without a space separator
    #[error("malformed status line '{0}'")]
    MalformedStatusLine(String),
    /// Status code is not numeric
    #[error("invalid status '{0}'")]
    InvalidStatus(String),
    /// Any transfer-encoding header, chunked or not
    #[error("unsupported transfer-encoding '{0}'")]
    TransferEncodingUnsupported(String),
    /// Keep-alive response that does not say how long its body is
    #[error("keep-alive response is missing content-length")]
    MissingContentLength,
    /// Content-length header that is not a byte count
    #[error("invalid content-length '{0}'")]
    InvalidContentLength(String),
    /// Redirect chain reached the configured maximum
    #[error("redirect limit of {0} reached")]
    RedirectLoop(usize),
    /// 3xx response without somewhere to go
    #[error("redirect response is missing a location header")]
    MissingLocationHeader,
    /// Corrupt compressed body
    #[error("failed to decode body: {0}")]
    DecodeError(String),
    /// Socket or filesystem I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Build a connection error for a host/port pair
    pub fn connection(host: &str, port: u16, reason: impl ToString) -> Self {
        Self::ConnectionError {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
