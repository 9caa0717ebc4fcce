//! URL resolution
//!
//! Turns a raw URL string into a [`Target`]: the parsed URL plus the fetch
//! policy its scheme implies. A `view-source:` prefix is unwrapped here and
//! only survives as a flag.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::utils::{FetchError, Result};

const VIEW_SOURCE: &str = "view-source";

/// Schemes the engine knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
}

impl Scheme {
    /// Parse a lower-cased scheme name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "file" => Ok(Self::File),
            "data" => Ok(Self::Data),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::File => "file",
            Self::Data => "data",
        }
    }

    /// Whether fetching this scheme goes over a socket
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }

    /// Well-known port for network schemes
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Http => Some(80),
            Self::Https => Some(443),
            Self::File | Self::Data => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved URL plus the policy derived from its scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    scheme: Scheme,
    /// Input text after unwrapping `view-source:`; data URLs read their
    /// content from here so the url crate's serialization never touches it.
    source: String,
    view_source: bool,
    keep_alive_eligible: bool,
}

impl Target {
    /// Resolve a raw URL, unwrapping a `view-source:` prefix
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if let Some(rest) = strip_prefix_ignore_case(raw, VIEW_SOURCE) {
            if rest.is_empty() {
                return Err(FetchError::InvalidViewSource(raw.to_string()));
            }
            if let Some(inner) = rest.strip_prefix(':') {
                let mut target = Self::parse_plain(inner).map_err(|e| match e {
                    FetchError::MalformedUrl(_) | FetchError::UnsupportedScheme(_) => {
                        FetchError::InvalidViewSource(raw.to_string())
                    }
                    other => other,
                })?;
                if !target.scheme.is_network() {
                    return Err(FetchError::InvalidViewSource(raw.to_string()));
                }
                target.view_source = true;
                return Ok(target);
            }
        }

        Self::parse_plain(raw)
    }

    /// Resolve a URL that must not carry a `view-source:` prefix
    pub fn parse_plain(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| FetchError::MalformedUrl(format!("{raw}: {e}")))?;
        let scheme = Scheme::parse(url.scheme())?;

        if scheme.is_network() && url.host_str().is_none() {
            return Err(FetchError::MalformedUrl(raw.to_string()));
        }

        Ok(Self {
            url,
            scheme,
            source: raw.to_string(),
            view_source: false,
            keep_alive_eligible: scheme.is_network(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host name as written in the URL (empty for file and data)
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// Host name suitable for DNS and TLS server names (no IPv6 brackets)
    pub fn dial_host(&self) -> &str {
        self.host().trim_start_matches('[').trim_end_matches(']')
    }

    /// Explicit port or the scheme default
    pub fn port(&self) -> u16 {
        self.url
            .port()
            .or_else(|| self.scheme.default_port())
            .unwrap_or(0)
    }

    /// `host[:port]` as sent in the Host header; the port only when explicit
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }

    /// Path plus query, as it goes on the request line
    pub fn request_target(&self) -> String {
        let path = match self.url.path() {
            "" => "/",
            path => path,
        };
        match self.url.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        }
    }

    /// Key under which responses for this target are cached
    pub fn cache_key(&self) -> String {
        if self.view_source {
            format!("{VIEW_SOURCE}:{}", self.url)
        } else {
            self.url.to_string()
        }
    }

    /// Everything after the first comma of a data URL
    pub fn data_content(&self) -> Result<&str> {
        let (_, data) = self
            .source
            .split_once(':')
            .ok_or_else(|| FetchError::InvalidDataUrl(self.source.clone()))?;
        let (_, content) = data
            .split_once(',')
            .ok_or_else(|| FetchError::InvalidDataUrl(self.source.clone()))?;
        Ok(content)
    }

    /// Local path of a file URL
    pub fn file_path(&self) -> Result<PathBuf> {
        self.url
            .to_file_path()
            .map_err(|_| FetchError::MalformedUrl(self.url.to_string()))
    }

    pub fn view_source(&self) -> bool {
        self.view_source
    }

    pub fn keep_alive_eligible(&self) -> bool {
        self.keep_alive_eligible
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.view_source {
            write!(f, "{VIEW_SOURCE}:")?;
        }
        write!(f, "{}", self.url)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
