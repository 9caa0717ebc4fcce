//! HTTP request types

use std::fmt::Write as _;

use super::target::Target;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
        }
    }
}

/// An HTTP/1.1 request ready to be written to a connection
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
}

impl Request {
    /// Create a GET request for a path
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    /// Build the request for one hop to `target`
    pub fn for_target(target: &Target, keep_alive: bool, user_agent: &str, gzip: bool) -> Self {
        let request = Self::get(target.request_target())
            .header("Host", target.authority())
            .header("User-Agent", user_agent)
            .header("Connection", if keep_alive { "keep-alive" } else { "close" });

        if gzip {
            request.header("Accept-Encoding", "gzip")
        } else {
            request
        }
    }

    /// Set a header, replacing any existing one with the same name in any case
    pub fn header(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        let key = key.into();
        let value = value.as_ref().trim().to_string();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Look up a header case-insensitively
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Request line
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method.as_str(), self.path)
    }

    /// Serialize to the bytes that go on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.request_line();
        out.push_str("\r\n");
        for (key, value) in &self.headers {
            let _ = write!(out, "{key}: {value}\r\n");
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}
