//! HTTP Cache implementation
//!
//! A response is cacheable when its status is exactly 200 and it carries a
//! `Cache-Control: max-age=N` directive. Entries expire lazily: a lookup
//! that finds a stale entry evicts it, nothing sweeps in the background.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::response::Response;

/// Storage seam for cached responses
#[cfg_attr(test, mockall::automock)]
pub trait Cache: Send + Sync {
    /// Fresh response for `key`, evicting it first if it has expired
    fn get(&self, key: &str) -> Option<Response>;

    /// Store `response` under `key` for `ttl`
    fn put(&self, key: &str, response: Response, ttl: Duration);
}

/// Cache entry representing a cached response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// When this entry stops being served
    pub expires_at: Instant,
    /// Cached response, returned unchanged on a hit
    pub response: Response,
}

impl CacheEntry {
    pub fn new(response: Response, ttl: Duration) -> Self {
        Self {
            expires_at: Instant::now() + ttl,
            response,
        }
    }

    /// Check if this entry is still fresh
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Outcome of reading `max-age` from a Cache-Control header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    /// No max-age directive at all
    Absent,
    /// Directive present but its value is not a number of seconds
    Invalid,
    Seconds(u64),
}

/// Cache-Control directive parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: MaxAge,
}

impl CacheControl {
    /// Parse Cache-Control header value
    pub fn parse(header: &str) -> Self {
        let mut max_age = MaxAge::Absent;

        for directive in header.split(',') {
            let directive = directive.trim();
            let (name, value) = directive.split_once('=').unwrap_or((directive, ""));
            if name.trim().eq_ignore_ascii_case("max-age") {
                max_age = value
                    .trim()
                    .trim_matches('"')
                    .parse()
                    .map(MaxAge::Seconds)
                    .unwrap_or(MaxAge::Invalid);
            }
        }

        Self { max_age }
    }

    /// Lifetime of a cacheable 200 response, if it has one.
    ///
    /// An unparsable max-age is logged and the response simply goes
    /// uncached.
    pub fn ttl_for(response: &Response) -> Option<Duration> {
        if response.status() != 200 {
            return None;
        }
        let header = response.header("cache-control")?;
        match Self::parse(header).max_age {
            MaxAge::Seconds(secs) => Some(Duration::from_secs(secs)),
            MaxAge::Invalid => {
                log::warn!("max-age in '{}' is not valid, not caching", header);
                None
            }
            MaxAge::Absent => None,
        }
    }
}

/// Unbounded in-memory cache guarded by a lock
pub struct HttpCache {
    /// Cached entries by URL
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl HttpCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for HttpCache {
    fn get(&self, key: &str) -> Option<Response> {
        {
            let entries = self.entries.read().ok()?;
            let entry = entries.get(key)?;
            if entry.is_fresh() {
                log::debug!("cache hit for {}", key);
                return Some(entry.response.clone());
            }
        }

        log::debug!("evicting stale cache entry for {}", key);
        if let Ok(mut entries) = self.entries.write() {
            // Another caller may have refreshed it between the two locks
            if entries.get(key).is_some_and(|e| !e.is_fresh()) {
                entries.remove(key);
            }
        }
        None
    }

    fn put(&self, key: &str, response: Response, ttl: Duration) {
        log::debug!("caching {} for {}s", key, ttl.as_secs());
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), CacheEntry::new(response, ttl));
        }
    }
}
