//! Fetch configuration

/// Knobs for the network pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Round trips allowed per fetch, the initial request included
    pub max_redirects: usize,
    /// Product token sent as User-Agent
    pub user_agent: String,
    /// Advertise `Accept-Encoding: gzip`
    pub accept_gzip: bool,
    /// Request persistent connections where the scheme allows it
    pub keep_alive: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
            accept_gzip: true,
            keep_alive: true,
        }
    }
}
