//! Fetch engine
//!
//! The FetchEngine is the single entry point for loading a URL:
//! 1. Resolve the raw string into a Target
//! 2. Dispatch on its scheme
//! 3. http/https go through the network stack (cache, redirects, decoding)
//! 4. file/data are answered locally

mod local;

pub use local::{fetch_data, fetch_file};

use std::sync::Arc;

use crate::network::{
    self, Cache, Connector, FetchConfig, HttpCache, Response, Scheme, Target, TcpConnector,
};
use crate::utils::Result;

/// Loads one URL at a time into a [`Response`]
pub struct FetchEngine {
    config: FetchConfig,
    connector: Arc<dyn Connector>,
    cache: Arc<dyn Cache>,
}

impl FetchEngine {
    /// Engine with real sockets, the default config and an empty cache
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(TcpConnector::new()),
            Arc::new(HttpCache::new()),
        )
    }

    /// Engine with caller-supplied transport and cache
    pub fn with_parts(
        config: FetchConfig,
        connector: Arc<dyn Connector>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            config,
            connector,
            cache,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Get the response cache shared by every fetch of this engine
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Fetch a URL
    pub fn fetch(&self, url: &str) -> Result<Response> {
        let target = Target::parse(url)?;
        log::debug!("fetching {}", target);

        match target.scheme() {
            Scheme::Http | Scheme::Https => network::fetch(
                target,
                self.connector.as_ref(),
                self.cache.as_ref(),
                &self.config,
            ),
            Scheme::File => fetch_file(&target),
            Scheme::Data => fetch_data(&target),
        }
    }
}

impl Default for FetchEngine {
    fn default() -> Self {
        Self::new()
    }
}
