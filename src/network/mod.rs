//! Network stack
//!
//! HTTP/1.1 over plain TCP or rustls, with per-fetch connection reuse,
//! redirect following, gzip decoding and a max-age response cache.

pub mod cache;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod redirect;
pub mod request;
pub mod response;
pub mod session;
pub mod target;

pub use cache::{Cache, CacheControl, CacheEntry, HttpCache};
pub use config::FetchConfig;
pub use connection::{Connection, ConnectionKey, Connector, TcpConnector, Transport};
pub use request::{Method, Request};
pub use response::{Headers, Response, ResponseHead};
pub use session::{Exchange, FetchSession};
pub use target::{Scheme, Target};

use crate::utils::Result;

/// Run the full network pipeline for an http/https target: cache lookup,
/// request/redirect loop, decoding, cache store.
pub fn fetch(
    target: Target,
    connector: &dyn Connector,
    cache: &dyn Cache,
    config: &FetchConfig,
) -> Result<Response> {
    let key = target.cache_key();
    if let Some(response) = cache.get(&key) {
        return Ok(response);
    }
    log::debug!("cache miss for {}", key);

    let mut session = FetchSession::new(target, config.keep_alive);
    let response = redirect::follow(&mut session, connector, config)?;
    let response = decoder::decode(response)?;

    if let Some(ttl) = CacheControl::ttl_for(&response) {
        cache.put(&key, response.clone(), ttl);
    }

    Ok(response)
}
