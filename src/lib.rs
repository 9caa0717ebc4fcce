//! # Binix Fetch - single-URL fetch engine
//!
//! Loads the content behind one absolute URL and hands back a structured
//! [`Response`] for a renderer to display.
//!
//! ## Architecture
//!
//! - **engine**: entry point; resolves the URL and dispatches on its scheme
//! - **network**: HTTP/1.1 over TCP/TLS with connection reuse, redirects,
//!   gzip decoding and a max-age cache
//! - **renderer**: plain-text view of a response body
//! - **utils**: shared error types
//!
//! ```no_run
//! use binix_fetch::FetchEngine;
//!
//! let engine = FetchEngine::new();
//! let response = engine.fetch("http://example.org/index.html")?;
//! println!("{}", binix_fetch::renderer::show(&response));
//! # Ok::<(), binix_fetch::FetchError>(())
//! ```

pub mod engine;
pub mod network;
pub mod renderer;
pub mod utils;

// Re-export main types for convenience
pub use engine::FetchEngine;
pub use network::{FetchConfig, Response};
pub use utils::error::{FetchError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "binix-fetch";
