//! Redirect resolution
//!
//! Drives a session through `Fetching -> Redirecting -> Fetching ...` until
//! a non-3xx response arrives or the hop bound is hit.

use super::config::FetchConfig;
use super::connection::Connector;
use super::response::{Response, ResponseHead};
use super::session::{Exchange, FetchSession};
use super::target::Target;
use crate::utils::{FetchError, Result};

/// Where the redirect loop stands
#[derive(Debug)]
pub enum RedirectState {
    /// A request to the session's current target is due
    Fetching,
    /// A 3xx head came back; its body is still unread
    Redirecting(Exchange),
    /// Final, non-redirect response
    Done(Response),
}

/// Fetch the session's target, following redirects.
///
/// A 3xx is judged on its head alone: the hop bound and Location are
/// checked before any of its body is read.
pub fn follow(
    session: &mut FetchSession,
    connector: &dyn Connector,
    config: &FetchConfig,
) -> Result<Response> {
    let mut state = RedirectState::Fetching;

    loop {
        state = match state {
            RedirectState::Fetching => {
                let exchange = session.send(connector, config)?;
                if exchange.head().is_redirect() {
                    RedirectState::Redirecting(exchange)
                } else {
                    RedirectState::Done(session.finish(exchange)?)
                }
            }
            RedirectState::Redirecting(exchange) => {
                session.count_redirect(config.max_redirects)?;
                let next = resolve_location(session.current(), exchange.head())?;
                let status = exchange.head().status;
                session.discard(exchange);

                let from = session.current().to_string();
                let cross_origin = session.redirect_to(next);
                log::debug!(
                    "redirect {} ({}): {} -> {}{}",
                    session.redirects(),
                    status,
                    from,
                    session.current(),
                    if cross_origin { " [cross-origin]" } else { "" }
                );
                RedirectState::Fetching
            }
            RedirectState::Done(response) => return Ok(response),
        };
    }
}

/// Work out where a 3xx response points.
///
/// A Location starting with `/` stays on the current scheme and host;
/// anything else must be an absolute http or https URL.
pub fn resolve_location(current: &Target, head: &ResponseHead) -> Result<Target> {
    let location = head
        .header("location")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(FetchError::MissingLocationHeader)?;

    let absolute = if location.starts_with('/') {
        format!("{}://{}{}", current.scheme(), current.authority(), location)
    } else {
        location.to_string()
    };

    let next = Target::parse_plain(&absolute)?;
    if !next.scheme().is_network() {
        return Err(FetchError::UnsupportedScheme(next.scheme().to_string()));
    }
    Ok(next)
}
