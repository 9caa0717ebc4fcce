//! Per-fetch mutable state
//!
//! A [`FetchSession`] lives for one top-level fetch and every redirect hop
//! it triggers. It owns at most one open connection and decides, hop by
//! hop, whether that connection may be reused.

use super::config::FetchConfig;
use super::connection::{Connection, ConnectionKey, Connector};
use super::request::Request;
use super::response::{read_body, read_head, Response, ResponseHead};
use super::target::Target;
use crate::utils::{FetchError, Result};

/// A request that has been answered up to the end of its header block
#[derive(Debug)]
pub struct Exchange {
    conn: Connection,
    head: ResponseHead,
    negotiated: bool,
}

impl Exchange {
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }
}

#[derive(Debug)]
pub struct FetchSession {
    current: Target,
    view_source: bool,
    /// Keep-alive allowed at all: config switch AND scheme eligibility
    keep_alive_policy: bool,
    /// Keep-alive requested on the current hop
    keep_alive: bool,
    connection: Option<Connection>,
    redirects: usize,
}

impl FetchSession {
    pub fn new(target: Target, keep_alive: bool) -> Self {
        let keep_alive = keep_alive && target.keep_alive_eligible();
        Self {
            view_source: target.view_source(),
            current: target,
            keep_alive_policy: keep_alive,
            keep_alive,
            connection: None,
            redirects: 0,
        }
    }

    /// Target of the hop in progress
    pub fn current(&self) -> &Target {
        &self.current
    }

    pub fn redirects(&self) -> usize {
        self.redirects
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Whether a connection is being held for reuse
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// Send one request to the current target and read the status line and
    /// headers. The body is left on the wire for [`finish`](Self::finish)
    /// or [`discard`](Self::discard).
    pub fn send(
        &mut self,
        connector: &dyn Connector,
        config: &FetchConfig,
    ) -> Result<Exchange> {
        let mut conn = self.checkout(connector)?;

        let request = Request::for_target(
            &self.current,
            self.keep_alive,
            &config.user_agent,
            config.accept_gzip,
        );
        log::debug!(
            "{} (host {})",
            request.request_line(),
            self.current.authority()
        );
        conn.send(&request.to_bytes())?;

        let head = read_head(conn.reader())?;
        let negotiated = self.keep_alive && !head.connection_close();
        log::debug!(
            "{} {} from {} (keep-alive: {})",
            head.status,
            head.reason,
            self.current,
            negotiated
        );

        Ok(Exchange {
            conn,
            head,
            negotiated,
        })
    }

    /// Read the body of a final response, holding the connection for reuse
    /// when keep-alive was negotiated
    pub fn finish(&mut self, exchange: Exchange) -> Result<Response> {
        let Exchange {
            mut conn,
            head,
            negotiated,
        } = exchange;

        let body = read_body(conn.reader(), &head.headers, negotiated)?;
        if negotiated {
            self.connection = Some(conn);
        }

        Ok(Response::from_head(head, body, self.view_source, negotiated))
    }

    /// Skip the body of a redirect.
    ///
    /// The connection is kept only when the body is framed by a valid
    /// content-length and reads cleanly; anything else just drops it so the
    /// next hop dials fresh.
    pub fn discard(&mut self, exchange: Exchange) {
        let Exchange {
            mut conn,
            head,
            negotiated,
        } = exchange;

        if !negotiated || !head.headers.contains_key("content-length") {
            log::debug!("not reusing connection after unframed redirect");
            return;
        }
        match read_body(conn.reader(), &head.headers, true) {
            Ok(_) => self.connection = Some(conn),
            Err(e) => log::debug!("dropping connection after redirect body: {}", e),
        }
    }

    /// Count one more hop, failing once the count reaches `max_redirects`
    pub fn count_redirect(&mut self, max_redirects: usize) -> Result<()> {
        self.redirects += 1;
        if self.redirects >= max_redirects {
            return Err(FetchError::RedirectLoop(max_redirects));
        }
        Ok(())
    }

    /// Move the session to `next`; returns whether the hop is cross-origin.
    ///
    /// Cross-origin hops drop the held connection and request
    /// `Connection: close`.
    pub fn redirect_to(&mut self, next: Target) -> bool {
        let cross_origin = next.authority() != self.current.authority();
        if cross_origin {
            self.connection = None;
            self.keep_alive = false;
        } else {
            self.keep_alive = self.keep_alive_policy;
        }
        self.current = next;
        cross_origin
    }

    /// Reuse the held connection if it points at the current target,
    /// otherwise dial a new one. The old connection is released either way.
    fn checkout(&mut self, connector: &dyn Connector) -> Result<Connection> {
        let key = ConnectionKey::new(
            self.current.scheme(),
            self.current.dial_host(),
            self.current.port(),
        );

        match self.connection.take() {
            Some(conn) if self.keep_alive && conn.key() == &key => {
                log::debug!("reusing connection to {}:{}", key.host, key.port);
                Ok(conn)
            }
            _ => Connection::open(connector, key),
        }
    }
}
