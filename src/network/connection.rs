//! Transport connections
//!
//! A [`Connector`] dials byte-stream transports; [`TcpConnector`] is the
//! real one (plain TCP, or TCP wrapped in rustls for https). A
//! [`Connection`] is a dialed transport tagged with where it goes, so a
//! session can tell whether it may be reused for the next hop.

use std::io::{self, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use super::target::Scheme;
use crate::utils::{FetchError, Result};

/// Anything a request can be written to and a response read from
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// Opens transports to a host
pub trait Connector: Send + Sync {
    /// Dial `host:port`, completing any TLS handshake before returning
    fn dial(&self, scheme: Scheme, host: &str, port: u16) -> Result<Box<dyn Transport>>;
}

/// Identity of the far end of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl ConnectionKey {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }
}

/// An open transport and the endpoint it was dialed to
pub struct Connection {
    key: ConnectionKey,
    reader: BufReader<Box<dyn Transport>>,
}

impl Connection {
    /// Dial a fresh connection through `connector`
    pub fn open(connector: &dyn Connector, key: ConnectionKey) -> Result<Self> {
        log::debug!("dialing {}://{}:{}", key.scheme, key.host, key.port);
        let transport = connector.dial(key.scheme, &key.host, key.port)?;
        Ok(Self {
            key,
            reader: BufReader::new(transport),
        })
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Write a complete request
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let transport = self.reader.get_mut();
        transport.write_all(bytes)?;
        transport.flush()?;
        Ok(())
    }

    /// Buffered read side of the transport
    pub fn reader(&mut self) -> &mut BufReader<Box<dyn Transport>> {
        &mut self.reader
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("key", &self.key).finish()
    }
}

/// Plain or TLS-wrapped TCP stream
enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => match stream.read(buf) {
                // Peers that close without close_notify still ended the body
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                other => other,
            },
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Dials real sockets, validating TLS against the platform trust store
pub struct TcpConnector {
    tls: Arc<ClientConfig>,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self {
            tls: Self::create_client_config(),
        }
    }

    /// Use a caller-built TLS configuration (custom roots, ALPN, ...)
    pub fn with_tls_config(tls: Arc<ClientConfig>) -> Self {
        Self { tls }
    }

    fn create_client_config() -> Arc<ClientConfig> {
        // Install ring as the default crypto provider
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for err in &native.errors {
            log::warn!("failed to load native root certificate: {}", err);
        }
        let (added, ignored) = roots.add_parsable_certificates(native.certs);
        log::debug!("loaded {} native root certificates ({} ignored)", added, ignored);

        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Arc::new(config)
    }

    fn handshake(&self, host: &str, port: u16, mut tcp: TcpStream) -> Result<Stream> {
        let name = ServerName::try_from(host.to_string())
            .map_err(|e| FetchError::connection(host, port, e))?;
        let mut conn = ClientConnection::new(Arc::clone(&self.tls), name)
            .map_err(|e| FetchError::connection(host, port, e))?;

        while conn.is_handshaking() {
            conn.complete_io(&mut tcp)
                .map_err(|e| FetchError::connection(host, port, e))?;
        }

        Ok(Stream::Tls(Box::new(StreamOwned::new(conn, tcp))))
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TcpConnector {
    fn dial(&self, scheme: Scheme, host: &str, port: u16) -> Result<Box<dyn Transport>> {
        if !scheme.is_network() {
            return Err(FetchError::UnsupportedScheme(scheme.to_string()));
        }

        let tcp =
            TcpStream::connect((host, port)).map_err(|e| FetchError::connection(host, port, e))?;

        let stream = match scheme {
            Scheme::Https => self.handshake(host, port, tcp)?,
            _ => Stream::Plain(tcp),
        };
        Ok(Box::new(stream))
    }
}
