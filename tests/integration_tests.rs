//! Integration tests for the fetch engine
//!
//! These drive the whole pipeline through a scripted in-memory connector
//! that records every dial and every request it sees.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use binix_fetch::network::{Connector, HttpCache, Scheme, Transport};
use binix_fetch::{FetchConfig, FetchEngine, FetchError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<Vec<u8>>>,
    dials: Vec<(String, u16)>,
    requests: Vec<(String, String)>,
}

/// Connector whose servers answer from a per-host queue of canned responses
#[derive(Clone, Default)]
struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    fn respond(&self, host: &str, response: Vec<u8>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .entry(host.to_string())
            .or_default()
            .push_back(response);
        self
    }

    fn dials(&self) -> Vec<(String, u16)> {
        self.script.lock().unwrap().dials.clone()
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl Connector for ScriptedConnector {
    fn dial(
        &self,
        _scheme: Scheme,
        host: &str,
        port: u16,
    ) -> binix_fetch::Result<Box<dyn Transport>> {
        self.script
            .lock()
            .unwrap()
            .dials
            .push((host.to_string(), port));
        Ok(Box::new(ScriptedTransport {
            host: host.to_string(),
            script: Arc::clone(&self.script),
            pending: Vec::new(),
            inbox: VecDeque::new(),
        }))
    }
}

struct ScriptedTransport {
    host: String,
    script: Arc<Mutex<Script>>,
    pending: Vec<u8>,
    inbox: VecDeque<u8>,
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        if self.pending.ends_with(b"\r\n\r\n") {
            let request = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();

            let mut script = self.script.lock().unwrap();
            script.requests.push((self.host.clone(), request));
            if let Some(response) = script
                .responses
                .get_mut(&self.host)
                .and_then(|queue| queue.pop_front())
            {
                self.inbox.extend(response);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inbox.read(buf)
    }
}

fn http(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    for (key, value) in headers {
        out.push_str(&format!("{}: {}\r\n", key, value));
    }
    out.push_str("\r\n");
    let mut out = out.into_bytes();
    out.extend_from_slice(body);
    out
}

fn ok(body: &str, extra: &[(&str, &str)]) -> Vec<u8> {
    let length = body.len().to_string();
    let mut headers = vec![("Content-Length", length.as_str())];
    headers.extend_from_slice(extra);
    http("200 OK", &headers, body.as_bytes())
}

fn redirect(location: &str) -> Vec<u8> {
    http(
        "302 Found",
        &[("Location", location), ("Content-Length", "0")],
        b"",
    )
}

fn engine(connector: &ScriptedConnector) -> FetchEngine {
    engine_with(connector, FetchConfig::default())
}

fn engine_with(connector: &ScriptedConnector, config: FetchConfig) -> FetchEngine {
    FetchEngine::with_parts(
        config,
        Arc::new(connector.clone()),
        Arc::new(HttpCache::new()),
    )
}

#[test]
fn test_simple_get() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", ok("<html>hi</html>", &[("Content-Type", "text/html")]));

    let response = engine(&connector)
        .fetch("http://example.org/index.html")
        .unwrap();

    assert_eq!(response.protocol(), "HTTP/1.1");
    assert_eq!(response.status(), 200);
    assert_eq!(response.reason(), "OK");
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert_eq!(response.text(), "<html>hi</html>");
    assert!(response.keep_alive());
    assert!(!response.view_source());

    assert_eq!(connector.dials(), vec![("example.org".to_string(), 80)]);
    let (_, request) = &connector.requests()[0];
    assert!(request.starts_with("GET /index.html HTTP/1.1\r\n"));
    assert!(request.contains("Host: example.org\r\n"));
    assert!(request.contains("Connection: keep-alive\r\n"));
    assert!(request.contains("Accept-Encoding: gzip\r\n"));
}

#[test]
fn test_cacheable_response_fetched_once() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", ok("cached", &[("Cache-Control", "max-age=60")]));
    let engine = engine(&connector);

    let first = engine.fetch("http://example.org/").unwrap();
    let second = engine.fetch("http://example.org/").unwrap();

    assert_eq!(first, second);
    assert_eq!(connector.requests().len(), 1);
    assert_eq!(connector.dials().len(), 1);
}

#[test]
fn test_expired_entry_refetched() {
    let connector = ScriptedConnector::default();
    connector
        .respond("example.org", ok("one", &[("Cache-Control", "max-age=0")]))
        .respond("example.org", ok("two", &[("Cache-Control", "max-age=0")]));
    let engine = engine(&connector);

    assert_eq!(engine.fetch("http://example.org/").unwrap().text(), "one");
    assert_eq!(engine.fetch("http://example.org/").unwrap().text(), "two");
    assert_eq!(connector.requests().len(), 2);
}

#[test]
fn test_invalid_max_age_is_not_fatal() {
    let connector = ScriptedConnector::default();
    connector
        .respond("example.org", ok("one", &[("Cache-Control", "max-age=forever")]))
        .respond("example.org", ok("two", &[]));
    let engine = engine(&connector);

    assert_eq!(engine.fetch("http://example.org/").unwrap().text(), "one");
    assert_eq!(engine.fetch("http://example.org/").unwrap().text(), "two");
}

#[test]
fn test_non_200_not_cached() {
    let connector = ScriptedConnector::default();
    connector
        .respond(
            "example.org",
            http(
                "404 Not Found",
                &[("Cache-Control", "max-age=60"), ("Content-Length", "0")],
                b"",
            ),
        )
        .respond("example.org", ok("found", &[]));
    let engine = engine(&connector);

    assert_eq!(engine.fetch("http://example.org/").unwrap().status(), 404);
    assert_eq!(engine.fetch("http://example.org/").unwrap().status(), 200);
}

#[test]
fn test_redirect_loop_bounded() {
    let connector = ScriptedConnector::default();
    for _ in 0..10 {
        connector.respond("loop.test", redirect("/again"));
    }

    let err = engine(&connector).fetch("http://loop.test/").unwrap_err();

    assert!(matches!(err, FetchError::RedirectLoop(5)));
    assert_eq!(connector.requests().len(), 5);
}

#[test]
fn test_redirect_bound_follows_config() {
    let connector = ScriptedConnector::default();
    for _ in 0..10 {
        connector.respond("loop.test", redirect("/again"));
    }
    let config = FetchConfig {
        max_redirects: 2,
        ..FetchConfig::default()
    };

    let err = engine_with(&connector, config)
        .fetch("http://loop.test/")
        .unwrap_err();

    assert!(matches!(err, FetchError::RedirectLoop(2)));
    assert_eq!(connector.requests().len(), 2);
}

#[test]
fn test_same_origin_redirect_reuses_connection() {
    let connector = ScriptedConnector::default();
    connector
        .respond("a.test", redirect("/next"))
        .respond("a.test", ok("landed", &[]));

    let response = engine(&connector).fetch("http://a.test/start").unwrap();

    assert_eq!(response.text(), "landed");
    assert_eq!(connector.dials().len(), 1);
    let requests = connector.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].1.starts_with("GET /next HTTP/1.1\r\n"));
    assert!(requests[1].1.contains("Connection: keep-alive\r\n"));
}

#[test]
fn test_cross_origin_redirect_dials_fresh_connection() {
    let connector = ScriptedConnector::default();
    connector
        .respond("host1.test", redirect("http://host2.test/landing"))
        // Connection: close hop, body framed by end of stream
        .respond("host2.test", http("200 OK", &[], b"over there"));

    let response = engine(&connector).fetch("http://host1.test/").unwrap();

    assert_eq!(response.text(), "over there");
    assert!(!response.keep_alive());
    assert_eq!(
        connector.dials(),
        vec![
            ("host1.test".to_string(), 80),
            ("host2.test".to_string(), 80),
        ]
    );
    let requests = connector.requests();
    assert_eq!(requests[1].0, "host2.test");
    assert!(requests[1].1.contains("Host: host2.test\r\n"));
    assert!(requests[1].1.contains("Connection: close\r\n"));
}

#[test]
fn test_redirect_without_location() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", http("302 Found", &[("Content-Length", "0")], b""));

    let err = engine(&connector).fetch("http://example.org/").unwrap_err();
    assert!(matches!(err, FetchError::MissingLocationHeader));
}

#[test]
fn test_unframed_redirect_without_location() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", http("302 Found", &[], b""));

    let err = engine(&connector).fetch("http://example.org/").unwrap_err();

    assert!(matches!(err, FetchError::MissingLocationHeader), "got {:?}", err);
    assert_eq!(connector.requests().len(), 1);
}

#[test]
fn test_unframed_redirect_chain_bounded() {
    let connector = ScriptedConnector::default();
    for _ in 0..12 {
        connector.respond("loop.test", http("301 Moved", &[("Location", "/again")], b""));
    }

    let err = engine(&connector).fetch("http://loop.test/").unwrap_err();

    assert!(matches!(err, FetchError::RedirectLoop(5)), "got {:?}", err);
    assert!(connector.requests().len() <= 5);
}

#[test]
fn test_unframed_redirect_dials_fresh_for_next_hop() {
    let connector = ScriptedConnector::default();
    connector
        .respond("a.test", http("302 Found", &[("Location", "/next")], b""))
        .respond("a.test", ok("landed", &[]));

    let response = engine(&connector).fetch("http://a.test/").unwrap();

    assert_eq!(response.text(), "landed");
    assert_eq!(connector.dials().len(), 2);
    assert!(connector.requests()[1].1.starts_with("GET /next HTTP/1.1\r\n"));
}

#[test]
fn test_transfer_encoding_always_rejected() {
    for status in ["200 OK", "404 Not Found", "301 Moved Permanently"] {
        let connector = ScriptedConnector::default();
        connector.respond(
            "example.org",
            http(status, &[("Transfer-Encoding", "chunked")], b"5\r\nhello\r\n0\r\n\r\n"),
        );

        let err = engine(&connector).fetch("http://example.org/").unwrap_err();
        assert!(
            matches!(err, FetchError::TransferEncodingUnsupported(_)),
            "status {} gave {:?}",
            status,
            err
        );
    }
}

#[test]
fn test_keep_alive_requires_content_length() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", http("200 OK", &[], b"unframed"));

    let err = engine(&connector).fetch("http://example.org/").unwrap_err();
    assert!(matches!(err, FetchError::MissingContentLength));
}

#[test]
fn test_keep_alive_disabled_reads_to_close() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", http("200 OK", &[], b"unframed body"));
    let config = FetchConfig {
        keep_alive: false,
        ..FetchConfig::default()
    };

    let response = engine_with(&connector, config)
        .fetch("http://example.org/")
        .unwrap();

    assert_eq!(response.text(), "unframed body");
    assert!(connector.requests()[0].1.contains("Connection: close\r\n"));
}

#[test]
fn test_server_close_overrides_keep_alive() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", http("200 OK", &[("Connection", "close")], b"bye"));

    let response = engine(&connector).fetch("http://example.org/").unwrap();

    assert_eq!(response.text(), "bye");
    assert!(!response.keep_alive());
}

#[test]
fn test_gzip_body_decoded() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let plaintext = "<html><body>compressed page</body></html>";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(plaintext.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    let length = compressed.len().to_string();

    let connector = ScriptedConnector::default();
    connector.respond(
        "example.org",
        http(
            "200 OK",
            &[("Content-Encoding", "gzip"), ("Content-Length", length.as_str())],
            &compressed,
        ),
    );

    let response = engine(&connector).fetch("http://example.org/").unwrap();
    assert_eq!(response.text(), plaintext);
}

#[test]
fn test_corrupt_gzip_fails() {
    let connector = ScriptedConnector::default();
    connector.respond(
        "example.org",
        http(
            "200 OK",
            &[("Content-Encoding", "gzip"), ("Content-Length", "7")],
            b"garbage",
        ),
    );

    let err = engine(&connector).fetch("http://example.org/").unwrap_err();
    assert!(matches!(err, FetchError::DecodeError(_)));
}

#[test]
fn test_view_source_flag_carried() {
    let connector = ScriptedConnector::default();
    connector.respond("example.org", ok("<b>src</b>", &[]));

    let response = engine(&connector)
        .fetch("view-source:http://example.org/page")
        .unwrap();

    assert!(response.view_source());
    assert_eq!(binix_fetch::renderer::show(&response), "<b>src</b>");
    assert!(connector.requests()[0].1.starts_with("GET /page HTTP/1.1\r\n"));
}

#[test]
fn test_https_uses_default_port() {
    let connector = ScriptedConnector::default();
    connector.respond("secure.test", ok("tls", &[]));

    engine(&connector).fetch("https://secure.test/").unwrap();
    assert_eq!(connector.dials(), vec![("secure.test".to_string(), 443)]);
}

#[test]
fn test_data_url_no_network() {
    let connector = ScriptedConnector::default();

    let response = engine(&connector).fetch("data:text/plain,Hello").unwrap();

    assert_eq!(response.body(), b"Hello");
    assert!(response.headers().is_empty());
    assert!(connector.dials().is_empty());
}

#[test]
fn test_directory_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::File::create(dir.path().join("a.txt")).unwrap();
    std::fs::create_dir(dir.path().join("b")).unwrap();
    let url = url::Url::from_directory_path(dir.path()).unwrap();

    let connector = ScriptedConnector::default();
    let response = engine(&connector).fetch(url.as_str()).unwrap();

    let text = response.text();
    let entries: Vec<&str> = text.lines().collect();
    assert!(entries.contains(&"a.txt"));
    assert!(entries.contains(&"b/"));
    assert!(connector.dials().is_empty());
}

#[test]
fn test_loopback_http_server() {
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            request.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        reader
            .get_mut()
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
            .unwrap();
        request
    });

    let response = FetchEngine::new()
        .fetch(&format!("http://127.0.0.1:{}/ping", port))
        .unwrap();
    let request = server.join().unwrap();

    assert_eq!(response.text(), "hello");
    assert!(request.starts_with("GET /ping HTTP/1.1\r\n"));
    assert!(request.contains(&format!("Host: 127.0.0.1:{}\r\n", port)));
}

proptest! {
    #[test]
    fn test_url_parsing_doesnt_crash(s in "\\PC*") {
        let _ = binix_fetch::network::Target::parse(&s);
    }

    #[test]
    fn test_response_parsing_doesnt_crash(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = io::Cursor::new(bytes);
        let _ = binix_fetch::network::response::read_head(&mut reader);
    }
}
