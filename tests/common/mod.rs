// Integration test utilities
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use multipart_fixture_server::{EchoRouter, HttpHeaders, MultipartRouter, Part, Server};

/// How long to wait for the server port to become available.
const PORT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often to check if the port is available.
const PORT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Timeout for socket read/write operations.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Buffer size for reading HTTP responses.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Wait for a port to become available within timeout
fn wait_for_port(addr: SocketAddr) -> bool {
    let start = std::time::Instant::now();
    loop {
        match TcpStream::connect(addr) {
            Ok(_) => return true,
            Err(_) => {
                if start.elapsed() > PORT_READY_TIMEOUT {
                    return false;
                }
                thread::sleep(PORT_CHECK_INTERVAL);
            }
        }
    }
}

/// A response as seen on the wire.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Number of `read` calls that returned body data.
    pub body_reads: usize,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    /// The boundary advertised in `Content-Type`.
    pub fn boundary(&self) -> Option<&str> {
        self.header("Content-Type")?
            .strip_prefix("multipart/form-data; boundary=")
    }
}

/// Test server that wraps the real Server for integration testing.
/// Provides convenience methods for sending test requests.
pub struct TestServer {
    server: Server,
}

impl TestServer {
    /// Start a multipart server serving `parts`.
    pub fn start(parts: Vec<Part>) -> Self {
        Self::start_with_chunk_size(parts, 64 * 1024)
    }

    pub fn start_with_chunk_size(parts: Vec<Part>, chunk_size: usize) -> Self {
        let server = Server::start("127.0.0.1:0", MultipartRouter::new(parts.into()), chunk_size)
            .expect("Failed to start test server");
        wait_for_port(server.addr());
        TestServer { server }
    }

    /// Start a server for the JSON echo endpoints.
    pub fn start_echo() -> Self {
        let server =
            Server::start_with_dynamic_port(EchoRouter).expect("Failed to start test server");
        wait_for_port(server.addr());
        TestServer { server }
    }

    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub fn connect(&self) -> TcpStream {
        let stream =
            TcpStream::connect(self.server.addr()).expect("Failed to connect to test server");
        stream
            .set_read_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set read timeout");
        stream
            .set_write_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set write timeout");
        stream
    }

    /// `GET <path>` with `Connection: close`, read until the server hangs up.
    pub fn get(&self, path: &str) -> RawResponse {
        self.send(&format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path,
            self.addr()
        ))
    }

    /// `POST <path>` with a body and `Connection: close`.
    pub fn post(&self, path: &str, body: &str) -> RawResponse {
        self.send(&format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            path,
            self.addr(),
            body.len(),
            body
        ))
    }

    /// Send a raw request and read the response until the connection closes.
    pub fn send(&self, request: &str) -> RawResponse {
        let mut stream = self.connect();
        stream
            .write_all(request.as_bytes())
            .expect("Failed to write request");
        read_response(&mut BufReader::new(stream))
    }

    /// Send several requests over one persistent connection, in order.
    pub fn send_requests(&self, requests: &[&str]) -> Vec<RawResponse> {
        let mut reader = BufReader::new(self.connect());
        requests
            .iter()
            .map(|request| {
                reader
                    .get_mut()
                    .write_all(request.as_bytes())
                    .expect("Failed to write request");
                read_response(&mut reader)
            })
            .collect()
    }
}

/// Read one response, using Content-Length to find the end of the body.
pub fn read_response<R: BufRead>(reader: &mut R) -> RawResponse {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .expect("Failed to read status line");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or_else(|| panic!("Malformed status line: {:?}", status_line));

    let mut headers = HttpHeaders::new();
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .expect("Failed to read header line");
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let (key, value) = line.split_once(':').expect("Malformed header line");
        headers.insert(key.trim(), value.trim());
    }

    let content_length: usize = headers
        .get("Content-Length")
        .map(|v| v.parse().expect("Invalid Content-Length"))
        .unwrap_or(0);

    let mut body = Vec::with_capacity(content_length);
    let mut body_reads = 0;
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    while body.len() < content_length {
        let want = (content_length - body.len()).min(READ_BUFFER_SIZE);
        let n = reader.read(&mut buffer[..want]).expect("Failed to read body");
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
        body_reads += 1;
    }

    RawResponse {
        status,
        headers,
        body,
        body_reads,
    }
}

/// One part recovered from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

fn disposition_param(disposition: &str, param: &str) -> Option<String> {
    disposition.split(';').map(str::trim).find_map(|item| {
        let (key, value) = item.split_once('=')?;
        (key.trim() == param).then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Minimal multipart/form-data parser for checking what the server sends.
///
/// Panics on anything malformed; callers are tests.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Vec<ParsedPart> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();
    let mut pos = find(body, &delimiter, 0).expect("No opening boundary");

    loop {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            assert_eq!(&body[after + 2..], b"\r\n", "Data after closing boundary");
            break;
        }
        assert!(body[after..].starts_with(b"\r\n"), "Expected CRLF after boundary");

        let headers_start = after + 2;
        let headers_end =
            find(body, b"\r\n\r\n", headers_start).expect("Unterminated part headers");
        let header_block =
            std::str::from_utf8(&body[headers_start..headers_end]).expect("Non-UTF8 headers");

        let mut headers = HttpHeaders::new();
        for line in header_block.split("\r\n") {
            let (key, value) = line.split_once(':').expect("Malformed part header");
            headers.insert(key.trim(), value.trim());
        }

        let data_start = headers_end + 4;
        let mut closing = b"\r\n".to_vec();
        closing.extend_from_slice(&delimiter);
        let data_end = find(body, &closing, data_start).expect("Unterminated part data");

        let disposition = headers
            .get("Content-Disposition")
            .expect("Missing Content-Disposition");
        assert!(disposition.starts_with("form-data"));

        parts.push(ParsedPart {
            name: disposition_param(disposition, "name").expect("Missing field name"),
            filename: disposition_param(disposition, "filename"),
            content_type: headers.get("Content-Type").map(str::to_string),
            data: body[data_start..data_end].to_vec(),
        });

        pos = data_end + 2;
    }

    parts
}
