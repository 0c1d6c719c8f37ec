use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::str::FromStr;

use bytes::Bytes;
use itertools::Itertools;

/// HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers - case-insensitive key lookup.
///
/// Keys are matched lowercased and `iter` yields them that way; the name as
/// it was inserted is kept for `as_sent`.
#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    headers: HashMap<String, (String, String)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        HttpHeaders {
            headers: HashMap::new(),
        }
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let name = key.into();
        self.headers
            .insert(name.to_lowercase(), (name, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.headers.contains_key(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.headers.iter().map(|(key, (_, value))| (key, value))
    }

    /// Headers with their names spelled as they were inserted.
    pub fn as_sent(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Headers ordered by name, for deterministic output.
    pub fn sorted(&self) -> impl Iterator<Item = (&String, &String)> {
        self.iter().sorted_by(|a, b| a.0.cmp(b.0))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Request target as sent, query string included.
    pub uri: String,
    pub http_version: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Address of the client, when the request came off a socket.
    pub peer_addr: Option<SocketAddr>,
    /// Address the server accepted the request on.
    pub local_addr: Option<SocketAddr>,
}

impl HttpRequest {
    pub fn new(
        method: HttpMethod,
        uri: String,
        http_version: String,
        headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Self {
        HttpRequest {
            method,
            uri,
            http_version,
            headers,
            body,
            peer_addr: None,
            local_addr: None,
        }
    }

    pub fn with_peer_addr(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    pub fn with_local_addr(mut self, local_addr: SocketAddr) -> Self {
        self.local_addr = Some(local_addr);
        self
    }

    /// The path component of the target, without the query string.
    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(path, _)| path)
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    /// First value of `name` in the query string.
    ///
    /// `+` decodes to a space and `%XX` escapes are decoded; anything that
    /// fails to decode is returned as sent.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query()?
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (percent_decode(key) == name).then(|| percent_decode(value))
            })
            .next()
    }

    /// Whether the client expects the connection to stay open afterwards.
    pub fn keep_alive(&self) -> bool {
        match self.headers.get("Connection").map(|v| v.to_ascii_lowercase()) {
            Some(value) if value == "close" => false,
            Some(value) if value == "keep-alive" => true,
            _ => self.http_version != "HTTP/1.0",
        }
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                decoded.push((hex_value(bytes[i + 1]) << 4) | hex_value(bytes[i + 2]));
                i += 3;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).unwrap_or_else(|_| input.to_string())
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub http_version: String,
    pub status: u16,
    pub reason_phrase: String,
    pub headers: HttpHeaders,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        reason_phrase: impl Into<String>,
        headers: HttpHeaders,
        body: impl Into<Bytes>,
    ) -> Self {
        HttpResponse {
            http_version: "HTTP/1.1".to_string(),
            status,
            reason_phrase: reason_phrase.into(),
            headers,
            body: body.into(),
        }
    }

    pub fn ok(headers: HttpHeaders, body: impl Into<Bytes>) -> Self {
        Self::new(200, "OK", headers, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found", Self::length_only(0), Bytes::new())
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request", Self::length_only(0), Bytes::new())
    }

    /// Response carrying `body` with matching `Content-Type` and
    /// `Content-Length` headers.
    pub fn with_body(
        status: u16,
        reason_phrase: &str,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        let mut headers = Self::length_only(body.len());
        headers.insert("Content-Type", content_type);
        Self::new(status, reason_phrase, headers, body)
    }

    fn length_only(len: usize) -> HttpHeaders {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Length", len.to_string());
        headers
    }

    /// Format the status line and headers as bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut result = format!(
            "{} {} {}\r\n",
            self.http_version, self.status, self.reason_phrase
        );

        for (key, value) in self.headers.sorted() {
            result.push_str(&format!("{}: {}\r\n", key, value));
        }

        result.push_str("\r\n");
        result.into_bytes()
    }

    /// Combine headers and body into complete response
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut response = self.serialize();
        response.extend_from_slice(&self.body);
        response
    }

    /// Write the head in one call, then the body in writes of at most
    /// `chunk_size` bytes, flushing after each.
    ///
    /// Returns the number of body bytes written. On error the caller gets
    /// the I/O error; whatever was written before it stays written.
    pub fn write_chunked<W: Write>(
        &self,
        out: &mut W,
        chunk_size: usize,
        include_body: bool,
    ) -> io::Result<usize> {
        out.write_all(&self.serialize())?;
        out.flush()?;

        if !include_body {
            return Ok(0);
        }

        let mut sent = 0;
        for chunk in self.body.chunks(chunk_size.max(1)) {
            out.write_all(chunk)?;
            out.flush()?;
            sent += chunk.len();
        }
        Ok(sent)
    }
}
