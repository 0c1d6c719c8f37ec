use std::io::{BufRead, Error, ErrorKind, Read};
use std::str::FromStr;

use crate::http::types::{HttpHeaders, HttpMethod, HttpRequest};

/// Upper bound on a request body the fixtures will buffer.
const MAX_BODY_LEN: usize = 16 * 1024 * 1024;

/// Parse a single HTTP request line
fn parse_request_line(line: &str) -> Result<(HttpMethod, String, String), Error> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() < 3 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Malformed HTTP request line: '{}'", line.trim_end()),
        ));
    }

    let method = HttpMethod::from_str(parts[0]).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;

    let uri = parts[1].to_string();
    let http_version = parts[2].to_string();

    Ok((method, uri, http_version))
}

/// Parse HTTP headers up to the blank line
fn parse_headers<R: BufRead>(reader: &mut R) -> Result<HttpHeaders, Error> {
    let mut headers = HttpHeaders::new();
    let mut line = String::new();

    loop {
        line.clear();
        reader.read_line(&mut line)?;

        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Malformed HTTP header: '{}'", line.trim_end()),
            )
        })?;

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(headers)
}

/// Get the Content-Length from headers, defaults to 0 if not present
fn get_content_length(headers: &HttpHeaders) -> Result<usize, Error> {
    match headers.get("Content-Length") {
        Some(value) => {
            let len = value.parse::<usize>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("Invalid Content-Length value: '{}'", value),
                )
            })?;
            if len > MAX_BODY_LEN {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Content-Length {} exceeds limit of {}", len, MAX_BODY_LEN),
                ));
            }
            Ok(len)
        }
        None => Ok(0),
    }
}

/// Parse the next HTTP request from `reader`.
///
/// Returns `Ok(None)` when the peer closed the connection before sending
/// a request line. Malformed input is reported as `ErrorKind::InvalidData`.
pub fn parse_request<R: BufRead>(reader: &mut R) -> Result<Option<HttpRequest>, Error> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }

    let (method, uri, http_version) = parse_request_line(&request_line)?;
    let headers = parse_headers(reader)?;

    let content_length = get_content_length(&headers)?;
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    Ok(Some(HttpRequest::new(method, uri, http_version, headers, body)))
}
