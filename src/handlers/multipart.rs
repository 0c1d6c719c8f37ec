use crate::http::{HttpHeaders, HttpResponse};
use crate::multipart::{MultipartBody, Part};

/// Handle GET request to "/"
///
/// Every call frames the parts with a brand new boundary.
pub fn handle_multipart(parts: &[Part]) -> HttpResponse {
    let body = MultipartBody::generate(parts);
    log::debug!(
        "Built multipart body: {} part(s), {} bytes, boundary {}",
        parts.len(),
        body.len(),
        body.boundary()
    );

    let mut headers = HttpHeaders::new();
    headers.insert("Content-Type", body.content_type());
    headers.insert("Content-Length", body.len().to_string());

    HttpResponse::ok(headers, body.into_bytes())
}
