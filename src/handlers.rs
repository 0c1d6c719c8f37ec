use std::sync::Arc;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::Part;

pub mod echo;
pub mod multipart;

pub use echo::{handle_get_echo, handle_post_echo};
pub use multipart::handle_multipart;

/// Turns a parsed request into a response. Shared across connection threads.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

/// Serves the multipart body at `/` and nothing else.
#[derive(Debug, Clone)]
pub struct MultipartRouter {
    parts: Arc<[Part]>,
}

impl MultipartRouter {
    pub fn new(parts: Arc<[Part]>) -> Self {
        MultipartRouter { parts }
    }
}

impl Handler for MultipartRouter {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        match (request.method, request.path()) {
            (HttpMethod::Get | HttpMethod::Head, "/") => handle_multipart(&self.parts),
            _ => HttpResponse::not_found(),
        }
    }
}

/// Serves the JSON echo endpoints `/get` and `/post`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRouter;

impl Handler for EchoRouter {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        match (request.method, request.path()) {
            (HttpMethod::Get, "/get") => handle_get_echo(request),
            (HttpMethod::Post, "/post") => handle_post_echo(request),
            _ => HttpResponse::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpHeaders;

    fn request(method: HttpMethod, uri: &str) -> HttpRequest {
        HttpRequest::new(
            method,
            uri.to_string(),
            "HTTP/1.1".to_string(),
            HttpHeaders::new(),
            Vec::new(),
        )
    }

    fn router() -> MultipartRouter {
        MultipartRouter::new(vec![Part::new("a.txt", b"abc".to_vec())].into())
    }

    #[test]
    fn test_router_root() {
        let response = router().handle(&request(HttpMethod::Get, "/"));
        assert_eq!(response.status, 200);
        assert!(response
            .headers
            .get("Content-Type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_router_root_ignores_query() {
        let response = router().handle(&request(HttpMethod::Get, "/?download=1"));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_router_not_found() {
        let router = router();
        assert_eq!(router.handle(&request(HttpMethod::Get, "/unknown")).status, 404);
        assert_eq!(router.handle(&request(HttpMethod::Get, "/get")).status, 404);
        assert_eq!(router.handle(&request(HttpMethod::Post, "/")).status, 404);
    }

    #[test]
    fn test_echo_router_routes() {
        let router = EchoRouter;
        assert_eq!(router.handle(&request(HttpMethod::Get, "/get?query=x")).status, 200);
        assert_eq!(router.handle(&request(HttpMethod::Get, "/")).status, 404);
        assert_eq!(router.handle(&request(HttpMethod::Get, "/post")).status, 404);
    }
}
