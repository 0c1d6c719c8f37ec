// Library root - exposes public API for the binaries and integration tests

pub mod args;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod http;
pub mod multipart;
pub mod server;

pub use config::ServerConfig;
pub use error::ConfigError;
pub use handlers::{EchoRouter, Handler, MultipartRouter};
pub use http::{parse_request, HttpHeaders, HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{Boundary, MultipartBody, Part};
pub use server::Server;
