pub mod parser;
pub mod types;

pub use parser::parse_request;
pub use types::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse};
