pub mod body;
pub mod boundary;
pub mod part;
pub mod source;

pub use body::MultipartBody;
pub use boundary::Boundary;
pub use part::Part;
pub use source::{load_parts, sample_parts};
