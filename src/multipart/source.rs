use std::fs;
use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::error::ConfigError;
use crate::multipart::Part;

/// Text of the small sample part.
pub const SAMPLE_TEXT: &[u8] = b"Hello from multipart test server!\n";

/// Pattern repeated to build the large sample part.
pub const SAMPLE_PATTERN: &[u8; 16] = b"0123456789ABCDEF";

/// Size of the large sample part (1 MiB).
pub const SAMPLE_BINARY_LEN: usize = 1024 * 1024;

/// Load one part per path, in the given order.
///
/// A path that does not name a regular file aborts the whole load.
pub fn load_parts<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Part>, ConfigError> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            let content = fs::read(path).map_err(|source| ConfigError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
            log::debug!("Loaded part {} ({} bytes)", path.display(), content.len());
            Ok(Part::new(path, content))
        })
        .collect()
}

/// The built-in pair: a short text part and a 1 MiB binary part.
///
/// The binary part is large enough that a client reading the response
/// incrementally sees many reads, which is what progress reporting needs.
pub fn sample_parts() -> Vec<Part> {
    let mut binary = BytesMut::with_capacity(SAMPLE_BINARY_LEN);
    while binary.len() < SAMPLE_BINARY_LEN {
        binary.put_slice(SAMPLE_PATTERN);
    }

    vec![
        Part::new("sample.txt", SAMPLE_TEXT),
        Part::new("sample.bin", binary.freeze()),
    ]
}
