use std::fmt;

/// Fixed prefix shared by every generated boundary.
pub const BOUNDARY_PREFIX: &str = "fixture-boundary-";

/// Number of random bytes behind the hex suffix.
const SUFFIX_BYTES: usize = 8;

/// Multipart delimiter token, valid for a single response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generate a fresh boundary from the thread-local CSPRNG.
    ///
    /// Panics if the OS random source is unavailable.
    pub fn generate() -> Self {
        let suffix: [u8; SUFFIX_BYTES] = rand::random();
        Boundary(format!("{}{}", BOUNDARY_PREFIX, hex::encode(suffix)))
    }

    /// Wrap an existing token. Used for deterministic output in tests.
    pub fn from_token(token: impl Into<String>) -> Self {
        Boundary(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `--<boundary>` marker that opens each part.
    pub fn delimiter(&self) -> String {
        format!("--{}", self.0)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_prefix_and_hex_suffix() {
        let boundary = Boundary::generate();
        let suffix = boundary.as_str().strip_prefix(BOUNDARY_PREFIX).unwrap();

        assert_eq!(suffix.len(), SUFFIX_BYTES * 2);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_is_fresh_each_time() {
        let first = Boundary::generate();
        let second = Boundary::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn test_delimiter() {
        let boundary = Boundary::from_token("abc");
        assert_eq!(boundary.delimiter(), "--abc");
        assert_eq!(boundary.to_string(), "abc");
    }
}
