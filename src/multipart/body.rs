use bytes::{BufMut, Bytes, BytesMut};

use crate::multipart::{Boundary, Part};

/// Form field name used for every part.
pub const FIELD_NAME: &str = "file";

const CRLF: &[u8] = b"\r\n";

/// A fully framed multipart/form-data body and the boundary it was built with.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: Boundary,
    bytes: Bytes,
}

impl MultipartBody {
    /// Frame `parts` with `boundary`.
    ///
    /// Each part becomes:
    ///
    /// ```text
    /// --<boundary>\r\n
    /// Content-Disposition: form-data; name="file"; filename="<name>"\r\n
    /// Content-Type: <type>\r\n
    /// \r\n
    /// <content>\r\n
    /// ```
    ///
    /// followed by a single `--<boundary>--\r\n`. An empty `parts` slice
    /// yields only that closing line.
    pub fn build(parts: &[Part], boundary: Boundary) -> Self {
        let delimiter = boundary.delimiter();
        let mut buf = BytesMut::with_capacity(framed_len(parts, &boundary));

        for part in parts {
            buf.put_slice(delimiter.as_bytes());
            buf.put_slice(CRLF);
            buf.put_slice(part_headers(part).as_bytes());
            buf.put_slice(CRLF);
            buf.put_slice(part.content());
            buf.put_slice(CRLF);
        }

        buf.put_slice(delimiter.as_bytes());
        buf.put_slice(b"--");
        buf.put_slice(CRLF);

        MultipartBody {
            boundary,
            bytes: buf.freeze(),
        }
    }

    /// Frame `parts` with a freshly generated boundary.
    pub fn generate(parts: &[Part]) -> Self {
        Self::build(parts, Boundary::generate())
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Value for the response `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Per-part header block, each line CRLF-terminated.
fn part_headers(part: &Part) -> String {
    format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n",
        FIELD_NAME,
        part.name(),
        part.content_type()
    )
}

/// Exact number of bytes `build` produces for these inputs.
pub fn framed_len(parts: &[Part], boundary: &Boundary) -> usize {
    let delimiter_len = boundary.as_str().len() + 2;
    let per_part: usize = parts
        .iter()
        .map(|part| {
            delimiter_len
                + CRLF.len()
                + part_headers(part).len()
                + CRLF.len()
                + part.content().len()
                + CRLF.len()
        })
        .sum();

    per_part + delimiter_len + 2 + CRLF.len()
}
