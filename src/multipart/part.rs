use std::path::Path;

use bytes::Bytes;
use new_mime_guess::MimeGuess;

/// Content type used when the extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    content: Bytes,
    content_type: String,
}

impl Part {
    /// Build a part from its source path and content.
    ///
    /// Only the base name of `source` is kept, so local directory layout
    /// never ends up on the wire. The content type is guessed from the
    /// extension.
    pub fn new(source: impl AsRef<Path>, content: impl Into<Bytes>) -> Self {
        let source = source.as_ref();
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        let content_type = guess_content_type(&name);

        Part {
            name,
            content: content.into(),
            content_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Look up the MIME type for a file name, falling back to octet-stream.
pub fn guess_content_type(file_name: &str) -> String {
    MimeGuess::from_path(file_name)
        .first()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_strips_directories() {
        let part = Part::new("/home/user/private/report.txt", b"data".to_vec());
        assert_eq!(part.name(), "report.txt");
        assert_eq!(&part.content()[..], b"data");
    }

    #[test]
    fn test_part_relative_path() {
        let part = Part::new("nested/dir/image.png", Vec::new());
        assert_eq!(part.name(), "image.png");
        assert_eq!(part.content_type(), "image/png");
    }

    #[test]
    fn test_content_type_known_extensions() {
        assert_eq!(guess_content_type("sample.txt"), "text/plain");
        assert_eq!(guess_content_type("page.html"), "text/html");
        assert_eq!(guess_content_type("data.json"), "application/json");
    }

    #[test]
    fn test_content_type_unknown_extension() {
        assert_eq!(guess_content_type("blob.zzzunknown"), DEFAULT_CONTENT_TYPE);
        assert_eq!(guess_content_type("no_extension"), DEFAULT_CONTENT_TYPE);
    }
}
