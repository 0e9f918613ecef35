use crate::path::PathError;

/// Folder path error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("newline must be None, '', '\\n', '\\r', or '\\r\\n', got {0:?}")]
    InvalidNewline(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Encoding {0} can only be used for reading")]
    ReadOnlyEncoding(String),

    #[error("Unknown error handler: {0}")]
    UnknownErrorPolicy(String),

    #[error("'{encoding}' codec can't decode byte sequence at position {position}")]
    Decode { encoding: String, position: usize },

    #[error("'{encoding}' codec can't encode character {character:?}")]
    Encode { encoding: String, character: char },

    #[error("Path must have an extension naming the image format: {0}")]
    MissingImageExtension(String),

    #[error("Image format must be one of: {}", supported.join(", "))]
    UnsupportedImageFormat { format: String, supported: Vec<String> },

    #[error("quality must be between 0 and 95, got {0}")]
    InvalidJpegQuality(u8),

    #[error("Invalid image array shape: {0:?}")]
    InvalidImageShape(Vec<usize>),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether the error came from validating caller arguments rather than from the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPattern(_)
                | Error::UnsupportedMode(_)
                | Error::InvalidNewline(_)
                | Error::UnknownEncoding(_)
                | Error::ReadOnlyEncoding(_)
                | Error::UnknownErrorPolicy(_)
                | Error::MissingImageExtension(_)
                | Error::UnsupportedImageFormat { .. }
                | Error::InvalidJpegQuality(_)
                | Error::InvalidImageShape(_)
        )
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::NotFound(msg) => std::io::Error::new(std::io::ErrorKind::NotFound, msg),
            other => std::io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::UnsupportedMode("a".to_string()).is_validation());
        assert!(Error::InvalidJpegQuality(100).is_validation());
        assert!(!Error::Storage("boom".to_string()).is_validation());
        assert!(!Error::NotFound("x".to_string()).is_validation());
    }

    #[test]
    fn test_not_found_maps_to_io_kind() {
        let err: std::io::Error = Error::NotFound("a.txt".to_string()).into();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_quality_message() {
        let err = Error::InvalidJpegQuality(100);
        assert_eq!(err.to_string(), "quality must be between 0 and 95, got 100");
    }
}
