use thiserror::Error;

/// Boxed cause carried by errors whose origin depends on the file format.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CommonsError {
    #[error("No source bound to this config; call .bind() first")]
    NoSource,

    #[error("Cannot save to {id}: the source is read-only")]
    ReadOnlySource { id: String },

    #[error("I/O unavailable for {id}: {source}")]
    IoError {
        id: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {id}: {source}")]
    ParseError { id: String, source: BoxError },

    #[error("Default source {id} doesn't exist")]
    MissingDefault { id: String },

    #[error("Field '{segment}' of '{path}' isn't an object")]
    TypeMismatch { path: String, segment: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_segment() {
        let err = CommonsError::TypeMismatch {
            path: "a.b".into(),
            segment: "a".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'a'"));
        assert!(msg.contains("a.b"));
    }

    #[test]
    fn io_error_keeps_cause() {
        let err = CommonsError::IoError {
            id: "/tmp/config.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/config.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn no_source_mentions_bind() {
        assert!(CommonsError::NoSource.to_string().contains("bind"));
    }
}
