//! Error types for the functional-test support library.
//!
//! Comparisons never fail: a shape mismatch is simply "not equal". Errors only
//! come from constructing matchers (bad regex syntax) and from loading
//! configuration or fixture files.

use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum Error {
    /// A regular expression failed to compile.
    #[error("Pattern error: {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fixture or response did not have the expected structure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] Box<std::io::Error>),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] Box<serde_json::Error>),
}

impl Error {
    /// Create a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Box::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_names_the_offending_source() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = Error::pattern("(unclosed", source);
        let rendered = err.to_string();
        assert!(rendered.starts_with("Pattern error: \"(unclosed\""), "{rendered}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_and_json_errors_convert() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, Error::Io(_)));

        let json: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(json, Error::Json(_)));
    }
}
