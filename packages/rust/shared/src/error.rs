//! The one error type shared by the speakerunify library crates.
//!
//! Document-level problems never surface here: an adapter that cannot read
//! a native document returns `None` and the run counts it as skipped.
//! `UnifyError` is for what stops a run or a command outright, such as an
//! unreadable topic mapping, a bad config file, or a database that cannot
//! be opened. The CLI reports it through `color-eyre`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UnifyError {
    /// `speakerunify.toml` could not be parsed or holds unusable settings.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed JSON: the topic mapping, an imported line, or a stored record.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// libSQL failure while opening, migrating, reading or writing a database.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input rejected before use: unknown source tag, bad collection name.
    #[error("validation error: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, UnifyError>;

impl UnifyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Attach the offending path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = UnifyError::config("topic mapping path is empty");
        assert_eq!(err.to_string(), "config error: topic mapping path is empty");

        let err = UnifyError::validation("unknown source 'foo'");
        assert!(err.to_string().contains("unknown source"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = UnifyError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn storage_error_is_prefixed() {
        let err = UnifyError::Storage("database is locked".into());
        assert_eq!(err.to_string(), "storage error: database is locked");
    }
}
