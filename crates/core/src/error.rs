use std::path::PathBuf;
use thiserror::Error;

/// Result type for dirwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The engine facade was used before a successful `init`
    #[error("Engine is not initialized")]
    NotInitialized,

    /// Engine initialization failed; the engine is unusable
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Opening a directory watch failed
    #[error("Failed to watch {}: {source}", .path.display())]
    WatchCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured watch limit or the ID space is exhausted
    #[error("Watch limit exhausted")]
    ResourceExhausted,

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an initialization error
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watch creation error for the given path
    pub fn watch_creation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WatchCreation {
            path: path.into(),
            source,
        }
    }

    /// OS error code behind this error, when one exists
    ///
    /// A marshalling layer that needs the negative-integer encoding of the
    /// external contract negates this value.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::WatchCreation { source, .. } => source.raw_os_error(),
            Self::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_watch_creation_carries_os_code() {
        let err = Error::watch_creation(
            "/no/such/dir",
            std::io::Error::from_raw_os_error(libc_enoent()),
        );
        assert_eq!(err.raw_os_error(), Some(libc_enoent()));
        assert!(err.to_string().contains("/no/such/dir"));
    }

    #[test]
    fn test_non_os_errors_have_no_code() {
        assert_eq!(Error::ResourceExhausted.raw_os_error(), None);
        assert_eq!(Error::NotInitialized.raw_os_error(), None);
    }

    // ENOENT is 2 on every Unix this crate compiles for
    fn libc_enoent() -> i32 {
        2
    }
}
