use std::io;
use std::time::Duration;
use thiserror::Error;

/// Shown instead of the raw store message when the database rules reject a read.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission denied. Please check the database rules: \
     the 'users' node must be readable by the admin dashboard.";

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("permission denied reading '{0}'")]
    PermissionDenied(String),

    #[error("database not found: {0}")]
    NotFound(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("malformed database content: {0}")]
    Malformed(String),

    #[error("subscription closed: {0}")]
    Closed(String),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(err.to_string()),
            io::ErrorKind::NotFound => StoreError::NotFound(err.to_string()),
            _ => StoreError::Io(err.to_string()),
        }
    }
}

/// Failures surfaced by the paginated loader.
///
/// The loader also records the rendered message in its state, so callers that
/// only look at [`LoadState`](crate::loader::LoadState) still see them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("Database not initialized: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    ReadFailure(String),

    #[error("Timed out after {0:?} waiting for the database")]
    Timeout(Duration),
}

impl From<StoreError> for LoaderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied(_) => {
                LoaderError::ReadFailure(PERMISSION_DENIED_MESSAGE.to_string())
            }
            other => LoaderError::ReadFailure(format!("Failed to load users: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_gets_friendly_message() {
        let err = LoaderError::from(StoreError::PermissionDenied("users".into()));
        assert_eq!(err.to_string(), PERMISSION_DENIED_MESSAGE);
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = LoaderError::from(StoreError::Malformed("expected value".into()));
        assert_eq!(
            err.to_string(),
            "Failed to load users: malformed database content: expected value"
        );
    }

    #[test]
    fn io_errors_map_by_kind() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(StoreError::from(denied), StoreError::PermissionDenied(_)));
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(StoreError::from(missing), StoreError::NotFound(_)));
        let other = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(StoreError::from(other), StoreError::Io("boom".into()));
    }
}
