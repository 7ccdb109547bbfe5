use thiserror::Error;

/// Engine-wide error types for registration-data resolution.
///
/// Payloads are plain strings so that an outcome can be cloned and handed to
/// every caller waiting on the same index rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RdapError {
    /// Malformed query key or unsupported query shape. Never reaches the
    /// index or the store.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object store collaborator failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Range index rebuild failed. The previous snapshot stays current.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// A record whose type, key or source cannot be interpreted.
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl RdapError {
    /// Whether this error should be reported to a client as a 400-equivalent.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, RdapError::BadRequest(_))
    }
}

impl From<serde_json::Error> for RdapError {
    fn from(e: serde_json::Error) -> Self {
        RdapError::Serialization(e.to_string())
    }
}
