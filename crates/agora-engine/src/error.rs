use crate::ports::RegistryError;
use crate::storage::StorageError;

/// Error taxonomy for every engine entry point. Best-effort side effects
/// (voice, presence, analytics, broadcast) never surface here; they are
/// logged where they fail.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("not authorized: {0}")]
    NotAuthorized(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    /// Opaque storage failure, propagated unchanged and never retried.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Name-registry failure during ownership transfer. The registry is a
    /// hard dependency of that one operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineError {
    /// Stable machine-readable tag for logs and outer transports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::NotAuthorized(_) => "not_authorized",
            EngineError::InvalidRequest(_) => "invalid_request",
            EngineError::Storage(_) => "storage",
            EngineError::Registry(_) => "registry",
        }
    }
}
