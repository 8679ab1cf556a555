//! services/client/src/error.rs
//!
//! Defines the error types for the sync pipeline and the client binary.

use crate::config::ConfigError;
use stylesense_core::ports::PortError;

/// Errors that escape the sync pipeline.
///
/// Per-image upload failures are never represented here; they are counted in
/// the batch result instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The media library could not be read. Raised before any remote call.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("An upload session is already running")]
    SessionActive,

    #[error("Invalid user id: '{0}'")]
    InvalidIdentity(String),

    /// The status refresh that closes a session (or follows an order import) failed.
    #[error("Failed to refresh user status: {0}")]
    StatusRefresh(#[source] PortError),

    #[error("Upload cancelled after {uploaded} of {total} images")]
    Cancelled { uploaded: usize, total: usize },

    /// A single-shot remote operation failed; displays the port message as-is.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// The primary error type for the `stylesense` binary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
