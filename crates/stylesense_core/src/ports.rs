//! crates/stylesense_core/src/ports.rs
//!
//! Defines the service contracts (traits) the sync pipeline depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! pipeline independent of HTTP clients, storage files and media libraries.

use crate::domain::{
    ImageRef, OrderHistoryResult, StyleRecommendation, StyleRequest, UploadAck, UserIdentity,
    UserStatusRecord,
};
use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The remote service answered with a non-success status.
    /// Displays the server-supplied message verbatim so callers can show it directly.
    #[error("{message}")]
    Remote { status: u16, message: String },
    /// No response was received from the remote service.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Liveness probe.
    async fn check_health(&self) -> PortResult<()>;

    async fn fetch_status(&self, identity: &UserIdentity) -> PortResult<UserStatusRecord>;

    /// Uploads one encoded image into the user's wardrobe.
    async fn upload_image(&self, identity: &UserIdentity, image: Bytes) -> PortResult<UploadAck>;

    async fn load_order_history(&self, identity: &UserIdentity) -> PortResult<OrderHistoryResult>;

    async fn request_recommendation(
        &self,
        request: &StyleRequest,
    ) -> PortResult<StyleRecommendation>;
}

/// Durable storage for small string values that must survive restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fails with `PortError::PermissionDenied` when the media library is not readable.
    async fn ensure_permission(&self) -> PortResult<()>;

    async fn read_image(&self, image: &ImageRef) -> PortResult<Bytes>;
}
