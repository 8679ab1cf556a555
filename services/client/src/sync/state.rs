//! services/client/src/sync/state.rs
//!
//! Defines the client's shared state, constructed once at startup and handed
//! to the orchestrator and to every single-shot operation.

use crate::config::Config;
use crate::error::SyncError;
use crate::sync::identity::UserIdentityStore;
use crate::sync::status_cache::UserStatusCache;
use std::sync::Arc;
use stylesense_core::domain::UserIdentity;
use stylesense_core::ports::{ImageSource, KeyValueStore, PortResult, RemoteService};

/// Everything the sync pipeline shares. Cheap to clone.
#[derive(Clone)]
pub struct ClientState {
    pub remote: Arc<dyn RemoteService>,
    pub images: Arc<dyn ImageSource>,
    pub identities: Arc<UserIdentityStore>,
    pub status: Arc<UserStatusCache>,
    pub default_location: String,
}

impl ClientState {
    /// Builds the state, loading (or seeding) the persisted identity.
    pub async fn new(
        remote: Arc<dyn RemoteService>,
        images: Arc<dyn ImageSource>,
        store: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> PortResult<Self> {
        let identities = Arc::new(UserIdentityStore::load(store).await?);
        let status = Arc::new(UserStatusCache::new(remote.clone(), identities.clone()));
        Ok(Self {
            remote,
            images,
            identities,
            status,
            default_location: config.default_location.clone(),
        })
    }

    /// Switches to `new_id` and drops the cached status of the previous user.
    ///
    /// The cache stays empty until the caller refreshes it.
    pub async fn switch_identity(&self, new_id: &str) -> Result<UserIdentity, SyncError> {
        let identity = self.identities.switch_identity(new_id).await?;
        self.status.invalidate().await;
        Ok(identity)
    }
}
