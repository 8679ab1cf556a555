//! services/client/src/sync/identity.rs
//!
//! Holds the current user identity and persists it across restarts.

use crate::error::SyncError;
use std::sync::Arc;
use stylesense_core::domain::UserIdentity;
use stylesense_core::ports::{KeyValueStore, PortResult};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

/// Storage key for the persisted identity.
pub const USER_ID_KEY: &str = "user_id";

struct IdentityState {
    identity: UserIdentity,
    // Bumped on every switch; status refreshes compare against it.
    generation: u64,
}

/// Read access to the identity state. No switch can complete while this is held.
pub struct IdentityReadGuard<'a>(RwLockReadGuard<'a, IdentityState>);

impl IdentityReadGuard<'_> {
    pub fn generation(&self) -> u64 {
        self.0.generation
    }
}

/// The current user identity plus a generation counter that changes on every switch.
pub struct UserIdentityStore {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<IdentityState>,
}

impl UserIdentityStore {
    /// Reads the persisted identity, seeding and persisting the default one if
    /// nothing (or only a blank value) is stored yet. An unreadable value is
    /// logged and treated as absent.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let stored = match store.get(USER_ID_KEY).await {
            Ok(value) => value.and_then(UserIdentity::parse),
            Err(e) => {
                warn!("Could not read persisted user identity: {}", e);
                None
            }
        };

        let identity = match stored {
            Some(identity) => {
                info!(user_id = %identity, "Loaded persisted user identity");
                identity
            }
            None => {
                let identity = UserIdentity::default();
                store.set(USER_ID_KEY, identity.as_str()).await?;
                info!(user_id = %identity, "Seeded default user identity");
                identity
            }
        };

        Ok(Self {
            store,
            state: RwLock::new(IdentityState {
                identity,
                generation: 0,
            }),
        })
    }

    pub async fn current(&self) -> UserIdentity {
        self.state.read().await.identity.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Holds the identity state for reading until the guard is dropped.
    pub async fn read(&self) -> IdentityReadGuard<'_> {
        IdentityReadGuard(self.state.read().await)
    }

    /// The identity together with the generation it belongs to, read atomically.
    pub async fn snapshot(&self) -> (UserIdentity, u64) {
        let state = self.state.read().await;
        (state.identity.clone(), state.generation)
    }

    /// Persists `new_id` and makes it current.
    ///
    /// This does not touch the status cache; see `ClientState::switch_identity`.
    pub async fn switch_identity(&self, new_id: &str) -> Result<UserIdentity, SyncError> {
        let identity = UserIdentity::parse(new_id)
            .ok_or_else(|| SyncError::InvalidIdentity(new_id.to_string()))?;

        // Holding the write lock across the write keeps concurrent switches ordered.
        let mut state = self.state.write().await;
        self.store.set(USER_ID_KEY, identity.as_str()).await?;
        state.identity = identity.clone();
        state.generation += 1;
        info!(user_id = %identity, generation = state.generation, "Switched user identity");
        Ok(identity)
    }
}
