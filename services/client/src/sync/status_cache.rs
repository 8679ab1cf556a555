//! services/client/src/sync/status_cache.rs
//!
//! Cached copy of the server's status record for the current user.
//!
//! The cache is only ever refreshed on demand. A refresh remembers the identity
//! generation it was issued under, and its response is dropped if the identity
//! was switched while the request was in flight.

use crate::sync::identity::UserIdentityStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use stylesense_core::domain::{UserIdentity, UserStatusRecord};
use stylesense_core::ports::{PortResult, RemoteService};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// A status record together with the identity it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedStatus {
    pub identity: UserIdentity,
    pub record: UserStatusRecord,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Default)]
struct StatusState {
    cached: Option<CachedStatus>,
    in_flight: usize,
    error: Option<String>,
}

pub struct UserStatusCache {
    remote: Arc<dyn RemoteService>,
    identities: Arc<UserIdentityStore>,
    state: Mutex<StatusState>,
}

impl UserStatusCache {
    pub fn new(remote: Arc<dyn RemoteService>, identities: Arc<UserIdentityStore>) -> Self {
        Self {
            remote,
            identities,
            state: Mutex::new(StatusState::default()),
        }
    }

    /// Fetches the status for the current identity and stores it.
    ///
    /// Failures are recorded in `last_error` and also returned; pollers may ignore
    /// the result and read the error field instead. A response that arrives after
    /// an identity switch is discarded and counts as success.
    pub async fn refresh(&self) -> PortResult<()> {
        let (identity, generation) = self.identities.snapshot().await;
        {
            let mut state = self.state.lock().await;
            state.in_flight += 1;
            state.error = None;
        }

        let result = self.remote.fetch_status(&identity).await;

        // Held until the result is stored so a switch cannot slip in between.
        let identity_guard = self.identities.read().await;
        let current_generation = identity_guard.generation();
        let mut state = self.state.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);

        if current_generation != generation {
            debug!(
                user_id = %identity,
                issued = generation,
                current = current_generation,
                "Discarding status response for a previous identity"
            );
            return Ok(());
        }

        match result {
            Ok(record) => {
                info!(
                    user_id = %identity,
                    wardrobe = record.wardrobe_items_count,
                    purchases = record.purchase_history_count,
                    "User status refreshed"
                );
                state.cached = Some(CachedStatus {
                    identity,
                    record,
                    fetched_at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                error!(user_id = %identity, "Error fetching user status: {}", e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn get(&self) -> Option<UserStatusRecord> {
        self.state
            .lock()
            .await
            .cached
            .as_ref()
            .map(|c| c.record.clone())
    }

    pub async fn cached(&self) -> Option<CachedStatus> {
        self.state.lock().await.cached.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.in_flight > 0
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Drops the cached record and any stored error.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.cached = None;
        state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::test_support::{status_for, FakeRemote, MemoryStore};
    use stylesense_core::ports::PortError;

    async fn cache_with(remote: Arc<FakeRemote>) -> (Arc<UserIdentityStore>, UserStatusCache) {
        let identities = Arc::new(
            UserIdentityStore::load(Arc::new(MemoryStore::default()))
                .await
                .unwrap(),
        );
        let cache = UserStatusCache::new(remote, identities.clone());
        (identities, cache)
    }

    #[tokio::test]
    async fn refresh_stores_the_record_for_the_current_identity() {
        let remote = Arc::new(FakeRemote::default());
        let (_identities, cache) = cache_with(remote.clone()).await;
        assert_eq!(cache.get().await, None);

        cache.refresh().await.unwrap();

        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.identity.as_str(), "test_user");
        assert_eq!(cached.record, status_for("test_user"));
        assert!(!cache.is_loading().await);
        assert_eq!(remote.status_calls(), vec!["test_user".to_string()]);
    }

    #[tokio::test]
    async fn failure_keeps_previous_record_and_records_error() {
        let remote = Arc::new(FakeRemote::default());
        let (_identities, cache) = cache_with(remote.clone()).await;
        cache.refresh().await.unwrap();

        remote.fail_status_with(PortError::Transport("connection refused".into()));
        let err = cache.refresh().await.unwrap_err();

        assert!(matches!(err, PortError::Transport(_)));
        assert_eq!(cache.get().await, Some(status_for("test_user")));
        assert_eq!(
            cache.last_error().await.as_deref(),
            Some("Transport error: connection refused")
        );
        assert!(!cache.is_loading().await);
    }

    #[tokio::test]
    async fn successful_refresh_clears_the_error() {
        let remote = Arc::new(FakeRemote::default());
        let (_identities, cache) = cache_with(remote.clone()).await;

        remote.fail_status_with(PortError::remote(500, "boom"));
        assert!(cache.refresh().await.is_err());
        assert_eq!(cache.last_error().await.as_deref(), Some("boom"));

        remote.clear_status_failure();
        cache.refresh().await.unwrap();
        assert_eq!(cache.last_error().await, None);
    }

    #[tokio::test]
    async fn response_landing_after_a_switch_is_discarded() {
        let remote = Arc::new(FakeRemote::default());
        let gate = remote.hold_status();
        let (identities, cache) = cache_with(remote.clone()).await;
        let cache = Arc::new(cache);

        let in_flight = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await }
        });
        gate.entered().await;
        assert!(cache.is_loading().await);

        identities.switch_identity("bob").await.unwrap();
        cache.invalidate().await;
        gate.release();

        in_flight.await.unwrap().unwrap();
        assert_eq!(cache.get().await, None);
        assert!(!cache.is_loading().await);

        cache.refresh().await.unwrap();
        assert_eq!(cache.cached().await.unwrap().identity.as_str(), "bob");
    }

    #[tokio::test]
    async fn switch_cannot_land_between_generation_check_and_store() {
        let remote = Arc::new(FakeRemote::default());
        let gate = remote.hold_status();
        let (identities, cache) = cache_with(remote.clone()).await;
        let cache = Arc::new(cache);

        let in_flight = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await }
        });
        gate.entered().await;

        // Park the refresh after its fetch, just before it can store the result.
        let state_guard = cache.state.lock().await;
        gate.release();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let switch = tokio::spawn({
            let identities = identities.clone();
            async move { identities.switch_identity("bob").await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!switch.is_finished());

        drop(state_guard);
        in_flight.await.unwrap().unwrap();
        switch.await.unwrap().unwrap();

        // The record was stored under generation 0, before the switch took effect.
        assert_eq!(cache.cached().await.unwrap().identity.as_str(), "test_user");
        assert_eq!(identities.snapshot().await.1, 1);
        cache.invalidate().await;
        assert_eq!(cache.get().await, None);
    }
}
