//! In-memory fakes for the port traits, shared by the sync tests.

use crate::config::Config;
use crate::sync::progress::{ProgressState, ProgressWatcher};
use crate::sync::state::ClientState;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use stylesense_core::domain::{
    ImageRef, OrderHistoryResult, StyleRecommendation, StyleRequest, UploadAck, UserIdentity,
    UserStatusRecord,
};
use stylesense_core::ports::{
    ImageSource, KeyValueStore, PortError, PortResult, RemoteService,
};
use tokio::sync::{Notify, Semaphore};

pub fn test_config() -> Config {
    Config {
        api_base_url: "http://localhost:8080".into(),
        identity_store_path: "identity.json".into(),
        media_root: ".".into(),
        default_location: "Vellore, India".into(),
        log_level: tracing::Level::INFO,
    }
}

/// A `ClientState` over the given fakes with a fresh in-memory identity store.
pub async fn client_state(remote: Arc<FakeRemote>, images: Arc<FakeImages>) -> ClientState {
    ClientState::new(remote, images, Arc::new(MemoryStore::default()), &test_config())
        .await
        .unwrap()
}

pub fn status_for(user: &str) -> UserStatusRecord {
    UserStatusRecord {
        exists: true,
        wardrobe_items_count: user.len() as u32,
        purchase_history_count: 2,
        total_items: user.len() as u32 + 2,
        message: format!("status for {}", user),
    }
}

pub fn sample_recommendation() -> StyleRecommendation {
    StyleRecommendation {
        celebrity_twin: "Zendaya".into(),
        weather_info: "Sunny, 31C".into(),
        final_recommendation: "Linen shirt with chinos.".into(),
        items_owned: Vec::new(),
        items_to_buy: Vec::new(),
        extracted_emotion: None,
    }
}

//=========================================================================================
// KeyValueStore
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(PortError::Unexpected("disk full".into()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

//=========================================================================================
// RemoteService
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Health,
    Status(String),
    Upload { user: String, image: Bytes },
    Orders(String),
    Recommend(StyleRequest),
}

/// Pauses the first `fetch_status` call until released.
#[derive(Clone)]
pub struct StatusGate {
    entered: Arc<Notify>,
    release: Arc<Semaphore>,
}

impl StatusGate {
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.add_permits(1);
    }
}

#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    failing_uploads: Mutex<HashMap<usize, PortError>>,
    status_failure: Mutex<Option<PortError>>,
    status_gate: Mutex<Option<StatusGate>>,
    orders_response: Mutex<Option<PortResult<OrderHistoryResult>>>,
    recommend_response: Mutex<Option<PortResult<StyleRecommendation>>>,
    progress: Mutex<Option<ProgressWatcher>>,
    observed: Mutex<Vec<ProgressState>>,
}

impl FakeRemote {
    /// Makes the `nth` upload (1-based, counted across the fake's lifetime) fail.
    pub fn fail_upload(&self, nth: usize, error: PortError) {
        self.failing_uploads.lock().unwrap().insert(nth, error);
    }

    pub fn fail_status_with(&self, error: PortError) {
        *self.status_failure.lock().unwrap() = Some(error);
    }

    pub fn clear_status_failure(&self) {
        *self.status_failure.lock().unwrap() = None;
    }

    pub fn hold_status(&self) -> StatusGate {
        let gate = StatusGate {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
        };
        *self.status_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn respond_to_orders(&self, response: PortResult<OrderHistoryResult>) {
        *self.orders_response.lock().unwrap() = Some(response);
    }

    pub fn respond_to_recommend(&self, response: PortResult<StyleRecommendation>) {
        *self.recommend_response.lock().unwrap() = Some(response);
    }

    /// Records the progress state seen at the start of every upload and status call.
    pub fn observe_progress(&self, watcher: ProgressWatcher) {
        *self.progress.lock().unwrap() = Some(watcher);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status(user) => Some(user),
                _ => None,
            })
            .collect()
    }

    pub fn observed(&self) -> Vec<ProgressState> {
        self.observed.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> usize {
        if let Some(watcher) = self.progress.lock().unwrap().as_ref() {
            self.observed.lock().unwrap().push(watcher.borrow().clone());
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls
            .iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .count()
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn check_health(&self) -> PortResult<()> {
        self.record(Call::Health);
        Ok(())
    }

    async fn fetch_status(&self, identity: &UserIdentity) -> PortResult<UserStatusRecord> {
        self.record(Call::Status(identity.to_string()));
        let gate = self.status_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            let _permit = gate.release.acquire().await.unwrap();
        }
        if let Some(error) = self.status_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(status_for(identity.as_str()))
    }

    async fn upload_image(&self, identity: &UserIdentity, image: Bytes) -> PortResult<UploadAck> {
        let nth = self.record(Call::Upload {
            user: identity.to_string(),
            image,
        });
        if let Some(error) = self.failing_uploads.lock().unwrap().get(&nth).cloned() {
            return Err(error);
        }
        Ok(UploadAck {
            message: Some("stored".into()),
        })
    }

    async fn load_order_history(&self, identity: &UserIdentity) -> PortResult<OrderHistoryResult> {
        self.record(Call::Orders(identity.to_string()));
        self.orders_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(OrderHistoryResult {
                    success: true,
                    message: "orders loaded".into(),
                })
            })
    }

    async fn request_recommendation(
        &self,
        request: &StyleRequest,
    ) -> PortResult<StyleRecommendation> {
        self.record(Call::Recommend(request.clone()));
        self.recommend_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(sample_recommendation()))
    }
}

//=========================================================================================
// ImageSource
//=========================================================================================

#[derive(Default)]
pub struct FakeImages {
    denied: Mutex<bool>,
    unreadable: Mutex<HashSet<String>>,
}

impl FakeImages {
    pub fn deny_permission(&self) {
        *self.denied.lock().unwrap() = true;
    }

    pub fn make_unreadable(&self, uri: &str) {
        self.unreadable.lock().unwrap().insert(uri.to_string());
    }
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn ensure_permission(&self) -> PortResult<()> {
        if *self.denied.lock().unwrap() {
            return Err(PortError::PermissionDenied("media library".into()));
        }
        Ok(())
    }

    async fn read_image(&self, image: &ImageRef) -> PortResult<Bytes> {
        if self.unreadable.lock().unwrap().contains(&image.uri) {
            return Err(PortError::NotFound(image.uri.clone()));
        }
        Ok(Bytes::from(format!("bytes of {}", image.uri)))
    }
}

pub fn images(uris: &[&str]) -> Vec<ImageRef> {
    uris.iter().map(|u| ImageRef::new(*u)).collect()
}
