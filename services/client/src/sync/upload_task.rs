//! services/client/src/sync/upload_task.rs
//!
//! This module contains the batch upload orchestrator.
//!
//! A session uploads the selected images strictly one after another, reports
//! progress before every step, counts per-image failures instead of aborting,
//! and finishes by refreshing the cached user status.

use crate::error::SyncError;
use crate::sync::progress::{ProgressReporter, ProgressState, ProgressWatcher};
use crate::sync::state::ClientState;
use stylesense_core::domain::{BatchResult, ImageRef, UploadAck, UserIdentity};
use stylesense_core::ports::{PortError, PortResult};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const PREPARE_TEXT: &str = "Preparing upload...";
const FINALIZE_TEXT: &str = "Updating your wardrobe status...";

/// Bookkeeping for one run of the orchestrator.
struct UploadSession {
    id: Uuid,
    total_steps: usize,
    succeeded: usize,
    failed: usize,
}

pub struct UploadOrchestrator {
    state: ClientState,
    progress: ProgressReporter,
    // Held for the whole session; at most one batch runs at a time.
    session_lock: Mutex<()>,
}

impl UploadOrchestrator {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            progress: ProgressReporter::new(),
            session_lock: Mutex::new(()),
        }
    }

    pub fn subscribe_progress(&self) -> ProgressWatcher {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> ProgressState {
        self.progress.current()
    }

    /// Uploads `images` in order and refreshes the user status afterwards.
    ///
    /// Individual upload failures are counted in the result. The call only fails
    /// if permission is denied, another session is running, or the final status
    /// refresh fails (in which case no result is returned even if images were uploaded).
    pub async fn run_batch(&self, images: &[ImageRef]) -> Result<BatchResult, SyncError> {
        self.run_batch_with_cancel(images, CancellationToken::new())
            .await
    }

    /// Like `run_batch`, but stops attempting further images once `cancel` fires.
    ///
    /// A cancelled session still refreshes the status, then reports
    /// `SyncError::Cancelled` with the number of images that made it.
    pub async fn run_batch_with_cancel(
        &self,
        images: &[ImageRef],
        cancel: CancellationToken,
    ) -> Result<BatchResult, SyncError> {
        if images.is_empty() {
            debug!("Upload requested with no images; nothing to do.");
            return Ok(BatchResult::default());
        }

        let _session_guard = self
            .session_lock
            .try_lock()
            .map_err(|_| SyncError::SessionActive)?;

        self.state
            .images
            .ensure_permission()
            .await
            .map_err(|e| match e {
                PortError::PermissionDenied(reason) => SyncError::PermissionDenied(reason),
                other => SyncError::PermissionDenied(other.to_string()),
            })?;

        let mut session = UploadSession {
            id: Uuid::new_v4(),
            total_steps: images.len() + 2,
            succeeded: 0,
            failed: 0,
        };

        let result = self.run_session(&mut session, images, &cancel).await;
        if let Err(e) = &result {
            error!(session_id = %session.id, "Upload session ended with an error: {}", e);
            self.progress.reset();
        }
        result
    }

    async fn run_session(
        &self,
        session: &mut UploadSession,
        images: &[ImageRef],
        cancel: &CancellationToken,
    ) -> Result<BatchResult, SyncError> {
        let total = images.len();
        let identity = self.state.identities.current().await;
        info!(
            session_id = %session.id,
            user_id = %identity,
            images = total,
            "Upload session started."
        );

        self.progress.start(session.total_steps, PREPARE_TEXT);
        self.progress.advance(1, PREPARE_TEXT);

        let mut cancelled = false;
        for (index, image) in images.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(session_id = %session.id, remaining = total - index, "Upload session cancelled.");
                cancelled = true;
                break;
            }

            let position = index + 1;
            self.progress.advance(
                position + 1,
                format!("Uploading image {} of {}", position, total),
            );

            match self.upload_one(&identity, image).await {
                Ok(ack) => {
                    session.succeeded += 1;
                    debug!(
                        session_id = %session.id,
                        image = %image.uri,
                        ack = ?ack.message,
                        "Uploaded image {} of {}",
                        position,
                        total
                    );
                }
                Err(e) => {
                    session.failed += 1;
                    error!(
                        session_id = %session.id,
                        image = %image.uri,
                        "Failed to upload image {} of {}: {}",
                        position,
                        total,
                        e
                    );
                }
            }
        }

        self.progress.advance(session.total_steps, FINALIZE_TEXT);
        self.state
            .status
            .refresh()
            .await
            .map_err(SyncError::StatusRefresh)?;

        if cancelled {
            return Err(SyncError::Cancelled {
                uploaded: session.succeeded,
                total,
            });
        }

        self.progress.complete(format!(
            "Uploaded {} of {} images",
            session.succeeded, total
        ));
        info!(
            session_id = %session.id,
            uploaded = session.succeeded,
            failed = session.failed,
            "Upload session complete."
        );

        Ok(BatchResult {
            uploaded: session.succeeded,
            failed: session.failed,
            total,
        })
    }

    async fn upload_one(&self, identity: &UserIdentity, image: &ImageRef) -> PortResult<UploadAck> {
        let bytes = self.state.images.read_image(image).await?;
        self.state.remote.upload_image(identity, bytes).await
    }
}
