pub mod identity;
pub mod progress;
pub mod requests;
pub mod state;
pub mod status_cache;
pub mod upload_task;

#[cfg(test)]
pub(crate) mod test_support;

pub use identity::UserIdentityStore;
pub use progress::{ProgressReporter, ProgressSnapshot, ProgressState, ProgressWatcher};
pub use state::ClientState;
pub use status_cache::{CachedStatus, UserStatusCache};
pub use upload_task::UploadOrchestrator;
