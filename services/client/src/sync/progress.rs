//! services/client/src/sync/progress.rs
//!
//! The observable progress state of the current upload session.
//!
//! Every transition replaces the whole `ProgressState` through a `watch`
//! channel, so a consumer always sees a consistent step/total/text triple and
//! the percentage it implies. Only the upload orchestrator drives transitions.

use tokio::sync::watch;
use tracing::warn;

/// One observed point of a running or finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub step: usize,
    pub total: usize,
    pub status_text: String,
}

impl ProgressSnapshot {
    /// `floor(step / total * 100)`.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.step.min(self.total) * 100 / self.total) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProgressState {
    #[default]
    Idle,
    Running(ProgressSnapshot),
    Complete(ProgressSnapshot),
}

impl ProgressState {
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            Self::Idle => None,
            Self::Running(s) | Self::Complete(s) => Some(s),
        }
    }

    pub fn percent(&self) -> Option<u8> {
        self.snapshot().map(ProgressSnapshot::percent)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.snapshot().map(|s| s.status_text.as_str())
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// A read-only handle for presentation code.
pub type ProgressWatcher = watch::Receiver<ProgressState>;

/// Single-writer progress state machine: `Idle -> Running -> Complete -> Idle`.
pub struct ProgressReporter {
    tx: watch::Sender<ProgressState>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> ProgressWatcher {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    /// Starts a new session at step 0, discarding whatever the last one left behind.
    pub(crate) fn start(&self, total: usize, status_text: impl Into<String>) {
        self.tx.send_replace(ProgressState::Running(ProgressSnapshot {
            step: 0,
            total,
            status_text: status_text.into(),
        }));
    }

    /// Moves the running session to `step`. Steps never go backwards.
    pub(crate) fn advance(&self, step: usize, status_text: impl Into<String>) {
        let status_text = status_text.into();
        self.tx.send_if_modified(|state| {
            let ProgressState::Running(snapshot) = state else {
                warn!(step, "Progress update outside of a running session ignored");
                return false;
            };
            if step < snapshot.step {
                warn!(
                    step,
                    current = snapshot.step,
                    "Progress step would decrease; keeping current step"
                );
            } else {
                snapshot.step = step.min(snapshot.total);
            }
            snapshot.status_text = status_text;
            true
        });
    }

    /// Marks the session finished at 100%. The state is held until the next `start`.
    pub(crate) fn complete(&self, status_text: impl Into<String>) {
        let status_text = status_text.into();
        self.tx.send_if_modified(|state| {
            let ProgressState::Running(snapshot) = state else {
                return false;
            };
            let total = snapshot.total;
            *state = ProgressState::Complete(ProgressSnapshot {
                step: total,
                total,
                status_text,
            });
            true
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_replace(ProgressState::Idle);
    }
}
