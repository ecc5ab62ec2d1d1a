//! Asset Load Tracker
//!
//! Aggregates the outcome of independent resource loads into one progress
//! ratio and one terminal [`LoadEvent::Complete`].
//!
//! # Session lifecycle
//!
//! ```text
//! register()* ──► first resolve/fail seals the session ──► … ──► loaded == total
//!                                                                  │ poll(now) detects
//!                                                                  ▼
//!                                                  poll(now ≥ detected + settle) ──► Complete (once)
//! ```
//!
//! - A failed resource counts toward `loaded` so one bad asset never blocks
//!   the reveal; the failure is still reported as [`LoadEvent::Failed`] and
//!   logged.
//! - A [`LoadHandle`] dropped without settling counts as a failure.
//! - After the session is sealed, [`LoadTracker::register`] is rejected so the
//!   total can no longer move.
//!
//! # Thread Safety
//!
//! `LoadTracker` is a cheap `Clone` around an `Arc`. Every counter update goes
//! through a single mutex, so handles can settle from any thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::errors::AssetError;
use crate::settings::LoadingSettings;

/// Category of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    CubeTexture,
    Mesh,
}

/// Snapshot of the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    /// Settled resources, failures included.
    pub loaded: usize,
    /// Subset of `loaded` that failed.
    pub failed: usize,
    pub total: usize,
}

impl LoadProgress {
    /// `loaded / total`, or 0 before anything is registered.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.loaded == self.total
    }
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A resource settled (successfully or not).
    Progress(LoadProgress),
    /// A resource failed; it still counts toward completion.
    Failed {
        label: String,
        kind: ResourceKind,
        reason: String,
    },
    /// Every registered resource settled and the settle delay elapsed.
    Complete(LoadProgress),
}

#[derive(Debug, Default)]
struct TrackerState {
    progress: LoadProgress,
    sealed: bool,
    detected_at: Option<Instant>,
    completed: bool,
    subscribers: Vec<flume::Sender<LoadEvent>>,
}

impl TrackerState {
    fn emit(&mut self, event: &LoadEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<TrackerState>,
    settle_delay: Duration,
}

impl Inner {
    /// Single entry point for every counter update.
    fn settle(&self, kind: ResourceKind, label: &str, failure: Option<&str>) {
        let mut state = self.state.lock();
        state.sealed = true;
        state.progress.loaded += 1;

        if let Some(reason) = failure {
            state.progress.failed += 1;
            log::warn!("Failed to load {kind:?} '{label}': {reason}");
            state.emit(&LoadEvent::Failed {
                label: label.to_string(),
                kind,
                reason: reason.to_string(),
            });
        } else {
            log::debug!("Loaded {kind:?} '{label}'");
        }

        let progress = state.progress;
        state.emit(&LoadEvent::Progress(progress));
    }
}

/// Shared completion counter of one loading session.
#[derive(Debug, Clone)]
pub struct LoadTracker {
    inner: Arc<Inner>,
}

impl LoadTracker {
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(TrackerState::default()),
                settle_delay,
            }),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &LoadingSettings) -> Self {
        Self::new(settings.settle_delay())
    }

    /// Adds one resource to the session.
    ///
    /// # Errors
    ///
    /// [`AssetError::SessionSealed`] once any resource has settled.
    pub fn register(
        &self,
        kind: ResourceKind,
        label: impl Into<String>,
    ) -> Result<LoadHandle, AssetError> {
        let label = label.into();
        let mut state = self.inner.state.lock();
        if state.sealed {
            log::warn!("Rejected late registration of {kind:?} '{label}'");
            return Err(AssetError::SessionSealed(label));
        }
        state.progress.total += 1;
        drop(state);

        Ok(LoadHandle {
            tracker: Arc::clone(&self.inner),
            kind,
            label,
            settled: false,
        })
    }

    /// Returns a receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<LoadEvent> {
        let (tx, rx) = flume::unbounded();
        self.inner.state.lock().subscribers.push(tx);
        rx
    }

    #[must_use]
    pub fn progress(&self) -> LoadProgress {
        self.inner.state.lock().progress
    }

    /// Advances the settle timer. Emits [`LoadEvent::Complete`] and returns
    /// `true` on the single call where the session completes.
    pub fn poll(&self, now: Instant) -> bool {
        let mut state = self.inner.state.lock();
        if state.completed || !state.progress.is_finished() {
            return false;
        }

        let detected = *state.detected_at.get_or_insert(now);
        if now.saturating_duration_since(detected) < self.inner.settle_delay {
            return false;
        }

        state.completed = true;
        let progress = state.progress;
        log::info!(
            "All {} resources settled ({} failed)",
            progress.total,
            progress.failed
        );
        state.emit(&LoadEvent::Complete(progress));
        true
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inner.state.lock().completed
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.inner.state.lock().sealed
    }

    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.inner.settle_delay
    }
}

impl Default for LoadTracker {
    fn default() -> Self {
        Self::from_settings(&LoadingSettings::default())
    }
}

/// Pending resource. Settle it exactly once with [`resolve`](Self::resolve) or
/// [`fail`](Self::fail); dropping it unsettled records a failure.
#[derive(Debug)]
#[must_use = "an unsettled handle counts as a failed load when dropped"]
pub struct LoadHandle {
    tracker: Arc<Inner>,
    kind: ResourceKind,
    label: String,
    settled: bool,
}

impl LoadHandle {
    pub fn resolve(mut self) {
        self.settled = true;
        self.tracker.settle(self.kind, &self.label, None);
    }

    pub fn fail(mut self, reason: impl AsRef<str>) {
        self.settled = true;
        self.tracker.settle(self.kind, &self.label, Some(reason.as_ref()));
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.settle(self.kind, &self.label, Some("abandoned"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_empty_session_is_zero() {
        assert!(LoadProgress::default().ratio().abs() < f32::EPSILON);
        assert!(!LoadProgress::default().is_finished());
    }

    #[test]
    fn zero_delay_completes_on_detection() {
        let tracker = LoadTracker::new(Duration::ZERO);
        tracker.register(ResourceKind::Mesh, "m").unwrap().resolve();
        assert!(tracker.poll(Instant::now()));
        assert!(!tracker.poll(Instant::now()));
    }
}
