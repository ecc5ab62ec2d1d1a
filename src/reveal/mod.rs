//! Reveal Transition
//!
//! Single-shot state machine that hides the scene behind an overlay until the
//! [`LoadTracker`](crate::assets::LoadTracker) reports completion, then fades
//! the overlay and the loading indicator out.
//!
//! ```text
//! Loading ──(Complete)──► Revealing ──(both fades elapsed)──► Idle
//! ```
//!
//! On the `Complete` notification the transition
//! 1. tells its [`ReadinessObserver`] (the pass chain) to release gated passes,
//! 2. tweens the overlay alpha from its current value to 0,
//! 3. tweens the indicator opacity to 0 and marks the loading bar ended.
//!
//! Further notifications are ignored and the state never returns to
//! `Loading`.

pub mod tween;

use std::time::{Duration, Instant};

pub use tween::{Ease, Tween};

use crate::assets::LoadProgress;
use crate::settings::RevealSettings;

/// Notified once, when every asset of the session has settled.
pub trait ReadinessObserver {
    fn on_ready(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Loading,
    Revealing,
    Idle,
}

/// What the loading indicator UI should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorState {
    /// Horizontal scale of the loading bar, the load ratio while loading.
    pub bar_scale: f32,
    /// Set when the reveal starts; the bar snaps back to full width.
    pub bar_ended: bool,
    pub opacity: f32,
    /// `false` once the fade reached zero.
    pub visible: bool,
}

impl Default for IndicatorState {
    fn default() -> Self {
        Self {
            bar_scale: 0.0,
            bar_ended: false,
            opacity: 1.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevealTransition {
    state: TransitionState,
    overlay_fade: Duration,
    indicator_fade: Duration,

    overlay_alpha: f32,
    indicator: IndicatorState,

    overlay_tween: Option<Tween>,
    indicator_tween: Option<Tween>,
}

impl RevealTransition {
    #[must_use]
    pub fn new(overlay_fade: Duration, indicator_fade: Duration) -> Self {
        Self {
            state: TransitionState::Loading,
            overlay_fade,
            indicator_fade,
            overlay_alpha: 1.0,
            indicator: IndicatorState::default(),
            overlay_tween: None,
            indicator_tween: None,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &RevealSettings) -> Self {
        Self::new(settings.overlay_fade(), settings.indicator_fade())
    }

    /// Mirrors a tracker progress event onto the loading bar.
    pub fn set_progress(&mut self, progress: LoadProgress) {
        if self.state == TransitionState::Loading {
            self.indicator.bar_scale = progress.ratio();
        }
    }

    /// Handles the tracker's `Complete` event. Returns `false` if the reveal
    /// already started.
    pub fn on_complete(&mut self, now: Instant, observer: &mut dyn ReadinessObserver) -> bool {
        if self.state != TransitionState::Loading {
            log::debug!("Ignoring repeated load completion");
            return false;
        }

        observer.on_ready();

        self.overlay_tween = Some(Tween::new(self.overlay_alpha, 0.0, now, self.overlay_fade));
        self.indicator_tween = Some(Tween::new(
            self.indicator.opacity,
            0.0,
            now,
            self.indicator_fade,
        ));
        self.indicator.bar_ended = true;
        self.indicator.bar_scale = 1.0;

        self.state = TransitionState::Revealing;
        log::info!(
            "Reveal started (overlay {:?}, indicator {:?})",
            self.overlay_fade,
            self.indicator_fade
        );
        self.update(now);
        true
    }

    /// Samples both fades. Moves to `Idle` once both have elapsed.
    pub fn update(&mut self, now: Instant) -> TransitionState {
        if self.state != TransitionState::Revealing {
            return self.state;
        }

        let mut finished = true;
        if let Some(tween) = &self.overlay_tween {
            self.overlay_alpha = tween.value(now);
            finished &= tween.is_finished(now);
        }
        if let Some(tween) = &self.indicator_tween {
            self.indicator.opacity = tween.value(now);
            finished &= tween.is_finished(now);
        }
        self.indicator.visible = self.indicator.opacity > 0.0;

        if finished {
            self.overlay_tween = None;
            self.indicator_tween = None;
            self.state = TransitionState::Idle;
            log::debug!("Reveal finished");
        }
        self.state
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Current overlay transparency, 1 while loading.
    #[inline]
    #[must_use]
    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    #[inline]
    #[must_use]
    pub fn indicator(&self) -> IndicatorState {
        self.indicator
    }
}

impl Default for RevealTransition {
    fn default() -> Self {
        Self::from_settings(&RevealSettings::default())
    }
}
