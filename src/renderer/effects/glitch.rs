//! Digital glitch trigger state.
//!
//! The glitch effect is idle most of the time. Every 120–240 frames it fires a
//! strong burst, and during the first fifth of each period it produces weaker
//! jitter. With `go_wild` enabled every frame is a strong burst.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const MIN_TRIGGER_FRAMES: u32 = 120;
const MAX_TRIGGER_FRAMES: u32 = 240;

/// Per-frame glitch parameters consumed by the backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchFrame {
    /// When set the effect passes its input through unchanged.
    pub bypass: bool,
    pub amount: f32,
    pub angle: f32,
    pub seed: f32,
    pub seed_x: f32,
    pub seed_y: f32,
    pub distortion_x: f32,
    pub distortion_y: f32,
    pub col_s: f32,
}

impl GlitchFrame {
    #[must_use]
    pub fn bypassed() -> Self {
        Self {
            bypass: true,
            amount: 0.0,
            angle: 0.0,
            seed: 0.0,
            seed_x: 0.0,
            seed_y: 0.0,
            distortion_x: 0.0,
            distortion_y: 0.0,
            col_s: 0.05,
        }
    }
}

/// Frame counter and random source of one glitch pass.
#[derive(Debug)]
pub struct GlitchState {
    rng: StdRng,
    frame: u32,
    trigger: u32,
}

impl GlitchState {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let trigger = rng.random_range(MIN_TRIGGER_FRAMES..=MAX_TRIGGER_FRAMES);
        Self {
            rng,
            frame: 0,
            trigger,
        }
    }

    /// Advances one frame and returns the parameters to render with.
    pub fn advance(&mut self, go_wild: bool) -> GlitchFrame {
        let seed = self.rng.random_range(0.0..1.0f32);
        self.frame += 1;

        if self.frame % self.trigger == 0 || go_wild {
            let frame = GlitchFrame {
                bypass: false,
                amount: self.rng.random_range(0.0..1.0f32) / 30.0,
                angle: self.rng.random_range(-PI..PI),
                seed,
                seed_x: self.rng.random_range(-1.0..1.0),
                seed_y: self.rng.random_range(-1.0..1.0),
                distortion_x: self.rng.random_range(0.0..1.0),
                distortion_y: self.rng.random_range(0.0..1.0),
                col_s: 0.05,
            };
            self.frame = 0;
            self.trigger = self
                .rng
                .random_range(MIN_TRIGGER_FRAMES..=MAX_TRIGGER_FRAMES);
            frame
        } else if self.frame % self.trigger < self.trigger / 5 {
            GlitchFrame {
                bypass: false,
                amount: self.rng.random_range(0.0..1.0f32) / 90.0,
                angle: self.rng.random_range(-PI..PI),
                seed,
                seed_x: self.rng.random_range(-0.3..0.3),
                seed_y: self.rng.random_range(-0.3..0.3),
                distortion_x: self.rng.random_range(0.0..1.0),
                distortion_y: self.rng.random_range(0.0..1.0),
                col_s: 0.05,
            }
        } else {
            GlitchFrame::bypassed()
        }
    }
}
