use std::time::{Duration, Instant};

/// Timing of one frame, as handed to [`Viewer::tick`](crate::viewer::Viewer::tick).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Wall-clock instant of this frame; drives the settle delay and fades.
    pub now: Instant,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Seconds since the clock started; animates time-based effects.
    pub elapsed: f32,
    pub frame_count: u64,
}

/// Frame clock of the host loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start_time: Instant,
    last_update: Instant,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Clock whose origin is `start`. Lets tests drive time explicitly.
    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start_time: start,
            last_update: start,
            frame_count: 0,
        }
    }

    /// Advances to `now` and returns the frame's timing.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last_update);
        self.last_update = now;
        self.frame_count += 1;
        FrameTime {
            now,
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start_time).as_secs_f32(),
            frame_count: self.frame_count,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances by a fixed step.
    pub fn step(&mut self, dt: Duration) -> FrameTime {
        let now = self.last_update + dt;
        self.tick_at(now)
    }

    #[inline]
    #[must_use]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }
}
