//! Utility Module
//!
//! - [`OrbitControls`]: Camera orbit controller for interactive viewing
//! - [`FrameClock`]: Frame timing of the host loop

pub mod orbit_control;
pub mod time;

pub use orbit_control::OrbitControls;
pub use time::{FrameClock, FrameTime};
