//! Viewer Settings
//!
//! Every tunable of the viewer lives in [`ViewerSettings`]. The struct is plain
//! data with serde support, so a host can ship a JSON file next to its assets
//! and override only the values it cares about:
//!
//! ```json
//! {
//!     "renderer": { "vsync": false, "pixel_ratio_ceiling": 1.5 },
//!     "reveal":   { "overlay_fade_ms": 1500 }
//! }
//! ```
//!
//! Missing sections and fields fall back to [`Default`], which reproduces the
//! reference viewer (75° camera at `(4, 1, -4)`, 500 ms settle delay, 3 s
//! overlay fade, 2 s indicator fade, pixel ratio clamped to 2).

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::Deserialize;

use crate::errors::Result;

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// GPU and surface configuration.
///
/// | Field                 | Description                                   | Default          |
/// |-----------------------|-----------------------------------------------|------------------|
/// | `vsync`               | Cap presentation to the display refresh rate  | `true`           |
/// | `high_performance`    | Prefer a discrete adapter                     | `true`           |
/// | `pixel_ratio_ceiling` | Upper bound applied to the device pixel ratio | `2.0`            |
/// | `msaa_samples`        | Sample count of the multisampled surface      | `4`              |
/// | `clear_color`         | Clear color of the scene pass (linear RGBA)   | `[0, 0, 0, 1]`   |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Enable vertical synchronization.
    pub vsync: bool,
    /// `true` selects `HighPerformance`, `false` selects `LowPower`.
    pub high_performance: bool,
    /// Ceiling for the device pixel ratio. Bounds intermediate surface memory
    /// on high-density displays.
    pub pixel_ratio_ceiling: f32,
    /// Sample count used when the probe selects the multisampled surface.
    pub msaa_samples: u32,
    /// Background clear color.
    pub clear_color: [f32; 4],
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            high_performance: true,
            pixel_ratio_ceiling: 2.0,
            msaa_samples: 4,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RendererSettings {
    /// Maps the boolean preference onto wgpu's adapter selection.
    #[inline]
    #[must_use]
    pub fn power_preference(&self) -> wgpu::PowerPreference {
        if self.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        }
    }
}

// ---------------------------------------------------------------------------
// LoadingSettings / RevealSettings
// ---------------------------------------------------------------------------

/// Load tracker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadingSettings {
    /// Delay between completion detection and the `Complete` event.
    pub settle_delay_ms: u64,
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self { settle_delay_ms: 500 }
    }
}

impl LoadingSettings {
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Reveal transition timing and overlay appearance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    /// Duration of the overlay fade to transparent.
    pub overlay_fade_ms: u64,
    /// Duration of the loading indicator fade.
    pub indicator_fade_ms: u64,
    /// Overlay color (RGB); alpha is driven by the transition.
    pub overlay_color: [f32; 3],
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            overlay_fade_ms: 3000,
            indicator_fade_ms: 2000,
            overlay_color: [0.15, 0.15, 0.15],
        }
    }
}

impl RevealSettings {
    #[inline]
    #[must_use]
    pub fn overlay_fade(&self) -> Duration {
        Duration::from_millis(self.overlay_fade_ms)
    }

    #[inline]
    #[must_use]
    pub fn indicator_fade(&self) -> Duration {
        Duration::from_millis(self.indicator_fade_ms)
    }
}

// ---------------------------------------------------------------------------
// CameraSettings / ControlSettings
// ---------------------------------------------------------------------------

/// Perspective camera defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [4.0, 1.0, -4.0],
        }
    }
}

impl CameraSettings {
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Orbit control limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            enable_pan: false,
            min_distance: 5.0,
            max_distance: 7.0,
            rotate_speed: 1.0,
            zoom_speed: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewerSettings
// ---------------------------------------------------------------------------

/// Complete viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub renderer: RendererSettings,
    pub loading: LoadingSettings,
    pub reveal: RevealSettings,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
}

impl ViewerSettings {
    /// Parses settings from a JSON document. Absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }
}
