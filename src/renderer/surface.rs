//! Viewport and intermediate surface descriptors.
//!
//! A [`SurfaceDescriptor`] is the backend-independent description of one
//! offscreen image of the pass chain. Backends turn descriptors into real
//! storage (`CpuSurface`, `GpuSurface`); the chain recreates them from scratch
//! whenever the viewport changes, so two descriptors built from the same
//! viewport and plan are always equal.

use crate::renderer::capability::SurfacePlan;
use crate::renderer::context::INTERMEDIATE_FORMAT;

/// Lower bound for any physical dimension.
pub const MIN_SURFACE_SIZE: u32 = 1;

/// Color space in which surface contents are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// Host window size in logical pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Clamps dimensions to at least 1×1 and the pixel ratio into
    /// `(0, ceiling]`. A non-finite or non-positive ratio becomes 1.
    #[must_use]
    pub fn clamped(self, ceiling: f32) -> Self {
        if self.width == 0 || self.height == 0 {
            log::warn!(
                "Degenerate viewport {}x{}, clamping to at least 1x1",
                self.width,
                self.height
            );
        }

        let ratio = if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };

        Self {
            width: self.width.max(MIN_SURFACE_SIZE),
            height: self.height.max(MIN_SURFACE_SIZE),
            pixel_ratio: ratio.min(ceiling.max(f32::MIN_POSITIVE)),
        }
    }

    /// Width / height.
    #[inline]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width.max(MIN_SURFACE_SIZE) as f32 / self.height.max(MIN_SURFACE_SIZE) as f32
    }

    /// Size in device pixels.
    #[inline]
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.width as f32 * self.pixel_ratio).floor() as u32;
        let h = (self.height as f32 * self.pixel_ratio).floor() as u32;
        (w.max(MIN_SURFACE_SIZE), h.max(MIN_SURFACE_SIZE))
    }
}

/// Description of one intermediate render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
    pub color_space: ColorSpace,
    pub sample_count: u32,
}

impl SurfaceDescriptor {
    /// Builds the descriptor for a (clamped) viewport and a surface plan.
    #[must_use]
    pub fn for_viewport(viewport: &Viewport, plan: &SurfacePlan, msaa_samples: u32) -> Self {
        let (width, height) = viewport.physical_size();
        Self {
            width,
            height,
            format: INTERMEDIATE_FORMAT,
            filter: wgpu::FilterMode::Linear,
            color_space: ColorSpace::Srgb,
            sample_count: plan.sample_count(msaa_samples),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
