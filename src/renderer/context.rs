//! wgpu Context
//!
//! The [`GpuContext`] holds core GPU handles: device, queue, surface and its
//! configuration. It is responsible for window surface management and resize
//! handling, and records the adapter's capability tier for the probe.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use smallvec::SmallVec;

use crate::errors::{Error, Result};
use crate::renderer::capability::{FeatureTier, supported_sample_counts};
use crate::settings::RendererSettings;

/// Format of every intermediate surface of the pass chain.
pub const INTERMEDIATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Core wgpu context holding GPU handles.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// The window surface for presentation
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    /// Multisampling tier of the adapter for [`INTERMEDIATE_FORMAT`]
    pub tier: FeatureTier,
    /// Multisample counts usable with [`INTERMEDIATE_FORMAT`]
    pub sample_counts: SmallVec<[u32; 4]>,
}

impl GpuContext {
    pub async fn new<W>(
        window: W,
        settings: &RendererSettings,
        width: u32,
        height: u32,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::AdapterRequestFailed(e.to_string()))?;

        log::info!("Using adapter: {}", adapter.get_info().name);
        let tier = FeatureTier::from_adapter(&adapter, INTERMEDIATE_FORMAT);
        let sample_counts = supported_sample_counts(&adapter, INTERMEDIATE_FORMAT);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let mut config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or_else(|| {
                Error::AdapterRequestFailed("Surface not supported by adapter".to_string())
            })?;

        config.present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            tier,
            sample_counts,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Re-applies the current configuration, e.g. after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Returns the surface color format.
    #[inline]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current surface dimensions.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
