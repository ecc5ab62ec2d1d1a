//! Winit Host
//!
//! Windowed front-end of the viewer, built on
//! [winit](https://crates.io/crates/winit).
//!
//! # Startup
//!
//! 1. Create the window and the [`GpuContext`]
//! 2. Probe the adapter tier and clamped pixel ratio ([`probe`]), then fit
//!    the configured sample count to the adapter ([`fit_sample_count`])
//! 3. Build the [`Viewer`] with the standard pass chain
//! 4. Register every asset with the tracker, then start loading
//!
//! After that each redraw drains decoded assets, applies the keyboard debug
//! bindings and ticks the viewer.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen::app::App;
//! use lumen::assets::AssetRequest;
//!
//! App::new()
//!     .with_title("Post Processing")
//!     .with_asset_root("assets")
//!     .with_normal_map("textures/interfaceNormalMap.png")
//!     .with_asset(AssetRequest::mesh("models/DamagedHelmet/glTF/DamagedHelmet.gltf"))
//!     .run()?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec4;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use crate::app::bindings::apply_debug_bindings;
use crate::app::input::{Input, Key};
use crate::assets::{AssetLoader, AssetRequest, LoadTracker, LoadedAsset};
use crate::errors::{Error, Result};
use crate::renderer::backend::{GpuBackend, RenderBackend};
use crate::renderer::capability::{CapabilityReport, fit_sample_count, probe};
use crate::renderer::context::GpuContext;
use crate::renderer::effects::names;
use crate::renderer::surface::{ColorSpace, Viewport};
use crate::renderer::uniforms::UniformValue;
use crate::scene::EnvironmentScene;
use crate::settings::ViewerSettings;
use crate::utils::FrameClock;
use crate::viewer::Viewer;

pub mod input_adapter;

/// Application builder.
pub struct App {
    title: String,
    settings: ViewerSettings,
    asset_root: PathBuf,
    assets: Vec<AssetRequest>,
    normal_map: Option<PathBuf>,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "Lumen Viewer".into(),
            settings: ViewerSettings::default(),
            asset_root: PathBuf::from("."),
            assets: Vec::new(),
            normal_map: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ViewerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Directory every asset path is resolved against.
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Adds a resource the reveal waits for.
    #[must_use]
    pub fn with_asset(mut self, request: AssetRequest) -> Self {
        self.assets.push(request);
        self
    }

    /// Texture bound to the displacement pass once it has loaded.
    #[must_use]
    pub fn with_normal_map(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.assets
            .push(AssetRequest::texture(path.clone(), ColorSpace::Linear));
        self.normal_map = Some(path);
        self
    }

    /// Runs the event loop until the window closes.
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::new(self);
        event_loop.run_app(&mut runner).map_err(Error::from)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

struct AppRunner {
    config: App,

    window: Option<Arc<Window>>,
    viewer: Option<Viewer<GpuBackend>>,
    loader: Option<AssetLoader>,
    scene: EnvironmentScene<GpuBackend>,

    input: Input,
    clock: FrameClock,
}

impl AppRunner {
    fn new(config: App) -> Self {
        let scene = EnvironmentScene::new(Vec4::from_array(config.settings.renderer.clear_color));
        Self {
            config,
            window: None,
            viewer: None,
            loader: None,
            scene,
            input: Input::new(),
            clock: FrameClock::new(),
        }
    }

    fn init(&mut self, window: &Arc<Window>) -> Result<()> {
        let settings = &self.config.settings;
        let size = window.inner_size();
        let scale_factor = window.scale_factor() as f32;

        log::info!("Initializing Renderer Backend...");
        let ctx = pollster::block_on(GpuContext::new(
            window.clone(),
            &settings.renderer,
            size.width,
            size.height,
        ))?;

        let pixel_ratio = scale_factor.min(settings.renderer.pixel_ratio_ceiling);
        let plan = probe(&CapabilityReport::new(pixel_ratio, ctx.tier));
        let (plan, msaa_samples) =
            fit_sample_count(plan, settings.renderer.msaa_samples, &ctx.sample_counts);
        let mut settings = settings.clone();
        settings.renderer.msaa_samples = msaa_samples;
        let viewport = logical_viewport(size.width, size.height, scale_factor);

        let tracker = LoadTracker::from_settings(&settings.loading);
        let mut viewer =
            Viewer::new(GpuBackend::new(ctx), &settings, plan, viewport, tracker.clone())?;
        self.input.inject_resize(size.width, size.height);

        let loader = AssetLoader::new(self.config.asset_root.clone(), tracker)?;
        let count = loader.load(self.config.assets.iter().cloned())?;
        if count == 0 {
            log::warn!("No assets to wait for, revealing immediately");
            viewer.reveal_now(self.clock.start_time());
        }

        self.viewer = Some(viewer);
        self.loader = Some(loader);
        Ok(())
    }

    fn receive_assets(&mut self) {
        let (Some(viewer), Some(loader)) = (&mut self.viewer, &self.loader) else {
            return;
        };
        let normal_map = self
            .config
            .normal_map
            .as_ref()
            .map(|p| p.display().to_string());

        for asset in loader.inbox().try_iter() {
            match asset {
                LoadedAsset::Texture { label, texture } if Some(&label) == normal_map.as_ref() => {
                    if let Err(e) = viewer.chain_mut().set_uniform(
                        names::DISPLACEMENT,
                        names::NORMAL_MAP,
                        UniformValue::Texture(Some(texture)),
                    ) {
                        log::warn!("{e}");
                    }
                }
                LoadedAsset::CubeTexture { label, faces } => {
                    log::debug!("Cube map '{label}' set as background");
                    self.scene.set_background(viewer.backend.upload_cube_map(&faces));
                }
                LoadedAsset::Mesh { label, mesh } => {
                    log::debug!("Mesh '{label}' added ({} triangles)", mesh.triangle_count());
                    self.scene.add_mesh(viewer.backend.upload_mesh(&mesh));
                }
                other => log::debug!("Asset '{}' ready", other.label()),
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.key_down(Key::Escape) {
            event_loop.exit();
            return;
        }

        self.receive_assets();

        let time = self.clock.tick();
        if let Some(viewer) = &mut self.viewer {
            apply_debug_bindings(viewer.chain_mut(), &self.input);
            viewer.tick(&time, &self.input, &self.scene);
        }
        self.input.end_frame();
    }
}

/// Converts a physical window size into a logical viewport.
fn logical_viewport(width: u32, height: u32, scale_factor: f32) -> Viewport {
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    Viewport::new(
        (width as f32 / scale).round() as u32,
        (height as f32 / scale).round() as u32,
        scale,
    )
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        if let Err(e) = self.init(&window) {
            log::error!("Fatal Renderer Error: {e}");
            event_loop.exit();
            return;
        }

        self.clock = FrameClock::new();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        input_adapter::process_window_event(&mut self.input, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                if let (Some(window), Some(viewer)) = (&self.window, &mut self.viewer) {
                    let scale_factor = window.scale_factor() as f32;
                    let viewport =
                        logical_viewport(physical_size.width, physical_size.height, scale_factor);
                    viewer.request_resize(viewport.width, viewport.height, viewport.pixel_ratio);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.viewer.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}
