//! # Lumen
//!
//! A post-processing viewer: a 3D scene is rendered through an ordered chain
//! of full-screen effects, hidden behind an overlay until every asset has
//! loaded, then revealed with a fade.
//!
//! ## Building blocks
//!
//! - [`renderer::capability`]: picks a multisampled or standard intermediate
//!   surface (plus an optional FXAA pass) from the adapter tier and pixel ratio
//! - [`renderer::PassChain`]: ordered, toggle-able effect passes over two
//!   ping-pong surfaces
//! - [`assets::LoadTracker`]: aggregates independent loads into one progress
//!   ratio and a single `Complete` event after a settle delay
//! - [`reveal::RevealTransition`]: `Loading → Revealing → Idle`, fades the
//!   overlay and releases gated passes
//! - [`renderer::ResizeCoordinator`]: keeps camera, screen and chain surfaces
//!   on the same viewport
//! - [`Viewer`]: runs all of the above once per frame
//!
//! ## Headless usage
//!
//! ```rust,ignore
//! use lumen::prelude::*;
//!
//! let tracker = LoadTracker::default();
//! let mut viewer = Viewer::new(
//!     CpuBackend::new(64, 64),
//!     &ViewerSettings::default(),
//!     SurfacePlan::default(),
//!     Viewport::new(64, 64, 1.0),
//!     tracker.clone(),
//! )?;
//!
//! let handle = tracker.register(ResourceKind::Texture, "normal map")?;
//! handle.resolve();
//!
//! let mut clock = FrameClock::new();
//! viewer.tick(&clock.tick(), &Input::new(), &ClearScene { color: Vec4::ONE });
//! ```

pub mod app;
pub mod assets;
pub mod errors;
pub mod renderer;
pub mod reveal;
pub mod scene;
pub mod settings;
pub mod utils;
pub mod viewer;

pub use errors::{AssetError, ChainError, Error, Result};
pub use settings::ViewerSettings;
pub use viewer::Viewer;

/// Commonly used types.
pub mod prelude {
    pub use glam::{Vec2, Vec3, Vec4};

    pub use crate::app::{Input, Key};
    pub use crate::assets::{LoadEvent, LoadProgress, LoadTracker, ResourceKind, TextureData};
    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::assets::{AssetLoader, AssetRequest, LoadedAsset};
    pub use crate::errors::{Error, Result};
    pub use crate::renderer::{
        Activation, CapabilityReport, ChainConfig, ClearScene, CpuBackend, FeatureTier, PassChain,
        PassSlot, RenderBackend, SceneSource, SurfacePlan, UniformValue, Viewport, probe,
    };
    pub use crate::reveal::{ReadinessObserver, RevealTransition, TransitionState};
    pub use crate::scene::{EnvironmentScene, PerspectiveCamera};
    pub use crate::settings::ViewerSettings;
    pub use crate::utils::{FrameClock, FrameTime, OrbitControls};
    pub use crate::viewer::Viewer;
}
