//! Rendering System
//!
//! Post-processing side of the viewer:
//!
//! - [`capability`]: picks the intermediate surface kind from the adapter tier
//!   and pixel ratio
//! - [`chain`]: the ordered, toggle-able pass list
//! - [`effects`]: the concrete passes and their parameters
//! - [`backend`]: CPU and wgpu implementations of surfaces and effects
//! - [`resize`]: keeps camera, screen and chain surfaces on one viewport
//! - [`context`]: wgpu device / queue / window surface

pub mod backend;
pub mod capability;
pub mod chain;
pub mod context;
pub mod effects;
pub mod pass;
pub mod resize;
pub mod surface;
pub mod uniforms;

pub use backend::{CpuBackend, GpuBackend, PassTarget, RenderBackend};
pub use capability::{
    CapabilityReport, FeatureTier, SurfaceKind, SurfacePlan, fit_sample_count, probe,
    supported_sample_counts,
};
pub use chain::{ChainConfig, PassChain};
pub use context::GpuContext;
pub use effects::{EffectKind, EffectParams, EffectPass, ScenePass, standard_passes};
pub use pass::{Activation, ClearScene, PassContext, PassSlot, PostPass, SceneFrame, SceneSource};
pub use resize::ResizeCoordinator;
pub use surface::{ColorSpace, SurfaceDescriptor, Viewport};
pub use uniforms::{TextureRef, UniformValue, Uniforms};
