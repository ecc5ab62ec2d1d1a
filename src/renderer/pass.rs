//! Pass abstraction of the post-processing chain.
//!
//! A [`PassSlot`] is what the chain stores: a unique name, the `enabled` and
//! `terminal` flags, an activation gate and the pass's uniforms, wrapped around
//! the [`PostPass`] node that actually draws.
//!
//! Nodes never see the chain. They receive a [`PassContext`] (backend plus the
//! frame's scene state), their own uniforms, the previous pass's output and a
//! [`PassTarget`] to write to.

use glam::Vec4;

use crate::renderer::backend::{PassTarget, RenderBackend};
use crate::renderer::surface::SurfaceDescriptor;
use crate::renderer::uniforms::Uniforms;
use crate::scene::PerspectiveCamera;

/// Draws the 3D scene. Implemented by the host; the scene itself is outside
/// the chain's concern.
pub trait SceneSource<B: RenderBackend> {
    fn draw(&self, backend: &mut B, camera: &PerspectiveCamera, target: PassTarget<'_, B::Surface>);
}

/// A scene that is just a clear color.
#[derive(Debug, Clone, Copy)]
pub struct ClearScene {
    pub color: Vec4,
}

impl<B: RenderBackend> SceneSource<B> for ClearScene {
    fn draw(&self, backend: &mut B, _camera: &PerspectiveCamera, target: PassTarget<'_, B::Surface>) {
        backend.clear(self.color, target);
    }
}

/// Scene state handed to [`PassChain::execute`](crate::renderer::PassChain::execute).
pub struct SceneFrame<'a, B: RenderBackend> {
    pub source: &'a dyn SceneSource<B>,
    pub camera: &'a PerspectiveCamera,
    /// Seconds since start, for animated effects.
    pub time: f32,
}

/// Per-invocation context.
pub struct PassContext<'a, B: RenderBackend> {
    pub backend: &'a mut B,
    pub frame: &'a SceneFrame<'a, B>,
}

/// One stage of the chain.
pub trait PostPass<B: RenderBackend> {
    /// Reads `input` (unless this is the scene pass) and writes `target`.
    fn render(
        &mut self,
        ctx: &mut PassContext<'_, B>,
        uniforms: &Uniforms,
        input: &B::Surface,
        target: PassTarget<'_, B::Surface>,
    );

    /// Called after the chain recreated its surfaces.
    fn resize(&mut self, _desc: &SurfaceDescriptor) {}

    /// `true` only for the pass that draws the scene at position 0.
    fn is_scene(&self) -> bool {
        false
    }
}

/// When a pass may become enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Controlled only through `set_enabled`.
    #[default]
    Always,
    /// Enabled automatically once every asset has loaded.
    OnReady,
}

/// A named pass plus its chain-level state.
pub struct PassSlot<B: RenderBackend> {
    pub(crate) name: String,
    pub(crate) enabled: bool,
    pub(crate) terminal: bool,
    pub(crate) activation: Activation,
    pub(crate) uniforms: Uniforms,
    pub(crate) node: Box<dyn PostPass<B>>,
}

impl<B: RenderBackend> PassSlot<B> {
    /// Creates an enabled, non-terminal slot with no uniforms.
    pub fn new(name: impl Into<String>, node: impl PostPass<B> + 'static) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            terminal: false,
            activation: Activation::Always,
            uniforms: Uniforms::new(),
            node: Box::new(node),
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Marks this pass as the one writing to the screen.
    #[must_use]
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    #[must_use]
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    #[must_use]
    pub fn uniforms(mut self, uniforms: Uniforms) -> Self {
        self.uniforms = uniforms;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[inline]
    #[must_use]
    pub fn activation_gate(&self) -> Activation {
        self.activation
    }
}

impl<B: RenderBackend> std::fmt::Debug for PassSlot<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassSlot")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("terminal", &self.terminal)
            .field("activation", &self.activation)
            .finish_non_exhaustive()
    }
}
