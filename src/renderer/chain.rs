//! Pass Chain
//!
//! Ordered list of [`PassSlot`]s transforming the rendered scene into the final
//! displayed image.
//!
//! # Execution
//!
//! ```text
//! scene ──► read ──► pass ──► write ─┐ (swap)
//!                                    └► read ──► … ──► terminal ──► Screen
//! ```
//!
//! - Enabled passes run strictly in list order, disabled passes are skipped
//!   entirely (no copy).
//! - The scene pass at element 0 is the only source of fresh pixels. The
//!   setters refuse to disable it, and a chain built with it disabled draws
//!   nothing, so a previous frame is never fed forward.
//! - The terminal is the enabled pass marked [`PassSlot::terminal`], or the
//!   last enabled pass when none is marked. Enabled passes after an explicit
//!   terminal do not run.
//! - Two intermediate surfaces are ping-ponged; they are recreated, never
//!   resized in place, whenever [`PassChain::resize`] is called.
//!
//! # Mutation
//!
//! Hosts (and the debug panel) change passes only through the setters on the
//! chain. Every change is visible on the next [`PassChain::execute`].

use smallvec::SmallVec;

use crate::errors::ChainError;
use crate::renderer::backend::{PassTarget, RenderBackend};
use crate::renderer::capability::SurfacePlan;
use crate::renderer::pass::{Activation, PassContext, PassSlot, SceneFrame};
use crate::renderer::surface::{SurfaceDescriptor, Viewport};
use crate::renderer::uniforms::UniformValue;
use crate::reveal::ReadinessObserver;
use crate::settings::RendererSettings;

/// Construction parameters that stay fixed for the chain's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainConfig {
    pub plan: SurfacePlan,
    /// Sample count used when `plan` selects the multisampled surface.
    pub msaa_samples: u32,
    /// Upper bound applied to the pixel ratio on every resize.
    pub pixel_ratio_ceiling: f32,
}

impl ChainConfig {
    #[must_use]
    pub fn new(plan: SurfacePlan, settings: &RendererSettings) -> Self {
        Self {
            plan,
            msaa_samples: settings.msaa_samples,
            pixel_ratio_ceiling: settings.pixel_ratio_ceiling,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new(SurfacePlan::default(), &RendererSettings::default())
    }
}

/// Ordered post-processing chain.
pub struct PassChain<B: RenderBackend> {
    passes: Vec<PassSlot<B>>,
    config: ChainConfig,
    viewport: Viewport,
    desc: SurfaceDescriptor,
    read: B::Surface,
    write: B::Surface,
    ready: bool,
}

impl<B: RenderBackend> PassChain<B> {
    /// Builds a chain at the given viewport.
    ///
    /// # Errors
    ///
    /// - [`ChainError::MissingScenePass`] if element 0 does not draw the scene
    /// - [`ChainError::DuplicatePassName`] if two passes share a name
    /// - [`ChainError::DuplicateTerminalPass`] if more than one pass is terminal
    pub fn new(
        backend: &mut B,
        config: ChainConfig,
        viewport: Viewport,
        passes: Vec<PassSlot<B>>,
    ) -> Result<Self, ChainError> {
        if !passes.first().is_some_and(|p| p.node.is_scene()) {
            return Err(ChainError::MissingScenePass);
        }

        let mut terminal: Option<&str> = None;
        for (i, pass) in passes.iter().enumerate() {
            if passes[..i].iter().any(|p| p.name == pass.name) {
                return Err(ChainError::DuplicatePassName(pass.name.clone()));
            }
            if pass.terminal {
                if let Some(first) = terminal {
                    return Err(ChainError::DuplicateTerminalPass {
                        first: first.to_string(),
                        second: pass.name.clone(),
                    });
                }
                terminal = Some(&pass.name);
            }
        }

        let viewport = viewport.clamped(config.pixel_ratio_ceiling);
        let desc = SurfaceDescriptor::for_viewport(&viewport, &config.plan, config.msaa_samples);
        let read = backend.create_surface(&desc);
        let write = backend.create_surface(&desc);

        let mut chain = Self {
            passes,
            config,
            viewport,
            desc,
            read,
            write,
            ready: false,
        };
        for pass in &mut chain.passes {
            pass.node.resize(&desc);
        }

        log::debug!(
            "Pass chain built with {} passes at {}x{}",
            chain.passes.len(),
            desc.width,
            desc.height
        );
        Ok(chain)
    }

    /// Appends a pass, or inserts it at `position` (1..=len; the scene pass
    /// stays first). Returns the index the pass ended up at.
    pub fn add_pass(
        &mut self,
        mut pass: PassSlot<B>,
        position: Option<usize>,
    ) -> Result<usize, ChainError> {
        let len = self.passes.len();
        let index = match position {
            None => len,
            Some(p) if (1..=len).contains(&p) => p,
            Some(p) => return Err(ChainError::PositionOutOfRange { position: p, len }),
        };

        if self.find(&pass.name).is_some() {
            return Err(ChainError::DuplicatePassName(pass.name));
        }
        if pass.terminal {
            if let Some(first) = self.passes.iter().find(|p| p.terminal) {
                return Err(ChainError::DuplicateTerminalPass {
                    first: first.name.clone(),
                    second: pass.name,
                });
            }
        }
        if self.ready && pass.activation == Activation::OnReady {
            pass.enabled = true;
        }

        pass.node.resize(&self.desc);
        log::debug!("Pass '{}' added at {index}", pass.name);
        self.passes.insert(index, pass);
        Ok(index)
    }

    /// Runs every enabled pass in order and writes the terminal's output to
    /// the screen. Does nothing when the scene pass or every
    /// pass is disabled.
    pub fn execute(&mut self, backend: &mut B, frame: &SceneFrame<'_, B>) {
        let order = self.execution_order();
        let Some((&last, rest)) = order.split_last() else {
            return;
        };

        for &index in rest {
            let slot = &mut self.passes[index];
            let mut ctx = PassContext {
                backend: &mut *backend,
                frame,
            };
            slot.node.render(
                &mut ctx,
                &slot.uniforms,
                &self.read,
                PassTarget::Surface(&mut self.write),
            );
            std::mem::swap(&mut self.read, &mut self.write);
        }

        let slot = &mut self.passes[last];
        let mut ctx = PassContext { backend, frame };
        slot.node
            .render(&mut ctx, &slot.uniforms, &self.read, PassTarget::Screen);
    }

    /// Indices of the passes the next `execute` will run.
    fn execution_order(&self) -> SmallVec<[usize; 16]> {
        let mut order = SmallVec::new();
        if !self.passes.first().is_some_and(|p| p.enabled) {
            return order;
        }
        for (i, pass) in self.passes.iter().enumerate() {
            if !pass.enabled {
                continue;
            }
            order.push(i);
            if pass.terminal {
                break;
            }
        }
        order
    }

    /// Name of the pass that will write to the screen, if any pass is enabled.
    #[must_use]
    pub fn terminal_pass(&self) -> Option<&str> {
        self.execution_order()
            .last()
            .map(|&i| self.passes[i].name.as_str())
    }

    /// Recreates both intermediate surfaces for a new viewport. The pixel
    /// ratio is clamped to the configured ceiling and dimensions to 1×1.
    pub fn resize(&mut self, backend: &mut B, width: u32, height: u32, pixel_ratio: f32) {
        self.viewport =
            Viewport::new(width, height, pixel_ratio).clamped(self.config.pixel_ratio_ceiling);
        self.desc = SurfaceDescriptor::for_viewport(
            &self.viewport,
            &self.config.plan,
            self.config.msaa_samples,
        );
        self.read = backend.create_surface(&self.desc);
        self.write = backend.create_surface(&self.desc);

        for pass in &mut self.passes {
            pass.node.resize(&self.desc);
        }
        log::debug!(
            "Pass chain resized to {}x{} (ratio {})",
            self.desc.width,
            self.desc.height,
            self.viewport.pixel_ratio
        );
    }

    // ── Setters ────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// [`ChainError::SceneAlwaysEnabled`] when asked to disable the scene pass.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ChainError> {
        let index = self.index_of(name)?;
        if index == 0 && !enabled {
            return Err(ChainError::SceneAlwaysEnabled(name.to_string()));
        }
        self.passes[index].enabled = enabled;
        Ok(())
    }

    /// Flips `enabled` and returns the new value. The scene pass can only be
    /// toggled back on.
    pub fn toggle(&mut self, name: &str) -> Result<bool, ChainError> {
        let enabled = !self.passes[self.index_of(name)?].enabled;
        self.set_enabled(name, enabled)?;
        log::debug!("Pass '{name}' enabled: {enabled}");
        Ok(enabled)
    }

    /// Replaces the value of an existing uniform. The new value must have the
    /// same type as the current one.
    pub fn set_uniform(
        &mut self,
        pass: &str,
        uniform: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), ChainError> {
        let value = value.into();
        let slot = self.find_mut(pass)?;
        let current = slot
            .uniforms
            .get_mut(uniform)
            .ok_or_else(|| ChainError::UnknownUniform {
                pass: pass.to_string(),
                uniform: uniform.to_string(),
            })?;

        if !current.same_type(&value) {
            return Err(ChainError::UniformTypeMismatch {
                pass: pass.to_string(),
                uniform: uniform.to_string(),
                expected: current.type_name(),
                actual: value.type_name(),
            });
        }
        *current = value;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn uniform(&self, pass: &str, uniform: &str) -> Option<&UniformValue> {
        self.find(pass)?.uniforms.get(uniform)
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.find(name).map(|p| p.enabled)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PassSlot<B>> {
        self.find(name)
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|p| p.name.as_str())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Always `false`: the scene pass cannot be removed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn surface_descriptor(&self) -> &SurfaceDescriptor {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Whether gated passes have been released.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn find(&self, name: &str) -> Option<&PassSlot<B>> {
        self.passes.iter().find(|p| p.name == name)
    }

    fn index_of(&self, name: &str) -> Result<usize, ChainError> {
        self.passes
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ChainError::UnknownPass(name.to_string()))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut PassSlot<B>, ChainError> {
        self.passes
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ChainError::UnknownPass(name.to_string()))
    }
}

impl<B: RenderBackend> ReadinessObserver for PassChain<B> {
    fn on_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        for pass in &mut self.passes {
            if pass.activation == Activation::OnReady && !pass.enabled {
                pass.enabled = true;
                log::info!("Pass '{}' enabled after loading", pass.name);
            }
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for PassChain<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassChain")
            .field("passes", &self.passes)
            .field("desc", &self.desc)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}
