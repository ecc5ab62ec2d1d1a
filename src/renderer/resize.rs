//! Resize Coordinator
//!
//! Keeps the camera projection, the base renderer surface (screen) and the
//! pass chain's intermediate surfaces on the same viewport. Window events only
//! [`request`](ResizeCoordinator::request) a size; the frame loop
//! [`apply`](ResizeCoordinator::apply)s the latest request between frames, so a
//! frame never sees a half-resized pipeline.

use crate::renderer::backend::RenderBackend;
use crate::renderer::chain::PassChain;
use crate::renderer::surface::Viewport;
use crate::scene::PerspectiveCamera;

#[derive(Debug, Clone, Default)]
pub struct ResizeCoordinator {
    pending: Option<Viewport>,
}

impl ResizeCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a viewport change. Only the most recent request is kept.
    pub fn request(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.pending = Some(Viewport::new(width, height, pixel_ratio));
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<Viewport> {
        self.pending
    }

    /// Applies the queued viewport, if any. Returns the applied (clamped)
    /// viewport.
    pub fn apply<B: RenderBackend>(
        &mut self,
        camera: &mut PerspectiveCamera,
        backend: &mut B,
        chain: &mut PassChain<B>,
    ) -> Option<Viewport> {
        let viewport = self.pending.take()?;
        Some(Self::resize_now(camera, backend, chain, viewport))
    }

    /// Resizes everything immediately.
    pub fn resize_now<B: RenderBackend>(
        camera: &mut PerspectiveCamera,
        backend: &mut B,
        chain: &mut PassChain<B>,
        viewport: Viewport,
    ) -> Viewport {
        let clamped = viewport.clamped(chain.config().pixel_ratio_ceiling);

        camera.set_aspect(clamped.aspect());

        let (width, height) = clamped.physical_size();
        backend.resize_output(width, height);

        chain.resize(backend, clamped.width, clamped.height, clamped.pixel_ratio);

        log::debug!(
            "Viewport resized to {}x{} @ {} ({width}x{height} device pixels)",
            clamped.width,
            clamped.height,
            clamped.pixel_ratio
        );
        clamped
    }
}
