//! Viewer Core
//!
//! [`Viewer`] ties the pieces together: it owns the render backend, the pass
//! chain, the camera and its orbit controls, the load tracker and the reveal
//! transition. It has no window management of its own and can be driven by the
//! winit host or, with a [`CpuBackend`](crate::renderer::CpuBackend), headless.
//!
//! # Frame order
//!
//! ```text
//! tick()
//!  ├─ apply queued resize           (camera aspect, screen, chain surfaces)
//!  ├─ poll tracker                  (settle delay)
//!  ├─ drain tracker events          (Progress → loading bar, Complete → reveal)
//!  ├─ update reveal                 (overlay_alpha → scene pass)
//!  ├─ update orbit controls
//!  └─ begin_frame → chain.execute → end_frame
//! ```

use std::time::Instant;

use glam::Vec3;

use crate::app::input::Input;
use crate::assets::{LoadEvent, LoadProgress, LoadTracker};
use crate::errors::Result;
use crate::renderer::backend::RenderBackend;
use crate::renderer::capability::SurfacePlan;
use crate::renderer::chain::{ChainConfig, PassChain};
use crate::renderer::effects::{names, standard_passes};
use crate::renderer::pass::{PassSlot, SceneFrame, SceneSource};
use crate::renderer::resize::ResizeCoordinator;
use crate::renderer::surface::Viewport;
use crate::reveal::{IndicatorState, RevealTransition, TransitionState};
use crate::scene::PerspectiveCamera;
use crate::settings::ViewerSettings;
use crate::utils::{FrameTime, OrbitControls};

/// Frame-driven viewer over a render backend.
pub struct Viewer<B: RenderBackend> {
    pub backend: B,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,

    chain: PassChain<B>,
    tracker: LoadTracker,
    events: flume::Receiver<LoadEvent>,
    reveal: RevealTransition,
    resize: ResizeCoordinator,
}

impl<B: RenderBackend> Viewer<B> {
    /// Builds a viewer with the standard pass chain.
    pub fn new(
        backend: B,
        settings: &ViewerSettings,
        plan: SurfacePlan,
        viewport: Viewport,
        tracker: LoadTracker,
    ) -> Result<Self> {
        let passes = standard_passes(&plan, Vec3::from_array(settings.reveal.overlay_color));
        Self::with_passes(backend, settings, plan, viewport, tracker, passes)
    }

    /// Builds a viewer around a custom pass list. Element 0 must draw the scene.
    pub fn with_passes(
        mut backend: B,
        settings: &ViewerSettings,
        plan: SurfacePlan,
        viewport: Viewport,
        tracker: LoadTracker,
        passes: Vec<PassSlot<B>>,
    ) -> Result<Self> {
        let config = ChainConfig::new(plan, &settings.renderer);
        let mut chain = PassChain::new(&mut backend, config, viewport, passes)?;

        let mut camera = PerspectiveCamera::from_settings(&settings.camera, chain.viewport().aspect());
        let viewport = *chain.viewport();
        ResizeCoordinator::resize_now(&mut camera, &mut backend, &mut chain, viewport);

        let controls = OrbitControls::from_settings(&settings.controls, &camera, Vec3::ZERO);
        let events = tracker.subscribe();

        Ok(Self {
            backend,
            camera,
            controls,
            chain,
            tracker,
            events,
            reveal: RevealTransition::from_settings(&settings.reveal),
            resize: ResizeCoordinator::new(),
        })
    }

    /// Queues a viewport change; applied at the start of the next tick.
    pub fn request_resize(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.resize.request(width, height, pixel_ratio);
    }

    /// Runs one frame.
    pub fn tick(&mut self, time: &FrameTime, input: &Input, scene: &dyn SceneSource<B>) {
        self.resize
            .apply(&mut self.camera, &mut self.backend, &mut self.chain);

        self.tracker.poll(time.now);
        self.drain_load_events(time.now);

        self.reveal.update(time.now);
        if let Err(e) = self.chain.set_uniform(
            names::SCENE,
            names::OVERLAY_ALPHA,
            self.reveal.overlay_alpha(),
        ) {
            log::trace!("Overlay alpha not applied: {e}");
        }

        self.controls.update(&mut self.camera, input, time.dt);

        if self.backend.begin_frame() {
            let frame = SceneFrame {
                source: scene,
                camera: &self.camera,
                time: time.elapsed,
            };
            self.chain.execute(&mut self.backend, &frame);
            self.backend.end_frame();
        }
    }

    /// Starts the reveal without waiting for the tracker. Used when a session
    /// has nothing to load, since an empty tracker never completes.
    pub fn reveal_now(&mut self, now: Instant) {
        self.reveal.on_complete(now, &mut self.chain);
    }

    fn drain_load_events(&mut self, now: Instant) {
        for event in self.events.try_iter() {
            match event {
                LoadEvent::Progress(progress) => self.reveal.set_progress(progress),
                LoadEvent::Failed { .. } => {}
                LoadEvent::Complete(_) => {
                    self.reveal.on_complete(now, &mut self.chain);
                }
            }
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn progress(&self) -> LoadProgress {
        self.tracker.progress()
    }

    #[inline]
    #[must_use]
    pub fn transition_state(&self) -> TransitionState {
        self.reveal.state()
    }

    #[inline]
    #[must_use]
    pub fn indicator(&self) -> IndicatorState {
        self.reveal.indicator()
    }

    #[inline]
    #[must_use]
    pub fn overlay_alpha(&self) -> f32 {
        self.reveal.overlay_alpha()
    }

    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    #[inline]
    #[must_use]
    pub fn chain(&self) -> &PassChain<B> {
        &self.chain
    }

    /// Mutable chain access for the debug-panel collaborator.
    #[inline]
    pub fn chain_mut(&mut self) -> &mut PassChain<B> {
        &mut self.chain
    }
}

impl<B: RenderBackend> std::fmt::Debug for Viewer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("chain", &self.chain)
            .field("camera", &self.camera)
            .field("reveal", &self.reveal)
            .finish_non_exhaustive()
    }
}
