//! Render Backends
//!
//! The pass chain is written against [`RenderBackend`], which owns the screen
//! (base renderer surface), creates intermediate surfaces and knows how to run
//! each effect:
//!
//! - [`CpuBackend`]: software RGBA float images. Deterministic, needs no GPU,
//!   used by the test-suite and headless tooling.
//! - [`GpuBackend`]: wgpu textures and full-screen pipelines presenting to a
//!   window surface.
//!
//! # Frame protocol
//!
//! ```text
//! begin_frame() ──► [clear / draw_background / draw_mesh / apply_effect / composite_overlay]* ──► end_frame()
//! ```
//!
//! Scene content (cube maps and meshes) is uploaded once into backend handles
//! and then drawn by the host's [`SceneSource`](crate::renderer::SceneSource).
//!
//! Every drawing call receives a [`PassTarget`], which is either one of the
//! chain's intermediate surfaces or the screen.

pub mod cpu;
pub mod gpu;

pub use cpu::{CpuBackend, CpuImage, CpuSurface};
pub use gpu::{GpuBackend, GpuSurface};

use glam::{Mat4, Vec3, Vec4};

use crate::assets::{MeshData, TextureData};
use crate::renderer::effects::EffectParams;
use crate::renderer::surface::SurfaceDescriptor;

/// Key light of [`RenderBackend::draw_mesh`], not normalised.
pub const MESH_LIGHT_DIR: Vec3 = Vec3::new(0.5, 1.0, 0.25);

/// Flat two-sided shading of a face with world-space `normal`.
#[must_use]
pub fn mesh_shade(color: Vec4, normal: Vec3) -> Vec4 {
    let k = 0.3 + 0.7 * normal.dot(MESH_LIGHT_DIR.normalize()).abs();
    (color.truncate() * k).extend(color.w)
}

/// Destination of a drawing operation.
pub enum PassTarget<'a, S> {
    /// One of the chain's intermediate surfaces.
    Surface(&'a mut S),
    /// The visible display.
    Screen,
}

/// Storage and execution backend of the pass chain.
pub trait RenderBackend {
    /// Backend-specific intermediate surface.
    type Surface;
    /// Uploaded six-face environment map.
    type CubeMap;
    /// Uploaded triangle mesh.
    type Mesh;

    /// Allocates a new surface. Surfaces are never resized in place.
    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> Self::Surface;

    /// Resizes the base renderer surface (the screen), in device pixels.
    fn resize_output(&mut self, width: u32, height: u32);

    /// Current screen size in device pixels.
    fn output_size(&self) -> (u32, u32);

    /// Prepares a new frame. Returns `false` if the frame must be skipped
    /// (e.g. the swap chain image could not be acquired).
    fn begin_frame(&mut self) -> bool;

    /// Submits and presents the frame.
    fn end_frame(&mut self);

    /// Fills the target with a solid color.
    fn clear(&mut self, color: Vec4, target: PassTarget<'_, Self::Surface>);

    /// Runs one full-screen effect reading `input`.
    fn apply_effect(
        &mut self,
        effect: &EffectParams,
        input: &Self::Surface,
        target: PassTarget<'_, Self::Surface>,
    );

    /// Blends a flat color over the target using `color.w` as alpha.
    fn composite_overlay(&mut self, color: Vec4, target: PassTarget<'_, Self::Surface>);

    /// Uploads cube faces in `+X, -X, +Y, -Y, +Z, -Z` order.
    fn upload_cube_map(&mut self, faces: &[TextureData; 6]) -> Self::CubeMap;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Self::Mesh;

    /// Fills the target with the cube map seen along each pixel's view ray.
    /// `inverse_view_projection` maps far-plane clip positions to directions
    /// (see [`PerspectiveCamera::background_matrix`](crate::scene::PerspectiveCamera::background_matrix)).
    fn draw_background(
        &mut self,
        cube: &Self::CubeMap,
        inverse_view_projection: Mat4,
        target: PassTarget<'_, Self::Surface>,
    );

    /// Draws a depth-tested mesh over the target with flat hemisphere
    /// lighting in `color`.
    fn draw_mesh(
        &mut self,
        mesh: &Self::Mesh,
        view_projection: Mat4,
        color: Vec4,
        target: PassTarget<'_, Self::Surface>,
    );
}
