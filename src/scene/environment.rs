//! Scene drawn by the viewer hosts: a cube-map background and loaded meshes.

use glam::Vec4;

use crate::renderer::backend::{PassTarget, RenderBackend};
use crate::renderer::effects::reborrow;
use crate::renderer::pass::SceneSource;
use crate::scene::PerspectiveCamera;

/// Backend-resident scene content.
///
/// Until a background arrives the target is cleared to `clear_color`. Meshes
/// are drawn in insertion order over the background.
pub struct EnvironmentScene<B: RenderBackend> {
    pub clear_color: Vec4,
    pub mesh_color: Vec4,
    background: Option<B::CubeMap>,
    meshes: Vec<B::Mesh>,
}

impl<B: RenderBackend> EnvironmentScene<B> {
    #[must_use]
    pub fn new(clear_color: Vec4) -> Self {
        Self {
            clear_color,
            mesh_color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            background: None,
            meshes: Vec::new(),
        }
    }

    /// Replaces the background cube map.
    pub fn set_background(&mut self, cube: B::CubeMap) {
        self.background = Some(cube);
    }

    pub fn add_mesh(&mut self, mesh: B::Mesh) {
        self.meshes.push(mesh);
    }

    #[inline]
    #[must_use]
    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    #[inline]
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl<B: RenderBackend> SceneSource<B> for EnvironmentScene<B> {
    fn draw(&self, backend: &mut B, camera: &PerspectiveCamera, mut target: PassTarget<'_, B::Surface>) {
        match &self.background {
            Some(cube) => backend.draw_background(cube, camera.background_matrix(), reborrow(&mut target)),
            None => backend.clear(self.clear_color, reborrow(&mut target)),
        }
        let view_projection = camera.view_projection_matrix();
        for mesh in &self.meshes {
            backend.draw_mesh(mesh, view_projection, self.mesh_color, reborrow(&mut target));
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for EnvironmentScene<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentScene")
            .field("clear_color", &self.clear_color)
            .field("has_background", &self.background.is_some())
            .field("meshes", &self.meshes.len())
            .finish_non_exhaustive()
    }
}
