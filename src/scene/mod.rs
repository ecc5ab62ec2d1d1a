//! Scene-side collaborators of the viewer.
//!
//! - [`PerspectiveCamera`]: projection and view of the 3D scene
//! - [`EnvironmentScene`]: cube-map background plus loaded meshes, the
//!   [`SceneSource`](crate::renderer::SceneSource) used by the windowed host

pub mod camera;
pub mod environment;

pub use camera::PerspectiveCamera;
pub use environment::EnvironmentScene;
