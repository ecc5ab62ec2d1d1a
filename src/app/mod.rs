//! Host integration.
//!
//! - [`input`]: platform-agnostic input state
//! - [`bindings`]: keyboard shortcuts acting as the debug panel
//! - `winit` (feature `winit`): windowed host driving a [`Viewer`](crate::viewer::Viewer)

pub mod bindings;
pub mod input;

#[cfg(feature = "winit")]
pub mod winit;

pub use bindings::apply_debug_bindings;
pub use input::{ButtonState, Input, Key, MouseButton};
#[cfg(feature = "winit")]
pub use winit::App;
