//! Asset loading and load tracking.
//!
//! - [`tracker`]: aggregates independent loads into one progress ratio and a
//!   single completion event.
//! - [`loaders`]: background texture / cube texture / glTF loading feeding a
//!   tracker (native targets).
//! - [`image`]: CPU-side RGBA8 texture data.
//! - [`mesh`]: CPU-side triangle geometry.

pub mod image;
#[cfg(not(target_arch = "wasm32"))]
pub mod loaders;
pub mod mesh;
pub mod tracker;

pub use image::TextureData;
#[cfg(not(target_arch = "wasm32"))]
pub use loaders::{AssetLoader, AssetRequest, LoadedAsset};
pub use mesh::MeshData;
pub use tracker::{LoadEvent, LoadHandle, LoadProgress, LoadTracker, ResourceKind};
