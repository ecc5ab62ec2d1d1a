//! Error Types
//!
//! This module defines the error types used throughout the viewer.
//!
//! # Overview
//!
//! The main error type [`Error`] groups every failure mode:
//! - GPU initialization and window-system failures
//! - Asset loading errors ([`AssetError`])
//! - Pass chain configuration errors ([`ChainError`])
//! - Configuration parsing and I/O errors
//!
//! Most of these never reach the frame loop. Asset failures are absorbed by the
//! load tracker (they still count toward completion), an inconclusive capability
//! probe falls back to the standard surface, and degenerate viewports are clamped.
//! Only construction-time problems are surfaced as `Err`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen::errors::{Error, Result};
//!
//! fn build() -> Result<()> {
//!     let chain = PassChain::new(&mut backend, plan, viewport, passes)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the viewer.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create the presentation surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// Event loop error (winit).
    #[cfg(feature = "winit")]
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Domain Errors
    // ========================================================================
    /// Asset loading error.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Pass chain configuration error.
    #[error(transparent)]
    Chain(#[from] ChainError),

    // ========================================================================
    // Configuration & I/O
    // ========================================================================
    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or tracking assets.
///
/// None of these stop the loading session: a failed resource is still counted
/// toward completion by the tracker and reported through its event stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The resource could not be read.
    #[error("Failed to read {path}: {reason}")]
    Io {
        /// Path relative to the loader root
        path: String,
        /// Underlying I/O message
        reason: String,
    },

    /// The bytes could not be decoded.
    #[error("Failed to decode {label}: {reason}")]
    Decode {
        /// Resource label
        label: String,
        /// Decoder message
        reason: String,
    },

    /// Cube map faces disagree in size.
    #[error("Cube map error: {0}")]
    CubeMap(String),

    /// The loading session already started settling; the total is fixed.
    #[error("Loading session is sealed; cannot register '{0}'")]
    SessionSealed(String),

    /// A background task died before it could report.
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// Pass chain configuration and mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Two passes are marked terminal.
    #[error("Pass '{second}' is marked terminal but '{first}' already is")]
    DuplicateTerminalPass {
        /// The terminal pass already in the chain
        first: String,
        /// The rejected pass
        second: String,
    },

    /// A pass with the same name already exists.
    #[error("Duplicate pass name '{0}'")]
    DuplicatePassName(String),

    /// Insert position is invalid (element 0 is reserved for the scene pass).
    #[error("Insert position {position} out of range 1..={len}")]
    PositionOutOfRange {
        /// Requested position
        position: usize,
        /// Current chain length
        len: usize,
    },

    /// The chain has no scene pass to start from.
    #[error("Pass chain requires a scene pass at position 0")]
    MissingScenePass,

    /// The scene pass feeds every other pass and cannot be switched off.
    #[error("Scene pass '{0}' cannot be disabled")]
    SceneAlwaysEnabled(String),

    /// No pass with this name.
    #[error("Unknown pass '{0}'")]
    UnknownPass(String),

    /// The pass has no uniform with this name.
    #[error("Pass '{pass}' has no uniform '{uniform}'")]
    UnknownUniform {
        /// Pass name
        pass: String,
        /// Uniform name
        uniform: String,
    },

    /// The new value has a different type than the existing uniform.
    #[error("Uniform '{pass}.{uniform}' expects {expected}, got {actual}")]
    UniformTypeMismatch {
        /// Pass name
        pass: String,
        /// Uniform name
        uniform: String,
        /// Existing variant
        expected: &'static str,
        /// Rejected variant
        actual: &'static str,
    },
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
