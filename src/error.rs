//! Error types for the demo.
//!
//! Load-time failures of optional subsystems (skybox, scene) are reported
//! through [`TextureError`] and [`SceneError`] and only disable that
//! subsystem. [`DemoError`] covers the failures that stop the demo.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan, Metal, DX12 or GL capable GPU is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable texture format.
    #[error("surface does not support any texture format on this adapter")]
    NoSurfaceFormat,
}

/// Errors that can occur while loading or building image data.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to open or decode an image file.
    #[error(transparent)]
    ImageLoad(#[from] image::ImageError),
    /// Raw pixel data does not match the declared dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// The skybox atlas is too small to hold a single face.
    #[error("skybox atlas {width}x{height} is too small for a cross layout")]
    AtlasTooSmall { width: u32, height: u32 },
}

/// Errors that can occur while importing a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The glTF importer rejected the file.
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    /// The document contains no scene to render.
    #[error("glTF document has no scenes")]
    NoScene,
    /// A primitive has no POSITION attribute.
    #[error("primitive {primitive} of mesh '{mesh}' has no positions")]
    MissingPositions { mesh: String, primitive: usize },
    /// An index points past the end of the vertex list.
    #[error("primitive {primitive} of mesh '{mesh}' references vertex {index} of {count}")]
    IndexOutOfRange {
        mesh: String,
        primitive: usize,
        index: u32,
        count: usize,
    },
    /// Every primitive was skipped.
    #[error("scene contains no drawable triangle meshes")]
    Empty,
}

/// Errors reported by configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The particle pool must hold at least one particle.
    #[error("particle count must be at least 1")]
    EmptyPool,
    /// A value that must be finite is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    /// A spawn range has its bounds the wrong way round.
    #[error("spawn range on {axis} is inverted: min {min} > max {max}")]
    InvertedRange { axis: &'static str, min: f32, max: f32 },
    /// A value that must be strictly positive is not.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    /// A spawn range is too wide to sample from.
    #[error("spawn range on {axis} is too wide: [{min}, {max}]")]
    RangeTooWide { axis: &'static str, min: f32, max: f32 },
    /// The spawn column height must not be negative.
    #[error("spawn height must not be negative, got {0}")]
    NegativeHeight(f32),
    /// Particles would spawn at or below the ground and never impact.
    #[error("spawn floor {z_spawn} must lie above the ground at {z_ground}")]
    SpawnBelowGround { z_spawn: f32, z_ground: f32 },
    /// The atlas needs one row per drop state and at least one column.
    #[error("atlas must have at least 4 rows and 1 column, got {rows}x{cols}")]
    AtlasTooSmall { rows: u32, cols: u32 },
}

/// Errors that stop the demo.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Failed to create event loop.
    #[error("failed to create event loop")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU initialization failed")]
    Gpu(#[from] GpuError),
    /// The configuration was rejected.
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_wrapped_errors_keep_the_cause_in_the_chain() {
        let err = DemoError::from(ConfigError::EmptyPool);
        assert_eq!(err.to_string(), "invalid configuration");

        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("particle count must be at least 1"));
    }

    #[test]
    fn test_gpu_errors_nest_under_demo_error() {
        let err = DemoError::from(GpuError::NoAdapter);
        assert_eq!(err.to_string(), "GPU initialization failed");
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.starts_with("no compatible GPU adapter"));
    }
}
