//! # Rainfall
//!
//! Real-time rain over a small 3D scene: point-sprite raindrops, lit scene
//! geometry (built in or imported from glTF), a cubemap skybox and a
//! free-fly camera.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rainfall::prelude::*;
//!
//! fn main() -> Result<(), DemoError> {
//!     let config = DemoConfig::default()
//!         .with_rain(RainConfig::default().with_particle_count(20_000))
//!         .with_scene(SceneSource::Gltf("assets/town.gltf".into()));
//!     rainfall::app::run(config)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Drops
//!
//! [`ParticleSystem`] holds a fixed pool of drops. Each frame
//! [`ParticleSystem::update`] moves falling drops down, detects the frame a
//! drop crosses the ground, plays the two-phase splat and respawns the drop
//! at the top of the spawn box:
//!
//! ```text
//! Falling0 <-> Falling1 -> Impact -> Splash -> Falling0
//! ```
//!
//! The state doubles as the atlas row the renderer samples, the per-drop
//! variant as the column.
//!
//! ### Rendering
//!
//! [`gpu::GpuState`] draws the skybox, then the scene, then the rain. Drop
//! positions and states are streamed into alternating GPU buffers every
//! frame; variants are uploaded once.
//!
//! ### Controls
//!
//! | Input | Action |
//! |-------|--------|
//! | Left click | Capture the mouse for looking around |
//! | Mouse | Look (while captured) |
//! | W/A/S/D | Move |
//! | Space / Shift | Up / down |
//! | P | Pause the rain |
//! | Escape | Release the mouse, or quit when already released |
//!
//! ## Testing without a window
//!
//! The simulation, camera, geometry, glTF import and image processing have
//! no GPU dependency:
//!
//! ```
//! use rainfall::prelude::*;
//!
//! let mut rain = ParticleSystem::with_seed(RainConfig::default(), 7).unwrap();
//! for _ in 0..600 {
//!     rain.update(1.0 / 60.0);
//! }
//! assert_eq!(rain.len(), 10_000);
//! ```

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod particles;
pub mod scene;
pub mod shaders;
pub mod textures;
pub mod time;

pub use glam::{Mat4, Vec2, Vec3};

pub use camera::{FlyCamera, Movement};
pub use config::{CameraConfig, DemoConfig, Lighting, RainConfig, SceneSource};
pub use error::{ConfigError, DemoError, GpuError, SceneError, TextureError};
pub use particles::{DropState, Particle, ParticleSystem, StateCounts};
pub use scene::Scene;

/// Convenient re-exports for the common types.
pub mod prelude {
    pub use crate::camera::{FlyCamera, Movement};
    pub use crate::config::{CameraConfig, DemoConfig, Lighting, RainConfig, SceneSource};
    pub use crate::error::{ConfigError, DemoError};
    pub use crate::input::Input;
    pub use crate::particles::{DropState, Particle, ParticleSystem, StateCounts};
    pub use crate::scene::Scene;
    pub use crate::textures::{CubemapFaces, TextureData};
    pub use crate::time::Time;
    pub use glam::{Mat4, Vec2, Vec3};
}
