//! Demo configuration.
//!
//! [`RainConfig`] holds the simulation constants and is handed to
//! [`ParticleSystem`](crate::particles::ParticleSystem) by value.
//! [`DemoConfig`] wraps it together with the window, asset, camera and
//! lighting settings used by the application.
//!
//! Both types follow the builder pattern:
//!
//! ```ignore
//! let rain = RainConfig::default()
//!     .with_particle_count(20_000)
//!     .with_rain_speed(25.0);
//!
//! let demo = DemoConfig::default()
//!     .with_rain(rain)
//!     .with_scene(SceneSource::Gltf("assets/village.gltf".into()));
//! ```

use std::path::PathBuf;

use glam::Vec3;

use crate::error::ConfigError;

/// Simulation constants for the rain particle pool.
///
/// Z is the vertical axis. Particles spawn uniformly inside
/// `[x_min, x_max] × [y_min, y_max] × [z_spawn, z_spawn + z_height]`
/// and fall straight down onto the plane `z = z_ground`.
#[derive(Debug, Clone, PartialEq)]
pub struct RainConfig {
    /// Number of particles in the pool.
    pub particle_count: u32,
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    /// Lowest spawn height.
    pub z_spawn: f32,
    /// Height of the spawn column above `z_spawn`.
    pub z_height: f32,
    /// Height of the ground plane.
    pub z_ground: f32,
    /// Fall speed in units per second.
    pub rain_speed: f32,
    /// Total time spent in Impact + Splash, in seconds.
    pub splat_duration: f32,
    /// Seconds between the two falling animation frames.
    pub flight_frame_interval: f32,
    /// Atlas rows. Row `n` holds the sprites for drop state `n`.
    pub atlas_rows: u32,
    /// Atlas columns. One column per visual variant.
    pub atlas_cols: u32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            x_min: -20.0,
            x_max: 20.0,
            y_min: -20.0,
            y_max: 20.0,
            z_spawn: 20.0,
            z_height: 40.0,
            z_ground: 1.0,
            rain_speed: 20.0,
            splat_duration: 0.2,
            flight_frame_interval: 0.1,
            atlas_rows: 4,
            atlas_cols: 4,
        }
    }
}

impl RainConfig {
    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the horizontal spawn rectangle.
    pub fn with_spawn_area(mut self, x: (f32, f32), y: (f32, f32)) -> Self {
        (self.x_min, self.x_max) = x;
        (self.y_min, self.y_max) = y;
        self
    }

    /// Set the spawn column: floor height and column height.
    pub fn with_spawn_height(mut self, z_spawn: f32, z_height: f32) -> Self {
        self.z_spawn = z_spawn;
        self.z_height = z_height;
        self
    }

    /// Set the ground plane height.
    pub fn with_ground(mut self, z_ground: f32) -> Self {
        self.z_ground = z_ground;
        self
    }

    /// Set the fall speed in units per second.
    pub fn with_rain_speed(mut self, speed: f32) -> Self {
        self.rain_speed = speed;
        self
    }

    /// Set the total splat duration in seconds.
    pub fn with_splat_duration(mut self, seconds: f32) -> Self {
        self.splat_duration = seconds;
        self
    }

    /// Set the falling animation frame interval in seconds.
    pub fn with_flight_frame_interval(mut self, seconds: f32) -> Self {
        self.flight_frame_interval = seconds;
        self
    }

    /// Set the atlas grid dimensions.
    pub fn with_atlas(mut self, rows: u32, cols: u32) -> Self {
        self.atlas_rows = rows;
        self.atlas_cols = cols;
        self
    }

    /// Timer value at which Impact turns into Splash.
    #[inline]
    pub fn splash_threshold(&self) -> f32 {
        self.splat_duration * 0.5
    }

    /// Constant fall velocity.
    #[inline]
    pub fn fall_velocity(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, -self.rain_speed)
    }

    /// Check the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::EmptyPool);
        }

        let values = [
            ("x_min", self.x_min),
            ("x_max", self.x_max),
            ("y_min", self.y_min),
            ("y_max", self.y_max),
            ("z_spawn", self.z_spawn),
            ("z_height", self.z_height),
            ("z_ground", self.z_ground),
            ("rain_speed", self.rain_speed),
            ("splat_duration", self.splat_duration),
            ("flight_frame_interval", self.flight_frame_interval),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        if self.x_min > self.x_max {
            return Err(ConfigError::InvertedRange {
                axis: "x",
                min: self.x_min,
                max: self.x_max,
            });
        }
        if self.y_min > self.y_max {
            return Err(ConfigError::InvertedRange {
                axis: "y",
                min: self.y_min,
                max: self.y_max,
            });
        }
        if self.z_height < 0.0 {
            return Err(ConfigError::NegativeHeight(self.z_height));
        }
        for (axis, min, max) in [
            ("x", self.x_min, self.x_max),
            ("y", self.y_min, self.y_max),
            ("z", self.z_spawn, self.z_spawn + self.z_height),
        ] {
            if !(max - min).is_finite() {
                return Err(ConfigError::RangeTooWide { axis, min, max });
            }
        }
        if self.z_spawn <= self.z_ground {
            return Err(ConfigError::SpawnBelowGround {
                z_spawn: self.z_spawn,
                z_ground: self.z_ground,
            });
        }

        for (name, value) in [
            ("rain_speed", self.rain_speed),
            ("splat_duration", self.splat_duration),
            ("flight_frame_interval", self.flight_frame_interval),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if self.atlas_rows < 4 || self.atlas_cols < 1 {
            return Err(ConfigError::AtlasTooSmall {
                rows: self.atlas_rows,
                cols: self.atlas_cols,
            });
        }

        Ok(())
    }
}

/// Where the scene geometry comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SceneSource {
    /// Built-in ground, house and tree.
    #[default]
    Procedural,
    /// A glTF file on disk.
    Gltf(PathBuf),
    /// No scene geometry.
    Disabled,
}

/// Initial camera placement and projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub world_up: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -60.0, 20.0),
            world_up: Vec3::Z,
            yaw: 90.0,
            pitch: 0.0,
            speed: 30.0,
            sensitivity: 0.2,
            fov_y: 45.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

/// Phong lighting parameters for the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub light_pos: Vec3,
    pub light_color: Vec3,
    pub ambient_color: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_pos: Vec3::new(5.0, 5.0, 10.0),
            light_color: Vec3::ONE,
            ambient_color: Vec3::new(0.3, 0.3, 0.4),
        }
    }
}

/// Everything the application needs to start.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub rain: RainConfig,
    /// Rain sprite atlas. Falls back to a generated atlas when missing.
    pub atlas_path: PathBuf,
    /// Horizontal-cross skybox image. `None` disables the skybox.
    pub skybox_path: Option<PathBuf>,
    pub skybox_exposure: f32,
    pub scene: SceneSource,
    pub lighting: Lighting,
    pub camera: CameraConfig,
    /// On-screen sprite size in pixels.
    pub point_size: f32,
    pub clear_color: [f64; 3],
    /// Simulation step used every frame instead of wall-clock time.
    pub fixed_delta: Option<f32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Rainfall".to_string(),
            width: 800,
            height: 600,
            rain: RainConfig::default(),
            atlas_path: PathBuf::from("assets/rain_atlas.png"),
            skybox_path: Some(PathBuf::from("assets/skybox.png")),
            skybox_exposure: 1.0,
            scene: SceneSource::default(),
            lighting: Lighting::default(),
            camera: CameraConfig::default(),
            point_size: 16.0,
            clear_color: [0.1, 0.1, 0.1],
            fixed_delta: None,
        }
    }
}

impl DemoConfig {
    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the initial window size in logical pixels.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replace the simulation constants.
    pub fn with_rain(mut self, rain: RainConfig) -> Self {
        self.rain = rain;
        self
    }

    /// Set the rain atlas image path.
    pub fn with_atlas(mut self, path: impl Into<PathBuf>) -> Self {
        self.atlas_path = path.into();
        self
    }

    /// Set the skybox image path, or `None` to disable the skybox.
    pub fn with_skybox(mut self, path: Option<PathBuf>) -> Self {
        self.skybox_path = path;
        self
    }

    /// Set the skybox exposure multiplier.
    pub fn with_skybox_exposure(mut self, exposure: f32) -> Self {
        self.skybox_exposure = exposure;
        self
    }

    /// Choose where scene geometry comes from.
    pub fn with_scene(mut self, scene: SceneSource) -> Self {
        self.scene = scene;
        self
    }

    /// Set the scene lighting.
    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    /// Set the initial camera.
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Set the rain sprite size in pixels.
    pub fn with_point_size(mut self, pixels: f32) -> Self {
        self.point_size = pixels;
        self
    }

    /// Step the simulation by a fixed amount each frame, for recordings and
    /// reproducible runs. `None` uses the frame time.
    pub fn with_fixed_delta(mut self, seconds: Option<f32>) -> Self {
        self.fixed_delta = seconds;
        self
    }

    /// Validate the parts of the configuration that can be wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rain.validate()?;
        if !(self.point_size > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "point_size",
                value: self.point_size,
            });
        }
        if let Some(value) = self.fixed_delta {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name: "fixed_delta", value });
            }
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name: "fixed_delta", value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(RainConfig::default().validate(), Ok(()));
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_splash_threshold_is_half_duration() {
        let config = RainConfig::default().with_splat_duration(0.4);
        assert!((config.splash_threshold() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_empty_pool() {
        let config = RainConfig::default().with_particle_count(0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyPool));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let config = RainConfig::default().with_spawn_area((5.0, -5.0), (-1.0, 1.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { axis: "x", .. })
        ));
    }

    #[test]
    fn test_rejects_spawn_below_ground() {
        let config = RainConfig::default().with_ground(25.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnBelowGround { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_timers() {
        let config = RainConfig::default().with_splat_duration(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "splat_duration", .. })
        ));

        let config = RainConfig::default().with_rain_speed(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "rain_speed", .. })
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let config = RainConfig::default().with_ground(f32::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { name: "z_ground", .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_ranges() {
        let config = RainConfig::default().with_spawn_area((-3.0e38, 3.0e38), (-1.0, 1.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RangeTooWide { axis: "x", .. })
        ));

        let config = RainConfig::default().with_spawn_area((-1.0, 1.0), (-3.0e38, 3.0e38));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RangeTooWide { axis: "y", .. })
        ));

        let config = RainConfig::default().with_spawn_height(3.0e38, 3.0e38);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RangeTooWide { axis: "z", .. })
        ));
    }

    #[test]
    fn test_fixed_delta_must_be_a_positive_step() {
        let demo = DemoConfig::default().with_fixed_delta(Some(1.0 / 30.0));
        assert!(demo.validate().is_ok());
        assert!(DemoConfig::default().with_fixed_delta(None).validate().is_ok());

        assert_eq!(
            DemoConfig::default().with_fixed_delta(Some(0.0)).validate(),
            Err(ConfigError::NonPositive { name: "fixed_delta", value: 0.0 })
        );
        assert!(matches!(
            DemoConfig::default().with_fixed_delta(Some(f32::INFINITY)).validate(),
            Err(ConfigError::NotFinite { name: "fixed_delta", .. })
        ));
    }

    #[test]
    fn test_rejects_small_atlas() {
        let config = RainConfig::default().with_atlas(2, 4);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AtlasTooSmall { rows: 2, cols: 4 })
        );
    }

    #[test]
    fn test_zero_height_column_is_allowed() {
        let config = RainConfig::default().with_spawn_height(10.0, 0.0);
        assert_eq!(config.validate(), Ok(()));
    }
}
