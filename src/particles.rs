//! Raindrop particle pool and its lifecycle state machine.
//!
//! Every drop cycles through four states:
//!
//! ```text
//! Falling0 <-> Falling1 --(ground crossed)--> Impact --(half splat)--> Splash
//!     ^                                                                  |
//!     +----------------------------(timer expired, respawn)--------------+
//! ```
//!
//! The two falling states only select the animation frame. Impact and
//! Splash share one countdown of `splat_duration` seconds. When it runs out
//! the drop respawns in place at a random position inside the spawn box, so
//! the pool never grows or shrinks.
//!
//! Data is kept as a structure of arrays so the GPU stream can upload the
//! position and state arrays directly.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RainConfig;
use crate::error::ConfigError;

/// Lifecycle state of a single drop.
///
/// The discriminant doubles as the atlas row used by the renderer.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DropState {
    /// Falling, first animation frame.
    #[default]
    Falling0 = 0,
    /// Falling, second animation frame.
    Falling1 = 1,
    /// First half of the splat animation.
    Impact = 2,
    /// Second half of the splat animation.
    Splash = 3,
}

impl DropState {
    /// Whether the drop is still in the air.
    #[inline]
    pub fn is_falling(self) -> bool {
        matches!(self, DropState::Falling0 | DropState::Falling1)
    }

    /// Whether the drop is playing its ground animation.
    #[inline]
    pub fn is_splat(self) -> bool {
        matches!(self, DropState::Impact | DropState::Splash)
    }

    /// GPU encoding: the atlas row for this state.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Swap the falling animation frame. Other states are unchanged.
    #[inline]
    fn toggled(self) -> Self {
        match self {
            DropState::Falling0 => DropState::Falling1,
            DropState::Falling1 => DropState::Falling0,
            other => other,
        }
    }
}

/// Snapshot of one particle, assembled from the pool arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub variant: u32,
    pub state: DropState,
    pub state_timer: f32,
    pub flight_timer: f32,
}

/// Number of particles per lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub falling: usize,
    pub impact: usize,
    pub splash: usize,
}

/// Fixed-size pool of raindrops.
pub struct ParticleSystem {
    config: RainConfig,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    variants: Vec<u32>,
    states: Vec<DropState>,
    state_timers: Vec<f32>,
    flight_timers: Vec<f32>,
    rng: StdRng,
}

impl ParticleSystem {
    /// Create a pool seeded from system entropy.
    pub fn new(config: RainConfig) -> Result<Self, ConfigError> {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Create a pool with a fixed seed, for reproducible runs.
    pub fn with_seed(config: RainConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: RainConfig, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let count = config.particle_count as usize;
        let positions = (0..count)
            .map(|_| spawn_position(&config, &mut rng))
            .collect();
        let variants = (0..count)
            .map(|_| rng.gen_range(0..config.atlas_cols))
            .collect();

        log::debug!(
            "spawned {} drops in [{}, {}] x [{}, {}] x [{}, {}]",
            count,
            config.x_min,
            config.x_max,
            config.y_min,
            config.y_max,
            config.z_spawn,
            config.z_spawn + config.z_height,
        );

        Ok(Self {
            velocities: vec![config.fall_velocity(); count],
            states: vec![DropState::Falling0; count],
            state_timers: vec![0.0; count],
            flight_timers: vec![0.0; count],
            positions,
            variants,
            config,
            rng,
        })
    }

    /// Advance every particle by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let interval = self.config.flight_frame_interval;
        let ground = self.config.z_ground;
        let splat = self.config.splat_duration;
        let half_splat = self.config.splash_threshold();

        for i in 0..self.positions.len() {
            let mut state = self.states[i];

            if state.is_falling() {
                // Phase accumulator: keep the remainder so frames don't drift.
                self.flight_timers[i] += dt;
                if self.flight_timers[i] >= interval {
                    self.flight_timers[i] -= interval;
                    state = state.toggled();
                }

                let prev_z = self.positions[i].z;
                let z = prev_z + self.velocities[i].z * dt;
                self.positions[i].z = z;

                if prev_z > ground && z <= ground {
                    state = DropState::Impact;
                    self.positions[i].z = ground;
                    self.state_timers[i] = splat;
                    self.flight_timers[i] = 0.0;
                }
            }

            if state.is_splat() {
                self.state_timers[i] -= dt;

                if state == DropState::Impact && self.state_timers[i] <= half_splat {
                    state = DropState::Splash;
                }
                if self.state_timers[i] <= 0.0 {
                    self.respawn(i);
                    continue;
                }
            }

            self.states[i] = state;
        }
    }

    fn respawn(&mut self, index: usize) {
        self.positions[index] = spawn_position(&self.config, &mut self.rng);
        self.velocities[index] = self.config.fall_velocity();
        self.states[index] = DropState::Falling0;
        self.state_timers[index] = 0.0;
        self.flight_timers[index] = 0.0;
    }

    /// Number of particles in the pool.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the pool is empty. Never true for a validated config.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &RainConfig {
        &self.config
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Atlas column per particle.
    pub fn variants(&self) -> &[u32] {
        &self.variants
    }

    pub fn states(&self) -> &[DropState] {
        &self.states
    }

    pub fn state_timers(&self) -> &[f32] {
        &self.state_timers
    }

    pub fn flight_timers(&self) -> &[f32] {
        &self.flight_timers
    }

    /// Snapshot of the particle at `index`.
    pub fn particle(&self, index: usize) -> Option<Particle> {
        if index >= self.len() {
            return None;
        }
        Some(Particle {
            position: self.positions[index],
            velocity: self.velocities[index],
            variant: self.variants[index],
            state: self.states[index],
            state_timer: self.state_timers[index],
            flight_timer: self.flight_timers[index],
        })
    }

    /// Count particles per lifecycle phase.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for state in &self.states {
            match state {
                DropState::Falling0 | DropState::Falling1 => counts.falling += 1,
                DropState::Impact => counts.impact += 1,
                DropState::Splash => counts.splash += 1,
            }
        }
        counts
    }
}

fn spawn_position(config: &RainConfig, rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(config.x_min..=config.x_max),
        rng.gen_range(config.y_min..=config.y_max),
        rng.gen_range(config.z_spawn..=config.z_spawn + config.z_height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_drop(height: f32) -> ParticleSystem {
        let config = RainConfig::default()
            .with_particle_count(1)
            .with_spawn_height(height, 0.0);
        ParticleSystem::with_seed(config, 7).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let system = ParticleSystem::with_seed(RainConfig::default(), 1).unwrap();
        assert_eq!(system.len(), 10_000);
        assert!(system.states().iter().all(|s| *s == DropState::Falling0));
        assert!(system.velocities().iter().all(|v| *v == Vec3::new(0.0, 0.0, -20.0)));
        assert!(system.variants().iter().all(|v| *v < 4));
        assert!(system.state_timers().iter().all(|t| *t == 0.0));
    }

    #[test]
    fn test_state_codes_match_atlas_rows() {
        assert_eq!(DropState::Falling0.code(), 0);
        assert_eq!(DropState::Falling1.code(), 1);
        assert_eq!(DropState::Impact.code(), 2);
        assert_eq!(DropState::Splash.code(), 3);
    }

    #[test]
    fn test_flight_frame_toggles_with_remainder() {
        let mut system = single_drop(50.0);

        system.update(0.06);
        assert_eq!(system.states()[0], DropState::Falling0);

        system.update(0.06);
        assert_eq!(system.states()[0], DropState::Falling1);
        assert!((system.flight_timers()[0] - 0.02).abs() < 1e-5);

        system.update(0.09);
        assert_eq!(system.states()[0], DropState::Falling0);
        assert!((system.flight_timers()[0] - 0.01).abs() < 1e-5);
    }

    #[test]
    fn test_impact_clamps_to_ground() {
        let mut system = single_drop(1.5);
        // 20 units/s * 0.05 s = 1.0 unit, overshoots the ground at 1.0.
        system.update(0.05);

        let p = system.particle(0).unwrap();
        assert_eq!(p.state, DropState::Impact);
        assert_eq!(p.position.z, 1.0);
        assert_eq!(p.flight_timer, 0.0);
        assert!((p.state_timer - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_impact_then_splash_then_respawn() {
        let mut system = single_drop(1.1);
        system.update(0.01);
        assert_eq!(system.states()[0], DropState::Impact);

        // 0.2 - 0.01 - 0.05 = 0.14 > 0.1
        system.update(0.05);
        assert_eq!(system.states()[0], DropState::Impact);

        // 0.14 - 0.05 = 0.09 <= 0.1
        system.update(0.05);
        assert_eq!(system.states()[0], DropState::Splash);

        system.update(0.05);
        assert_eq!(system.states()[0], DropState::Splash);

        system.update(0.05);
        let p = system.particle(0).unwrap();
        assert_eq!(p.state, DropState::Falling0);
        assert_eq!(p.position.z, 1.1);
        assert_eq!(p.state_timer, 0.0);
        assert_eq!(p.flight_timer, 0.0);
    }

    #[test]
    fn test_horizontal_position_is_static_while_falling() {
        let mut system = single_drop(30.0);
        let start = system.positions()[0];
        for _ in 0..10 {
            system.update(1.0 / 60.0);
        }
        let end = system.positions()[0];
        assert_eq!(start.x, end.x);
        assert_eq!(start.y, end.y);
        assert!(end.z < start.z);
    }

    #[test]
    fn test_zero_dt_changes_nothing() {
        let mut system = ParticleSystem::with_seed(RainConfig::default(), 3).unwrap();
        let before = system.positions().to_vec();
        system.update(0.0);
        assert_eq!(before, system.positions());
        assert!(system.states().iter().all(|s| *s == DropState::Falling0));
    }

    #[test]
    fn test_state_counts_sum_to_len() {
        let mut system = ParticleSystem::with_seed(RainConfig::default(), 11).unwrap();
        for _ in 0..200 {
            system.update(1.0 / 60.0);
        }
        let counts = system.state_counts();
        assert_eq!(counts.falling + counts.impact + counts.splash, system.len());
    }

    #[test]
    fn test_particle_out_of_range() {
        let system = single_drop(5.0);
        assert!(system.particle(1).is_none());
    }

    #[test]
    fn test_landing_exactly_on_ground_impacts_once() {
        let mut system = single_drop(2.0);
        // 20 units/s * 0.05 s = 1.0 unit, lands exactly on the ground at 1.0.
        system.update(0.05);

        let p = system.particle(0).unwrap();
        assert_eq!(p.state, DropState::Impact);
        assert_eq!(p.position.z, 1.0);
        assert!((p.state_timer - 0.15).abs() < 1e-6);

        // Resting on the ground is not another crossing: the timer keeps
        // running down instead of being reset to the full splat.
        system.update(0.01);
        let p = system.particle(0).unwrap();
        assert_eq!(p.state, DropState::Impact);
        assert_eq!(p.position.z, 1.0);
        assert!((p.state_timer - 0.14).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RainConfig::default().with_particle_count(0);
        assert!(ParticleSystem::new(config).is_err());
    }

    #[test]
    fn test_overflowing_spawn_area_is_rejected() {
        let config = RainConfig::default().with_spawn_area((-3.0e38, 3.0e38), (-1.0, 1.0));
        assert!(matches!(
            ParticleSystem::with_seed(config, 1),
            Err(ConfigError::RangeTooWide { axis: "x", .. })
        ));
    }
}
