//! Lifecycle properties of the rain pool over many frames.

use rainfall::{DropState, ParticleSystem, RainConfig};

const DT: f32 = 1.0 / 60.0;

fn single_drop_at(height: f32) -> ParticleSystem {
    let config = RainConfig::default()
        .with_particle_count(1)
        .with_spawn_height(height, 0.0)
        .with_ground(1.0)
        .with_rain_speed(20.0);
    ParticleSystem::with_seed(config, 42).unwrap()
}

fn is_allowed(from: DropState, to: DropState) -> bool {
    use DropState::*;
    matches!(
        (from, to),
        (Falling0 | Falling1, Falling0 | Falling1 | Impact)
            | (Impact, Impact | Splash)
            | (Splash, Splash | Falling0)
    )
}

#[test]
fn test_impact_after_exact_step_count() {
    // (10.3 - 1) / 20 / (1/60) = 27.9 -> 28 steps.
    let mut rain = single_drop_at(10.3);

    for step in 1..=27 {
        rain.update(DT);
        assert!(rain.states()[0].is_falling(), "impacted early at step {step}");
    }

    rain.update(DT);
    assert_eq!(rain.states()[0], DropState::Impact);
    assert_eq!(rain.positions()[0].z, 1.0);
}

#[test]
fn test_impact_happens_once_per_fall() {
    let mut rain = single_drop_at(10.3);
    let mut impacts = 0;
    let mut respawned = false;
    let mut prev = rain.states()[0];

    for _ in 0..60 {
        rain.update(DT);
        let state = rain.states()[0];
        if state == DropState::Impact && prev != DropState::Impact {
            impacts += 1;
        }
        if prev == DropState::Splash && state == DropState::Falling0 {
            respawned = true;
            break;
        }
        prev = state;
    }

    assert_eq!(impacts, 1);
    assert!(respawned);
}

#[test]
fn test_splat_lasts_about_twelve_frames() {
    let mut rain = single_drop_at(5.0);

    while rain.states()[0].is_falling() {
        rain.update(DT);
    }

    let mut splat_frames = 0;
    while rain.states()[0].is_splat() {
        splat_frames += 1;
        rain.update(DT);
        assert!(splat_frames < 100, "splat never ended");
    }

    assert!((11..=13).contains(&splat_frames), "splat lasted {splat_frames} frames");
    assert_eq!(rain.states()[0], DropState::Falling0);
}

#[test]
fn test_transitions_are_cyclic() {
    let config = RainConfig::default().with_particle_count(2_000);
    let mut rain = ParticleSystem::with_seed(config, 3).unwrap();
    let mut prev = rain.states().to_vec();
    let mut seen_splash_respawn = false;

    for _ in 0..600 {
        rain.update(DT);
        for (i, (&from, &to)) in prev.iter().zip(rain.states()).enumerate() {
            assert!(is_allowed(from, to), "particle {i}: {from:?} -> {to:?}");
            seen_splash_respawn |= from == DropState::Splash && to == DropState::Falling0;
        }
        prev.copy_from_slice(rain.states());
    }

    assert!(seen_splash_respawn);
}

#[test]
fn test_respawn_stays_in_spawn_box() {
    let config = RainConfig::default()
        .with_particle_count(1_000)
        .with_spawn_area((-5.0, 5.0), (10.0, 12.0))
        .with_spawn_height(8.0, 4.0)
        .with_ground(0.0);
    let mut rain = ParticleSystem::with_seed(config.clone(), 11).unwrap();
    let mut prev = rain.states().to_vec();
    let mut respawns = 0;

    for _ in 0..300 {
        rain.update(DT);
        for (i, &state) in rain.states().iter().enumerate() {
            if prev[i] == DropState::Splash && state == DropState::Falling0 {
                respawns += 1;
                let p = rain.positions()[i];
                assert!((config.x_min..=config.x_max).contains(&p.x));
                assert!((config.y_min..=config.y_max).contains(&p.y));
                assert!((config.z_spawn..=config.z_spawn + config.z_height).contains(&p.z));
                assert_eq!(rain.velocities()[i].z, -config.rain_speed);
                assert_eq!(rain.state_timers()[i], 0.0);
                assert_eq!(rain.flight_timers()[i], 0.0);
            }
        }
        prev.copy_from_slice(rain.states());
    }

    assert!(respawns > 0);
}

#[test]
fn test_timers_never_negative() {
    let config = RainConfig::default().with_particle_count(1_000);
    let mut rain = ParticleSystem::with_seed(config, 5).unwrap();
    // Mix of frame lengths, including one longer than the flight interval.
    let steps = [DT, 0.001, 0.05, DT, 0.15, DT];

    for frame in 0..400 {
        rain.update(steps[frame % steps.len()]);
        assert!(rain.state_timers().iter().all(|&t| t >= 0.0));
        assert!(rain.flight_timers().iter().all(|&t| t >= 0.0));
    }
}

#[test]
fn test_nothing_falls_through_the_ground() {
    let config = RainConfig::default().with_particle_count(1_000);
    let mut rain = ParticleSystem::with_seed(config, 9).unwrap();
    let ground = rain.config().z_ground;

    for _ in 0..600 {
        rain.update(DT);
        for (p, s) in rain.positions().iter().zip(rain.states()) {
            if s.is_splat() {
                assert_eq!(p.z, ground);
            } else {
                assert!(p.z > ground);
            }
        }
    }
}

#[test]
fn test_variants_survive_respawn() {
    let config = RainConfig::default().with_particle_count(500);
    let mut rain = ParticleSystem::with_seed(config, 13).unwrap();
    let variants = rain.variants().to_vec();

    for _ in 0..600 {
        rain.update(DT);
    }

    assert_eq!(rain.variants(), &variants[..]);
    assert_eq!(rain.len(), 500);
}

#[test]
fn test_seeded_pools_are_reproducible() {
    let config = RainConfig::default().with_particle_count(200);
    let mut a = ParticleSystem::with_seed(config.clone(), 99).unwrap();
    let mut b = ParticleSystem::with_seed(config, 99).unwrap();

    for _ in 0..240 {
        a.update(DT);
        b.update(DT);
    }

    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.states(), b.states());
}
