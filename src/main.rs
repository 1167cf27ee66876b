use std::path::PathBuf;

use anyhow::Context;
use rainfall::{DemoConfig, SceneSource};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: a glTF scene replacing the built-in backdrop.
    let scene = match std::env::args_os().nth(1) {
        Some(path) => SceneSource::Gltf(PathBuf::from(path)),
        None => SceneSource::Procedural,
    };

    let config = DemoConfig::default().with_scene(scene);
    rainfall::app::run(config).context("rainfall demo failed")
}
