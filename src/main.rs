use std::path::PathBuf;

use skyisle::engine::EngineBuilder;
use skyisle::scene::Scene;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: a JSON scene file replacing the built-in
    // island layout. A bad file warns and falls back.
    let scene = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Scene::load_or_default(&path),
        None => Scene::default(),
    };

    EngineBuilder::default()
        .with_title("skyisle")
        .with_size(skyisle::DEFAULT_WIDTH, skyisle::DEFAULT_HEIGHT)
        .with_scene(scene)
        .run();
}
