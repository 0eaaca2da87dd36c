//! Ballistic demo - fire projectiles at a falling box and a backboard
//!
//! Space fires, Escape quits.
//!
//! Run: cargo run --manifest-path demos/ballistic/Cargo.toml
//! Logs: RUST_LOG=ballistic=debug cargo run --manifest-path demos/ballistic/Cargo.toml

use ballistic::{BallisticApp, LoopConfig, WindowSettings};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Space fires a projectile, Escape quits");

    let settings = WindowSettings::new().title("Ballistic").size(800, 600);
    ballistic::run(settings, LoopConfig::default(), BallisticApp::new())
}
