//! Dungeon simulation server
//!
//! Runs the combat simulation headless at a fixed tick rate with a scripted
//! player, until Ctrl-C or a tick limit.

use std::time::Instant;

use dungeon_server::runner::Runner;
use dungeon_server::world::{GameWorld, WorldContent};
use dungeon_shared::SIM_TICK_RATE;
use log::{error, info, warn};

/// Content file path
const CONTENT_ENV: &str = "DUNGEON_CONTENT";
/// Fixed RNG seed for reproducible runs
const SEED_ENV: &str = "DUNGEON_SEED";
/// Stop after this many ticks
const MAX_TICKS_ENV: &str = "DUNGEON_MAX_TICKS";

/// Load content from `DUNGEON_CONTENT`, or fall back to the built-in dungeon
fn load_content() -> WorldContent {
    let Ok(path) = std::env::var(CONTENT_ENV) else {
        info!("{} not set, using built-in content", CONTENT_ENV);
        return WorldContent::with_defaults();
    };

    match WorldContent::load_from_json(&path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to load content from {}: {}", path, e);
            error!("Using fallback built-in content");
            WorldContent::with_defaults()
        }
    }
}

fn env_number(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(number) => Some(number),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, value, e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting dungeon simulation...");
    info!("Tick rate: {} Hz", SIM_TICK_RATE);

    let content = load_content();
    let seed = env_number(SEED_ENV);
    let max_ticks = env_number(MAX_TICKS_ENV);
    match seed {
        Some(seed) => info!("Seed: {}", seed),
        None => info!("Seed: entropy"),
    }

    let world = match GameWorld::headless(content, seed) {
        Ok(world) => world,
        Err(e) => {
            error!("Invalid content: {}", e);
            error!("Using fallback built-in content");
            match GameWorld::headless(WorldContent::with_defaults(), seed) {
                Ok(world) => world,
                Err(e) => {
                    error!("Built-in content rejected: {}", e);
                    return;
                }
            }
        }
    };

    let mut runner = Runner::new(world, SIM_TICK_RATE);
    let tick_duration = runner.tick_duration();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Simulation started");

    // Main loop
    loop {
        let tick_start = Instant::now();

        runner.step();

        if max_ticks.is_some_and(|max| runner.stats().ticks >= max) {
            info!("Reached tick limit");
            break;
        }

        // Sleep until next tick
        let elapsed = tick_start.elapsed();
        let sleep = tokio::time::sleep(tick_duration.saturating_sub(elapsed));
        tokio::select! {
            _ = sleep => {}
            _ = &mut shutdown => {
                info!("Ctrl-C received, stopping");
                break;
            }
        }
    }

    let stats = runner.stats();
    let player = runner.world().player();
    info!(
        "Simulated {:.1}s: {} spawns, {} kills, {} loot claimed, {} expired, {} player deaths",
        runner.now().as_secs_f32(),
        stats.spawns,
        stats.kills,
        stats.loot_claimed,
        stats.loot_expired,
        stats.player_deaths
    );
    info!(
        "{} ends with {} gold, {}/{} health, {:?}",
        player.name,
        player.wallet.gold(),
        player.combat.health(),
        player.combat.max_health(),
        runner.world()
    );
}
