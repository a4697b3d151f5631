use std::time::Duration;

use delveforge::prelude::*;
use delveforge::world::memory::MemoryWorld;

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

const TEMPLE: Position = Position::new(32, 32, 7);

const NOVICE: PlayerId = PlayerId(1);
const VETERAN: PlayerId = PlayerId(2);
const HEALER: PlayerId = PlayerId(3);
const SCOUT: PlayerId = PlayerId(4);

fn crypt_blueprint() -> InstanceConfig {
    InstanceConfig {
        name: "Crypt".into(),
        duration_secs: 1800,
        min_level: 20,
        entry: Position::new(100, 100, 7),
        exit: Position::new(50, 50, 7),
        bosses: ["Lich King".to_string()].into(),
        ..Default::default()
    }
}

fn populate(world: &mut MemoryWorld) {
    world.add_player(NOVICE, 10, TEMPLE);
    world.add_player(VETERAN, 35, TEMPLE);
    world.add_player(HEALER, 28, TEMPLE);
    world.add_player(SCOUT, 22, TEMPLE);
    world.form_party(HEALER, &[SCOUT]);
}

/// Loads `delveforge.toml` from the first argument if given, otherwise
/// runs with defaults and a built-in Crypt blueprint.
fn load_config() -> Result<ServiceConfig, ConfigError> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if config.blueprint("Crypt").is_none() {
        config.blueprints.push(crypt_blueprint());
    }
    // Short cadence so the expiry step below finishes quickly.
    config.sweep_interval_ms = config.sweep_interval_ms.min(200);
    Ok(config)
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), DelveforgeError> {
    let config = load_config()?;
    delveforge::logging::init_tracing(&config.log_filter);

    let blueprint = config
        .blueprint("Crypt")
        .cloned()
        .unwrap_or_else(crypt_blueprint);

    let mut world = MemoryWorld::new();
    populate(&mut world);
    let clock = ManualClock::starting_now();
    let handle = InstanceService::spawn(&config, world, clock.clone());

    let id = handle.create(blueprint.clone()).await?;
    tracing::info!(instance_id = %id, "created {}", blueprint.name);

    if let Err(e) = handle.bind_player(NOVICE, id).await {
        tracing::info!(player_id = %NOVICE, reason = %e, "novice turned away");
    }

    handle.teleport_into(id, VETERAN).await?;

    let party = handle.create(blueprint.clone()).await?;
    handle.bind_party(HEALER, party).await?;
    for member in [HEALER, SCOUT] {
        handle.teleport_into(party, member).await?;
    }

    let summaries = handle.list().await?;
    match serde_json::to_string_pretty(&summaries) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "could not render summaries"),
    }

    let report = handle.close(id, "the Lich King has fallen").await?;
    tracing::info!(
        instance_id = %report.id,
        to_exit = ?report.to_exit,
        to_home = ?report.to_home,
        "first crypt closed"
    );

    // Let the party's crypt run out of time and wait for the sweep.
    clock.advance(Duration::from_secs(blueprint.duration_secs));
    tokio::time::sleep(Duration::from_millis(config.sweep_interval_ms * 2 + 50)).await;

    let notices = handle
        .submit(|_, world| {
            [VETERAN, HEALER, SCOUT]
                .map(|p| (p, world.notices(p).to_vec(), world.position_of(p)))
        })
        .await?;
    for (player, notices, position) in notices {
        println!("{player} at {position:?}: {notices:?}");
    }

    let leftovers = handle.shutdown().await?;
    tracing::info!(closed = leftovers.len(), "service stopped");
    Ok(())
}
