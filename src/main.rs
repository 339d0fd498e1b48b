//! Batoman Simulation Harness
//!
//! Headless demo: assembles a small level, runs a scripted input recording
//! through the reference physics provider, and verifies determinism by
//! replaying the same recording and comparing state snapshots.

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use batoman_core::{
    TICK_RATE, VERSION,
    game::{
        arcade::ArcadePhysics,
        events::GameEventData,
        input::{InputFrame, InputRecording},
        level::{
            assemble, LevelConfig, PropertyBag, PropertyValue, TileLayer, Tilemap, Tileset,
            LAYER_HAZARDS, LAYER_PLATFORMS, LAYER_SPAWNS,
        },
        state::LevelState,
        tick::{tick, TickConfig},
    },
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Batoman Gameplay Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let script = demo_script();
    info!(
        "Demo script: {} ticks, {} input deltas",
        script.end_tick + 1,
        script.delta_count()
    );

    info!("=== Demo Run ===");
    let first = run_level(&script)?;

    info!("=== Verifying Determinism ===");
    let second = run_level(&script)?;

    let snapshot_a = first.encode_snapshot()?;
    let snapshot_b = second.encode_snapshot()?;
    if snapshot_a == snapshot_b {
        info!(
            "DETERMINISM VERIFIED: identical snapshots ({} bytes)",
            snapshot_a.len()
        );
    } else {
        anyhow::bail!("determinism failure: replay produced a different snapshot");
    }

    Ok(())
}

/// Run the scripted recording from a fresh level and report what happened.
fn run_level(script: &InputRecording) -> anyhow::Result<LevelState> {
    let config = demo_config();
    let level = assemble(&config, &demo_map()).context("level assembly failed")?;
    let mut state = LevelState::new(config, level);
    let mut physics = ArcadePhysics::new();
    let tick_config = TickConfig::default();

    let mut total_events = 0;
    for (_, frame) in script.replay_iter() {
        let result = tick(&mut state, frame, &mut physics, &tick_config);
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                GameEventData::CheckpointActivated { position } => {
                    let (x, y) = position.to_floats();
                    info!("Tick {}: checkpoint activated at ({:.0}, {:.0})", event.tick, x, y);
                }
                GameEventData::EnemyDied { enemy_id, score_value, .. } => {
                    info!(
                        "Tick {}: enemy {} destroyed (+{} points)",
                        event.tick, enemy_id.0, score_value
                    );
                }
                GameEventData::PlayerDied { lives_remaining } => {
                    info!(
                        "Tick {}: player died ({} lives left)",
                        event.tick, lives_remaining
                    );
                }
                GameEventData::PlayerRespawned { position } => {
                    let (x, y) = position.to_floats();
                    info!("Tick {}: respawned at ({:.0}, {:.0})", event.tick, x, y);
                }
                GameEventData::RunEnded { score, duration_ticks } => {
                    info!(
                        "Tick {}: run ended - score {} over {} ticks",
                        event.tick, score, duration_ticks
                    );
                }
                _ => {}
            }
        }

        if result.run_ended {
            break;
        }
    }

    let (px, py) = state.player.body.position.to_floats();
    info!(
        "Run finished at tick {}: score {}, {} lives, {} enemies left, player at ({:.0}, {:.0}), {} events",
        state.tick,
        state.player.score,
        state.player.lives,
        state.enemies.len(),
        px,
        py,
        total_events
    );

    Ok(state)
}

fn demo_config() -> LevelConfig {
    LevelConfig {
        index: 0,
        name: "Demo Gauntlet".to_string(),
        tilemap_key: "demo-gauntlet".to_string(),
        tileset_key: "world-tiles".to_string(),
        start_x: 100,
        start_y: 650,
        ..LevelConfig::default()
    }
}

/// A 40x24 map of 32 px tiles (1280x768 world), built in code so the demo
/// has no asset files: a two-row floor with a pit, a one-tile step to jump
/// over, a spike strip, one patrol enemy, a checkpoint before the pit, and
/// a death zone at the pit bottom.
fn demo_map() -> Tilemap {
    const W: usize = 40;
    const H: usize = 24;

    let mut tile_properties = std::collections::BTreeMap::new();
    let mut solid = PropertyBag::new();
    solid.insert("collides".to_string(), PropertyValue::Bool(true));
    tile_properties.insert(0, solid);
    let mut spike = PropertyBag::new();
    spike.insert("damage".to_string(), PropertyValue::Bool(true));
    tile_properties.insert(1, spike);

    let mut platforms = vec![0u32; W * H];
    for row in 22..24 {
        for col in 0..W {
            // Pit at cols 30..33
            if !(30..33).contains(&col) {
                platforms[row * W + col] = 1;
            }
        }
    }
    // One-tile step at col 14
    platforms[21 * W + 14] = 1;

    let mut hazards = vec![0u32; W * H];
    for col in 24..26 {
        hazards[21 * W + col] = 2;
    }

    let enemy = {
        let mut props = PropertyBag::new();
        props.insert(
            "behavior".to_string(),
            PropertyValue::Text("patrol".to_string()),
        );
        props.insert("patrolDistance".to_string(), PropertyValue::Int(60));
        batoman_core::game::level::MapObject {
            name: "walker".to_string(),
            kind: "enemy".to_string(),
            x: 600.0,
            y: 672.0,
            width: 0.0,
            height: 0.0,
            properties: props,
        }
    };
    let checkpoint = batoman_core::game::level::MapObject {
        name: "mid".to_string(),
        kind: "checkpoint".to_string(),
        x: 880.0,
        y: 576.0,
        width: 32.0,
        height: 128.0,
        properties: PropertyBag::new(),
    };
    let pit_floor = batoman_core::game::level::MapObject {
        name: "pit".to_string(),
        kind: "death-zone".to_string(),
        x: 960.0,
        y: 744.0,
        width: 96.0,
        height: 24.0,
        properties: PropertyBag::new(),
    };

    Tilemap {
        width: W as u32,
        height: H as u32,
        tile_width: 32,
        tile_height: 32,
        tilesets: vec![Tileset {
            name: "world-tiles".to_string(),
            first_gid: 1,
            tile_properties,
        }],
        layers: vec![
            TileLayer {
                name: LAYER_PLATFORMS.to_string(),
                data: platforms,
            },
            TileLayer {
                name: LAYER_HAZARDS.to_string(),
                data: hazards,
            },
        ],
        object_layers: vec![batoman_core::game::level::ObjectLayer {
            name: LAYER_SPAWNS.to_string(),
            objects: vec![enemy, checkpoint, pit_floor],
        }],
    }
}

/// Scripted playthrough: run right, hop the step, tap-fire at the enemy,
/// charge a heavy shot, then keep going until the pit does its work.
fn demo_script() -> InputRecording {
    let mut recording = InputRecording::new();
    let mut frame = InputFrame::new();
    frame.set_right(true);

    for t in 0..900u32 {
        // Hop over the step around x = 448
        frame.set_jump((80..92).contains(&t));
        // Two quick shots, then a held charge released as a heavy shot
        frame.set_fire((110..113).contains(&t) || (140..143).contains(&t) || (170..240).contains(&t));
        recording.record(t, frame);
    }
    recording
}
