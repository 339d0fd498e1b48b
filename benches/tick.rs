//! Tick-loop benchmarks: how fast the simulation advances a busy level
//! through the reference physics provider.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use batoman_core::game::arcade::ArcadePhysics;
use batoman_core::game::input::InputFrame;
use batoman_core::game::level::{
    assemble, LevelConfig, MapObject, ObjectLayer, PropertyBag, PropertyValue, TileLayer,
    Tilemap, Tileset, LAYER_PLATFORMS, LAYER_SPAWNS,
};
use batoman_core::game::state::LevelState;
use batoman_core::game::tick::{tick, TickConfig};

/// 80x16 world with a full floor and a row of patrol enemies.
fn bench_map(enemy_count: usize) -> Tilemap {
    let mut tile_properties = BTreeMap::new();
    let mut solid = PropertyBag::new();
    solid.insert("collides".to_string(), PropertyValue::Bool(true));
    tile_properties.insert(0, solid);

    let mut platforms = vec![0u32; 80 * 16];
    for row in 14..16 {
        for col in 0..80 {
            platforms[row * 80 + col] = 1;
        }
    }

    let objects = (0..enemy_count)
        .map(|i| MapObject {
            name: format!("walker-{i}"),
            kind: "enemy".to_string(),
            x: 200.0 + i as f64 * 120.0,
            y: 416.0,
            width: 0.0,
            height: 0.0,
            properties: {
                let mut props = PropertyBag::new();
                props.insert(
                    "behavior".to_string(),
                    PropertyValue::Text("patrol".to_string()),
                );
                props
            },
        })
        .collect();

    Tilemap {
        width: 80,
        height: 16,
        tile_width: 32,
        tile_height: 32,
        tilesets: vec![Tileset {
            name: "world-tiles".to_string(),
            first_gid: 1,
            tile_properties,
        }],
        layers: vec![TileLayer {
            name: LAYER_PLATFORMS.to_string(),
            data: platforms,
        }],
        object_layers: vec![ObjectLayer {
            name: LAYER_SPAWNS.to_string(),
            objects,
        }],
    }
}

fn bench_state(enemy_count: usize) -> LevelState {
    let config = LevelConfig {
        tilemap_key: "bench".to_string(),
        tileset_key: "world-tiles".to_string(),
        start_x: 100,
        start_y: 398,
        ..LevelConfig::default()
    };
    let level = assemble(&config, &bench_map(enemy_count)).expect("bench level must assemble");
    LevelState::new(config, level)
}

fn busy_frame(t: u32) -> InputFrame {
    let mut frame = InputFrame::new();
    frame.set_right(true);
    frame.set_jump(t % 50 < 5);
    frame.set_fire(t % 20 < 2);
    frame
}

fn bench_tick(c: &mut Criterion) {
    let config = TickConfig::default();

    let mut group = c.benchmark_group("tick");
    for enemy_count in [0usize, 8, 32] {
        group.bench_function(format!("{enemy_count}_enemies"), |b| {
            b.iter_batched(
                || (bench_state(enemy_count), ArcadePhysics::new(), 0u32),
                |(mut state, mut physics, mut t)| {
                    for _ in 0..60 {
                        let result = tick(&mut state, busy_frame(t), &mut physics, &config);
                        black_box(result.events.len());
                        t += 1;
                    }
                    state
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();

    c.bench_function("snapshot_roundtrip", |b| {
        let state = bench_state(32);
        b.iter(|| {
            let bytes = state.encode_snapshot().unwrap();
            black_box(LevelState::decode_snapshot(&bytes).unwrap())
        });
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
