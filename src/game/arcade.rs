//! Reference Arcade Physics
//!
//! The in-crate implementation of the physics contract: a deterministic
//! AABB-vs-tile-grid integrator. Each step applies gravity, moves every body
//! one axis at a time against the solid grid and world bounds (setting
//! blocked flags), then scans for overlaps and reports them as contacts in
//! entity-id order. It never resolves gameplay; the orchestrator does.
//!
//! Hosts with their own engine skip this module entirely and implement
//! [`PhysicsProvider`] themselves.

use crate::core::fixed::{Fixed, GRAVITY, TICK_DURATION, fixed_min, fixed_mul};
use crate::game::level::{HazardGrid, HazardKind, TileGrid};
use crate::game::physics::{Body, Contact, PhysicsProvider};
use crate::game::state::LevelState;

/// Stateless reference provider. All the state it needs lives in the
/// [`LevelState`] it steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArcadePhysics;

impl ArcadePhysics {
    /// Create a provider.
    pub fn new() -> Self {
        Self
    }
}

impl PhysicsProvider for ArcadePhysics {
    fn step(&mut self, state: &mut LevelState) -> Vec<Contact> {
        let LevelState {
            level,
            player,
            enemies,
            projectiles,
            checkpoints,
            death_zones,
            ..
        } = state;

        let mut contacts = Vec::new();

        // Move everything first; overlaps are judged on settled positions.
        // Player and enemies collide with world bounds, projectiles must be
        // free to leave so the cull rule can see them outside.
        integrate(
            &mut player.body,
            &level.solids,
            level.world_width,
            level.world_height,
            true,
        );
        for enemy in enemies.values_mut() {
            integrate(
                &mut enemy.body,
                &level.solids,
                level.world_width,
                level.world_height,
                true,
            );
        }
        for projectile in projectiles.values_mut() {
            integrate(
                &mut projectile.body,
                &level.solids,
                level.world_width,
                level.world_height,
                false,
            );
            if projectile.body.blocked.any() {
                contacts.push(Contact::ProjectileGeometry {
                    projectile: projectile.id,
                });
            }
        }

        // Overlap scans, each in id order
        for enemy in enemies.values() {
            if player.body.overlaps(&enemy.body) {
                contacts.push(Contact::PlayerEnemy { enemy: enemy.id });
            }
        }

        for projectile in projectiles.values() {
            for enemy in enemies.values() {
                if projectile.body.overlaps(&enemy.body) {
                    contacts.push(Contact::ProjectileEnemy {
                        projectile: projectile.id,
                        enemy: enemy.id,
                    });
                }
            }
        }

        if let Some(hazards) = &level.hazards {
            if let Some(lethal) = hazard_under(&player.body, &level.solids, hazards) {
                contacts.push(Contact::PlayerHazard { lethal });
            }
        }

        for region in checkpoints.iter() {
            if region.contains(&player.body) {
                contacts.push(Contact::PlayerCheckpoint {
                    position: region.position,
                });
            }
        }

        for region in death_zones.iter() {
            if region.contains(&player.body) {
                contacts.push(Contact::PlayerDeathZone);
            }
        }

        contacts
    }
}

// =============================================================================
// INTEGRATION
// =============================================================================

/// Advance one body by one tick: gravity, then x movement resolved against
/// the solid grid, then y movement. Per-axis resolution keeps a body sliding
/// along a wall instead of sticking to it.
///
/// Bodies move less than a tile per tick at every legal speed, so checking
/// the leading-edge cell row/column is sufficient (no swept test needed).
fn integrate(
    body: &mut Body,
    solids: &TileGrid,
    world_width: Fixed,
    world_height: Fixed,
    clamp_to_world: bool,
) {
    body.blocked.clear();

    if body.gravity_enabled {
        body.velocity.y = fixed_min(
            body.velocity.y + fixed_mul(GRAVITY, TICK_DURATION),
            body.max_fall_speed,
        );
    }

    // X axis
    body.position.x += fixed_mul(body.velocity.x, TICK_DURATION);
    if body.velocity.x > 0 {
        let col = solids.col_at(body.right() - 1);
        if solid_in_rows(solids, col, body.top(), body.bottom()) {
            body.position.x = solids.cell_left(col) - body.size.x / 2;
            body.velocity.x = 0;
            body.blocked.right = true;
        }
    } else if body.velocity.x < 0 {
        let col = solids.col_at(body.left());
        if solid_in_rows(solids, col, body.top(), body.bottom()) {
            body.position.x = solids.cell_left(col + 1) + body.size.x / 2;
            body.velocity.x = 0;
            body.blocked.left = true;
        }
    }

    // Y axis
    body.position.y += fixed_mul(body.velocity.y, TICK_DURATION);
    if body.velocity.y > 0 {
        let row = solids.row_at(body.bottom() - 1);
        if solid_in_cols(solids, row, body.left(), body.right()) {
            body.position.y = solids.cell_top(row) - body.size.y / 2;
            body.velocity.y = 0;
            body.blocked.down = true;
        }
    } else if body.velocity.y < 0 {
        let row = solids.row_at(body.top());
        if solid_in_cols(solids, row, body.left(), body.right()) {
            body.position.y = solids.cell_top(row + 1) + body.size.y / 2;
            body.velocity.y = 0;
            body.blocked.up = true;
        }
    }

    if clamp_to_world {
        clamp_world_bounds(body, world_width, world_height);
    }
}

/// Stop a body against the world edges, Phaser-style collide-world-bounds.
fn clamp_world_bounds(body: &mut Body, world_width: Fixed, world_height: Fixed) {
    let half_w = body.size.x / 2;
    let half_h = body.size.y / 2;

    if body.position.x - half_w < 0 {
        body.position.x = half_w;
        if body.velocity.x < 0 {
            body.velocity.x = 0;
        }
        body.blocked.left = true;
    } else if body.position.x + half_w > world_width {
        body.position.x = world_width - half_w;
        if body.velocity.x > 0 {
            body.velocity.x = 0;
        }
        body.blocked.right = true;
    }

    if body.position.y - half_h < 0 {
        body.position.y = half_h;
        if body.velocity.y < 0 {
            body.velocity.y = 0;
        }
        body.blocked.up = true;
    } else if body.position.y + half_h > world_height {
        body.position.y = world_height - half_h;
        if body.velocity.y > 0 {
            body.velocity.y = 0;
        }
        body.blocked.down = true;
    }
}

/// Any solid cell in the given column across the rows a body spans?
/// The bottom edge is exclusive (a body resting on y=64 does not span the
/// row starting at 64).
fn solid_in_rows(solids: &TileGrid, col: i32, top: Fixed, bottom: Fixed) -> bool {
    let first = solids.row_at(top);
    let last = solids.row_at(bottom - 1);
    (first..=last).any(|row| solids.is_solid(col, row))
}

/// Any solid cell in the given row across the columns a body spans?
fn solid_in_cols(solids: &TileGrid, row: i32, left: Fixed, right: Fixed) -> bool {
    let first = solids.col_at(left);
    let last = solids.col_at(right - 1);
    (first..=last).any(|col| solids.is_solid(col, row))
}

/// Worst hazard under the body's footprint, if any. Lethal wins over plain
/// damage when the body straddles both.
fn hazard_under(body: &Body, solids: &TileGrid, hazards: &HazardGrid) -> Option<bool> {
    let first_col = solids.col_at(body.left());
    let last_col = solids.col_at(body.right() - 1);
    let first_row = solids.row_at(body.top());
    let last_row = solids.row_at(body.bottom() - 1);

    let mut found = None;
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            match hazards.hazard_at(col, row) {
                Some(HazardKind::Lethal) => return Some(true),
                Some(HazardKind::Damage) => found = Some(false),
                None => {}
            }
        }
    }
    found
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::core::fixed::from_int;
    use crate::core::vec2::FixedVec2;
    use crate::game::level::{
        AssembledLevel, LevelConfig, PropertyBag, PropertyValue, SpawnDescriptor, SpawnKind,
        TileLayer, Tilemap, Tileset, assemble, LAYER_HAZARDS, LAYER_PLATFORMS,
    };
    use crate::game::state::{EnemyId, LevelState, ProjectileId};

    /// 16x8 tiles of 32 px: solid floor on the bottom row, a wall column at
    /// col 10 rising two tiles, damage hazard at (4,6), lethal at (5,6).
    fn test_level() -> AssembledLevel {
        let mut tile_properties = BTreeMap::new();
        let mut solid = PropertyBag::new();
        solid.insert("collides".to_string(), PropertyValue::Bool(true));
        tile_properties.insert(0, solid);
        let mut damage = PropertyBag::new();
        damage.insert("damage".to_string(), PropertyValue::Bool(true));
        tile_properties.insert(1, damage);
        let mut lethal = PropertyBag::new();
        lethal.insert("instant-death".to_string(), PropertyValue::Bool(true));
        tile_properties.insert(2, lethal);

        let mut platform_data = vec![0u32; 128];
        for col in 0..16 {
            platform_data[7 * 16 + col] = 1; // floor
        }
        platform_data[6 * 16 + 10] = 1; // wall
        platform_data[5 * 16 + 10] = 1;

        let mut hazard_data = vec![0u32; 128];
        hazard_data[6 * 16 + 4] = 2; // damage
        hazard_data[6 * 16 + 5] = 3; // lethal

        let map = Tilemap {
            width: 16,
            height: 8,
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
                    data: platform_data,
                },
                TileLayer {
                    name: LAYER_HAZARDS.to_string(),
                    data: hazard_data,
                },
            ],
            object_layers: vec![],
        };
        let config = LevelConfig {
            tilemap_key: "arcade-test".to_string(),
            tileset_key: "world-tiles".to_string(),
            ..LevelConfig::default()
        };
        assemble(&config, &map).unwrap()
    }

    fn state_at(x: i32, y: i32) -> LevelState {
        let config = LevelConfig {
            start_x: x,
            start_y: y,
            ..LevelConfig::default()
        };
        let mut state = LevelState::new(config, test_level());
        state.take_events();
        state
    }

    #[test]
    fn test_falling_body_lands_on_floor() {
        // Floor top edge is at y = 224; a 100-tall player rests centered at 174
        let mut state = state_at(100, 100);
        let mut physics = ArcadePhysics::new();

        for _ in 0..120 {
            physics.step(&mut state);
        }

        assert!(state.player.body.blocked.down);
        assert_eq!(state.player.body.velocity.y, 0);
        assert_eq!(state.player.body.bottom(), from_int(224));
    }

    #[test]
    fn test_grounded_body_stays_grounded_every_step() {
        let mut state = state_at(100, 174);
        let mut physics = ArcadePhysics::new();

        for _ in 0..10 {
            physics.step(&mut state);
            assert!(state.player.body.blocked.down);
        }
    }

    #[test]
    fn test_wall_blocks_and_flags() {
        // Wall col 10 occupies x 320..352; approach from the left
        let mut state = state_at(280, 174);
        let mut physics = ArcadePhysics::new();
        state.player.body.velocity.x = from_int(300);

        for _ in 0..30 {
            state.player.body.velocity.x = from_int(300);
            physics.step(&mut state);
        }

        assert!(state.player.body.blocked.right);
        assert_eq!(state.player.body.right(), from_int(320));
    }

    #[test]
    fn test_world_bounds_clamp() {
        let mut state = state_at(40, 174);
        let mut physics = ArcadePhysics::new();

        for _ in 0..60 {
            state.player.body.velocity.x = from_int(-400);
            physics.step(&mut state);
        }

        assert!(state.player.body.blocked.left);
        assert_eq!(state.player.body.left(), 0);
    }

    #[test]
    fn test_projectile_free_to_leave_world() {
        let mut state = state_at(100, 174);
        let id = state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
            kind: crate::game::projectile::ProjectileKind::Burst,
            position: FixedVec2::from_ints(500, 100),
            facing: crate::game::player::Facing::Right,
        });
        let mut physics = ArcadePhysics::new();

        for _ in 0..10 {
            physics.step(&mut state);
        }

        // World is 512 wide; 600 px/s for 10 ticks pushes it past the edge
        assert!(state.projectiles[&id].body.position.x > from_int(512));
    }

    #[test]
    fn test_projectile_impact_reported() {
        let mut state = state_at(100, 174);
        // Aimed at the wall column from the left, level with its tiles
        let id = state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
            kind: crate::game::projectile::ProjectileKind::Burst,
            position: FixedVec2::from_ints(290, 180),
            facing: crate::game::player::Facing::Right,
        });
        let mut physics = ArcadePhysics::new();

        let mut impact = false;
        for _ in 0..20 {
            let contacts = physics.step(&mut state);
            if contacts
                .iter()
                .any(|c| *c == Contact::ProjectileGeometry { projectile: id })
            {
                impact = true;
                break;
            }
        }
        assert!(impact);
        assert!(state.projectiles[&id].body.position.x < from_int(321));
    }

    #[test]
    fn test_player_enemy_overlap_reported() {
        let mut state = state_at(100, 174);
        state.level.spawns = vec![SpawnDescriptor {
            kind: SpawnKind::Enemy,
            position: FixedVec2::from_ints(110, 180),
            extent: FixedVec2::from_ints(32, 32),
            properties: PropertyBag::new(),
        }];
        state.restart();
        state.take_events();
        let mut physics = ArcadePhysics::new();

        let contacts = physics.step(&mut state);
        assert!(contacts
            .iter()
            .any(|c| *c == Contact::PlayerEnemy { enemy: EnemyId(0) }));
    }

    #[test]
    fn test_hazard_classification_lethal_wins() {
        // Damage tile at col 4 row 6 (x 128..160); player at 128 spans
        // cols 3..4 and never reaches the lethal tile at col 5
        let mut state = state_at(128, 174);
        let mut physics = ArcadePhysics::new();
        let contacts = physics.step(&mut state);
        assert!(contacts
            .iter()
            .any(|c| *c == Contact::PlayerHazard { lethal: false }));

        // Straddling damage and lethal tiles: lethal wins
        let mut state = state_at(160, 174);
        let contacts = physics.step(&mut state);
        assert!(contacts
            .iter()
            .any(|c| *c == Contact::PlayerHazard { lethal: true }));
    }

    #[test]
    fn test_checkpoint_region_contact_carries_position() {
        let mut state = state_at(100, 174);
        state.level.spawns = vec![SpawnDescriptor {
            kind: SpawnKind::Checkpoint,
            position: FixedVec2::from_ints(90, 140),
            extent: FixedVec2::from_ints(32, 80),
            properties: PropertyBag::new(),
        }];
        state.restart();
        state.take_events();
        let mut physics = ArcadePhysics::new();

        let contacts = physics.step(&mut state);
        assert!(contacts.iter().any(|c| *c
            == Contact::PlayerCheckpoint {
                position: FixedVec2::from_ints(90, 140)
            }));
    }

    #[test]
    fn test_floating_enemy_ignores_gravity() {
        let mut state = state_at(100, 174);
        let mut props = PropertyBag::new();
        props.insert(
            "behavior".to_string(),
            PropertyValue::Text("floating-patrol".to_string()),
        );
        state.level.spawns = vec![SpawnDescriptor {
            kind: SpawnKind::Enemy,
            position: FixedVec2::from_ints(400, 80),
            extent: FixedVec2::from_ints(32, 32),
            properties: props,
        }];
        state.restart();
        state.take_events();
        let mut physics = ArcadePhysics::new();

        for _ in 0..60 {
            physics.step(&mut state);
        }
        assert_eq!(
            state.enemies[&EnemyId(0)].body.position.y,
            from_int(80)
        );
    }

    #[test]
    fn test_step_is_deterministic() {
        let build = || {
            let mut state = state_at(100, 100);
            state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
                kind: crate::game::projectile::ProjectileKind::Nova,
                position: FixedVec2::from_ints(200, 150),
                facing: crate::game::player::Facing::Right,
            });
            state
        };
        let mut a = build();
        let mut b = build();
        let mut physics = ArcadePhysics::new();

        for _ in 0..120 {
            let ca = physics.step(&mut a);
            let cb = physics.step(&mut b);
            assert_eq!(ca, cb);
        }
        assert_eq!(a.player.body, b.player.body);
        assert_eq!(
            a.projectiles[&ProjectileId(0)].body,
            b.projectiles[&ProjectileId(0)].body
        );
    }
}
