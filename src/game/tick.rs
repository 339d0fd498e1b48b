//! Authoritative Simulation Tick
//!
//! One call advances the whole level by one 60 Hz step, in a fixed phase
//! order: player update, enemy updates, physics step, contact resolution,
//! transient cleanup, death flow. Damage applied from a contact this tick is
//! therefore visible to the next tick's state derivation, never this one's.
//!
//! The function is 100% deterministic: fixed-point math only, id-ordered
//! entity maps, contacts consumed in the order the provider reports them.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::game::events::GameEvent;
use crate::game::input::{InputFrame, InputSample};
use crate::game::physics::{Contact, PhysicsProvider};
use crate::game::state::{LevelPhase, LevelState};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the run is over (death with no lives left)
    pub run_ended: bool,
}

/// Tunable per-run simulation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TickConfig {
    /// Damage from touching an enemy body
    pub enemy_contact_damage: u32,
    /// Damage from a non-lethal hazard tile
    pub hazard_damage: u32,
    /// Death pause before respawn or run end (0.5 s at 60 Hz)
    pub death_delay_ticks: u32,
    /// How far past the world's horizontal extent a projectile may travel
    /// before it is culled
    pub cull_margin: Fixed,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            enemy_contact_damage: 1,
            hazard_damage: 1,
            death_delay_ticks: 30,
            cull_margin: 6553600, // 100.0 * 65536
        }
    }
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The level state (will be mutated)
/// * `frame` - Held-button input for this tick; edges are derived against
///   the previous tick's frame stored in the state
/// * `physics` - Movement integrator implementing the physics contract
/// * `config` - Simulation parameters
pub fn tick(
    state: &mut LevelState,
    frame: InputFrame,
    physics: &mut dyn PhysicsProvider,
    config: &TickConfig,
) -> TickResult {
    let mut result = TickResult::default();

    // 0. An ended run is inert
    if state.phase == LevelPhase::Ended {
        result.run_ended = true;
        return result;
    }

    // 1. Advance tick counter and derive input edges
    state.tick += 1;
    let sample = InputSample::between(state.prev_frame, frame);
    state.prev_frame = frame;

    // 2. Death pause: the world holds still until the delay runs out, then
    //    the respawn/run-end decision is made
    if let LevelPhase::DeathPause { ticks_remaining } = state.phase {
        if ticks_remaining > 1 {
            state.phase = LevelPhase::DeathPause {
                ticks_remaining: ticks_remaining - 1,
            };
        } else {
            resolve_death(state, &mut result);
        }
        result.events = state.take_events();
        return result;
    }

    // 3. Player update (may request a projectile spawn)
    if let Some(shot) = state.player.update(&sample) {
        state.spawn_projectile(shot);
    }

    // 4. Enemy updates, in id order
    for enemy in state.enemies.values_mut() {
        enemy.update();
    }

    // 5. Physics step: bodies move, blocked flags refresh, overlaps reported
    let contacts = physics.step(state);

    // 6. Resolve contacts in provider order
    for contact in contacts {
        resolve_contact(state, contact, config);
    }

    // 7. Cleanup: cull projectiles that left the world
    let world_width = state.level.world_width;
    let margin = config.cull_margin;
    state
        .projectiles
        .retain(|_, p| !p.is_out_of_bounds(world_width, margin));

    // 8. Death flow: a zero-health player starts the death pause
    if state.player.health == 0 {
        state.phase = LevelPhase::DeathPause {
            ticks_remaining: config.death_delay_ticks,
        };
    }

    result.events = state.take_events();
    result
}

/// Dispatch one contact into the damage/checkpoint methods.
fn resolve_contact(state: &mut LevelState, contact: Contact, config: &TickConfig) {
    let tick = state.tick;
    match contact {
        Contact::PlayerEnemy { enemy } => {
            if state.enemies.contains_key(&enemy) {
                state
                    .player
                    .take_damage(config.enemy_contact_damage, tick, &mut state.pending_events);
            }
        }

        Contact::ProjectileEnemy { projectile, enemy } => {
            // The projectile may already be gone (solid impact resolved
            // first); a spent shot hits nothing
            let Some(shot) = state.projectiles.remove(&projectile) else {
                return;
            };
            let Some(target) = state.enemies.get_mut(&enemy) else {
                return;
            };

            let fatal = target.take_damage(shot.damage(), tick, &mut state.pending_events);
            if fatal {
                // Removal is synchronous with the death transition, so a
                // dead enemy can never be hit again. Score is credited here
                // by the orchestrator, never by the enemy itself.
                let score_value = target.score_value;
                state.enemies.remove(&enemy);
                state
                    .player
                    .add_score(score_value, tick, &mut state.pending_events);
            }
        }

        Contact::ProjectileGeometry { projectile } => {
            state.projectiles.remove(&projectile);
        }

        Contact::PlayerHazard { lethal } => {
            if lethal {
                state.player.kill(tick, &mut state.pending_events);
            } else {
                state
                    .player
                    .take_damage(config.hazard_damage, tick, &mut state.pending_events);
            }
        }

        Contact::PlayerCheckpoint { position } => {
            if state.tracker.activate(position) {
                state.push_event(GameEvent::checkpoint_activated(tick, position));
            }
        }

        Contact::PlayerDeathZone => {
            state.player.kill(tick, &mut state.pending_events);
        }
    }
}

/// The death pause just expired: respawn with lives remaining, otherwise
/// end the run.
fn resolve_death(state: &mut LevelState, result: &mut TickResult) {
    let tick = state.tick;
    if state.player.lives > 0 {
        let spot = state.tracker.spawn_point();
        state.player.respawn(spot, tick, &mut state.pending_events);
        state.phase = LevelPhase::Playing;
    } else {
        state.push_event(GameEvent::run_ended(tick, state.player.score));
        state.phase = LevelPhase::Ended;
        result.run_ended = true;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::core::vec2::FixedVec2;
    use crate::game::events::GameEventData;
    use crate::game::level::{
        AssembledLevel, LevelConfig, PropertyBag, SpawnDescriptor, SpawnKind, TileLayer,
        Tilemap, Tileset, assemble, LAYER_PLATFORMS,
    };
    use crate::game::physics::BlockedFlags;
    use crate::game::player::PlayerState;
    use crate::game::state::EnemyId;

    /// Provider stub: moves nothing, reports a scripted contact list once.
    struct ScriptedPhysics {
        contacts: Vec<Contact>,
    }

    impl ScriptedPhysics {
        fn new(contacts: Vec<Contact>) -> Self {
            Self { contacts }
        }

        fn quiet() -> Self {
            Self::new(Vec::new())
        }
    }

    impl PhysicsProvider for ScriptedPhysics {
        fn step(&mut self, _state: &mut LevelState) -> Vec<Contact> {
            std::mem::take(&mut self.contacts)
        }
    }

    fn test_level(spawns: Vec<SpawnDescriptor>) -> AssembledLevel {
        let mut tile_properties = BTreeMap::new();
        let mut solid = PropertyBag::new();
        solid.insert(
            "collides".to_string(),
            crate::game::level::PropertyValue::Bool(true),
        );
        tile_properties.insert(0, solid);

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
            layers: vec![TileLayer {
                name: LAYER_PLATFORMS.to_string(),
                data: {
                    let mut data = vec![0u32; 128];
                    for col in 112..128 {
                        data[col] = 1;
                    }
                    data
                },
            }],
            object_layers: vec![],
        };
        let config = LevelConfig {
            tilemap_key: "test".to_string(),
            tileset_key: "world-tiles".to_string(),
            ..LevelConfig::default()
        };
        let mut level = assemble(&config, &map).unwrap();
        level.spawns = spawns;
        level
    }

    fn enemy_spawn(x: i32, y: i32) -> SpawnDescriptor {
        SpawnDescriptor {
            kind: SpawnKind::Enemy,
            position: FixedVec2::from_ints(x, y),
            extent: FixedVec2::from_ints(32, 32),
            properties: PropertyBag::new(),
        }
    }

    fn fresh_state(spawns: Vec<SpawnDescriptor>) -> LevelState {
        let mut state = LevelState::new(LevelConfig::default(), test_level(spawns));
        state.take_events(); // drop the HUD trio
        state
    }

    fn drain(state: &mut LevelState, physics: &mut dyn PhysicsProvider, ticks: u32) -> Vec<GameEvent> {
        let config = TickConfig::default();
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(tick(state, InputFrame::new(), physics, &config).events);
        }
        events
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut state = fresh_state(vec![]);
        let mut physics = ScriptedPhysics::quiet();
        tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_enemy_contact_damages_player() {
        let mut state = fresh_state(vec![enemy_spawn(200, 100)]);
        let mut physics =
            ScriptedPhysics::new(vec![Contact::PlayerEnemy { enemy: EnemyId(0) }]);

        let result = tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());
        assert_eq!(state.player.health, PlayerState::MAX_HEALTH - 1);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::HealthChanged { health: 2, .. })));
    }

    #[test]
    fn test_projectile_kill_credits_score() {
        let mut state = fresh_state(vec![enemy_spawn(200, 100)]);
        state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
            kind: crate::game::projectile::ProjectileKind::Nova,
            position: FixedVec2::from_ints(180, 100),
            facing: crate::game::player::Facing::Right,
        });

        // Nova does 3 damage, default enemy health is 2: one hit kills
        let mut physics = ScriptedPhysics::new(vec![Contact::ProjectileEnemy {
            projectile: crate::game::state::ProjectileId(0),
            enemy: EnemyId(0),
        }]);
        let result = tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());

        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.score, 100);

        let died = result
            .events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::EnemyDied { .. }))
            .count();
        assert_eq!(died, 1);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::ScoreChanged { score: 100 })));
    }

    #[test]
    fn test_spent_projectile_cannot_hit() {
        let mut state = fresh_state(vec![enemy_spawn(200, 100)]);
        state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
            kind: crate::game::projectile::ProjectileKind::Burst,
            position: FixedVec2::from_ints(180, 100),
            facing: crate::game::player::Facing::Right,
        });

        // Geometry impact reported before the enemy overlap: the shot dies
        // on the wall and the enemy is untouched
        let pid = crate::game::state::ProjectileId(0);
        let mut physics = ScriptedPhysics::new(vec![
            Contact::ProjectileGeometry { projectile: pid },
            Contact::ProjectileEnemy {
                projectile: pid,
                enemy: EnemyId(0),
            },
        ]);
        tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());

        assert!(state.projectiles.is_empty());
        assert_eq!(
            state.enemies[&EnemyId(0)].health,
            crate::game::enemy::EnemyState::DEFAULT_HEALTH
        );
    }

    #[test]
    fn test_checkpoint_adoption_fires_once() {
        let mut state = fresh_state(vec![]);
        let spot = FixedVec2::from_ints(500, 640);

        let mut first =
            ScriptedPhysics::new(vec![Contact::PlayerCheckpoint { position: spot }]);
        let result = tick(&mut state, InputFrame::new(), &mut first, &TickConfig::default());
        assert_eq!(result.events.len(), 1);
        assert!(matches!(
            result.events[0].data,
            GameEventData::CheckpointActivated { .. }
        ));

        // Same checkpoint again: no duplicate cue
        let mut second =
            ScriptedPhysics::new(vec![Contact::PlayerCheckpoint { position: spot }]);
        let result = tick(&mut state, InputFrame::new(), &mut second, &TickConfig::default());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_death_pause_then_respawn_at_checkpoint() {
        let mut state = fresh_state(vec![]);
        let spot = FixedVec2::from_ints(500, 640);
        state.tracker.activate(spot);

        let mut physics = ScriptedPhysics::new(vec![Contact::PlayerDeathZone]);
        let result = tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::PlayerDied { .. })));
        assert!(matches!(state.phase, LevelPhase::DeathPause { .. }));

        // World holds still for the whole pause
        let mut quiet = ScriptedPhysics::quiet();
        let events = drain(&mut state, &mut quiet, 29);
        assert!(events.is_empty());
        assert!(matches!(state.phase, LevelPhase::DeathPause { .. }));

        // Pause expires: respawn at the checkpoint with full health
        let mut quiet = ScriptedPhysics::quiet();
        let events = drain(&mut state, &mut quiet, 1);
        assert_eq!(state.phase, LevelPhase::Playing);
        assert_eq!(state.player.health, state.player.max_health);
        assert_eq!(state.player.body.position, spot);
        assert!(events
            .iter()
            .any(|e| matches!(e.data, GameEventData::PlayerRespawned { .. })));
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut state = fresh_state(vec![]);
        state.player.lives = 1;
        state.player.health = 1;

        let mut physics = ScriptedPhysics::new(vec![Contact::PlayerDeathZone]);
        tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());
        assert_eq!(state.player.lives, 0);

        // Burn the pause; the run ends instead of respawning
        let mut quiet = ScriptedPhysics::quiet();
        let config = TickConfig::default();
        let mut ended = false;
        for _ in 0..config.death_delay_ticks {
            let result = tick(&mut state, InputFrame::new(), &mut quiet, &config);
            ended |= result.run_ended;
        }
        assert!(ended);
        assert!(state.is_ended());

        // Further ticks are inert
        let result = tick(&mut state, InputFrame::new(), &mut quiet, &config);
        assert!(result.run_ended);
        assert!(result.events.is_empty());
        assert_eq!(state.player.health, 0);
    }

    #[test]
    fn test_lethal_hazard_bypasses_stun() {
        let mut state = fresh_state(vec![]);

        // Stun the player first, then hit the lethal hazard: it kills anyway
        let mut stun = ScriptedPhysics::new(vec![Contact::PlayerHazard { lethal: false }]);
        tick(&mut state, InputFrame::new(), &mut stun, &TickConfig::default());
        assert!(state.player.stun_remaining > 0);
        assert_eq!(state.player.health, 2);

        let mut lethal = ScriptedPhysics::new(vec![Contact::PlayerHazard { lethal: true }]);
        tick(&mut state, InputFrame::new(), &mut lethal, &TickConfig::default());
        assert_eq!(state.player.health, 0);
        assert_eq!(state.player.lives, PlayerState::STARTING_LIVES - 1);
    }

    #[test]
    fn test_hazard_damage_throttled_by_stun() {
        let mut state = fresh_state(vec![]);
        let config = TickConfig::default();

        // Standing in a damage hazard: one hit, then the stun no-op eats
        // the repeated contacts until the stun runs out
        for _ in 0..10 {
            let mut physics =
                ScriptedPhysics::new(vec![Contact::PlayerHazard { lethal: false }]);
            tick(&mut state, InputFrame::new(), &mut physics, &config);
        }
        assert_eq!(state.player.health, 2);
    }

    #[test]
    fn test_projectile_culled_out_of_bounds() {
        let mut state = fresh_state(vec![]);
        let id = state.spawn_projectile(crate::game::projectile::ProjectileSpawn {
            kind: crate::game::projectile::ProjectileKind::Burst,
            position: FixedVec2::from_ints(180, 100),
            facing: crate::game::player::Facing::Right,
        });

        // Teleport it well past the world edge plus margin
        state.projectiles.get_mut(&id).unwrap().body.position =
            FixedVec2::from_ints(16 * 32 + 101, 100);

        let mut physics = ScriptedPhysics::quiet();
        tick(&mut state, InputFrame::new(), &mut physics, &TickConfig::default());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_input_edges_derived_across_ticks() {
        let mut state = fresh_state(vec![]);
        state.player.body.blocked = BlockedFlags {
            down: true,
            ..BlockedFlags::default()
        };
        let config = TickConfig::default();

        let mut held = InputFrame::new();
        held.set_jump(true);

        // First tick with jump held is the press edge: the player jumps
        let mut physics = ScriptedPhysics::quiet();
        tick(&mut state, held, &mut physics, &config);
        assert_eq!(state.player.body.velocity.y, PlayerState::JUMP_VELOCITY);

        // Still held next tick: no second impulse even if grounded again
        state.player.body.velocity.y = 0;
        state.player.body.blocked.down = true;
        let mut physics = ScriptedPhysics::quiet();
        tick(&mut state, held, &mut physics, &config);
        assert_eq!(state.player.body.velocity.y, 0);
    }

    #[test]
    fn test_tick_determinism() {
        let spawns = vec![enemy_spawn(200, 100), enemy_spawn(300, 100)];
        let mut a = fresh_state(spawns.clone());
        let mut b = fresh_state(spawns);
        let config = TickConfig::default();

        let mut frame = InputFrame::new();
        frame.set_right(true);

        for t in 0..300u32 {
            frame.set_jump(t % 40 < 5);
            frame.set_fire(t % 25 < 3);
            let mut pa = ScriptedPhysics::quiet();
            let mut pb = ScriptedPhysics::quiet();
            tick(&mut a, frame, &mut pa, &config);
            tick(&mut b, frame, &mut pb, &config);
        }

        assert_eq!(a.encode_snapshot().unwrap(), b.encode_snapshot().unwrap());
    }
}
