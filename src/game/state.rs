//! Level State
//!
//! The orchestrator-owned world state for one level run: the player, ordered
//! entity maps, trigger regions, the checkpoint tracker, and the outbound
//! event queue. Uses BTreeMap so every iteration is in id order and the
//! whole simulation stays deterministic.
//!
//! Nothing outside the orchestrator mutates this directly; entities report
//! events, and the tick loop in [`crate::game::tick`] acts on them.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::FixedVec2;
use crate::game::checkpoint::CheckpointTracker;
use crate::game::enemy::EnemyState;
use crate::game::events::GameEvent;
use crate::game::input::InputFrame;
use crate::game::level::{AssembledLevel, LevelConfig, SpawnKind};
use crate::game::physics::Body;
use crate::game::player::PlayerState;
use crate::game::projectile::{ProjectileSpawn, ProjectileState};

// =============================================================================
// ENTITY IDS
// =============================================================================

/// Unique enemy identifier, dense and assigned in spawn-descriptor order.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

/// Unique projectile identifier (monotonic counter).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

// =============================================================================
// TRIGGER REGIONS
// =============================================================================

/// A static trigger rectangle built from a checkpoint or death-zone spawn
/// descriptor. Never moves; the physics provider only tests overlap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegion {
    /// Authored top-left corner; doubles as the region's coordinate in
    /// checkpoint comparisons and respawn placement
    pub position: FixedVec2,
    /// Width and height in fixed-point pixels
    pub extent: FixedVec2,
}

impl TriggerRegion {
    /// Whether the given body overlaps this region.
    pub fn contains(&self, body: &Body) -> bool {
        body.overlaps_rect(self.position, self.extent)
    }
}

// =============================================================================
// LEVEL PHASE
// =============================================================================

/// Where the level run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum LevelPhase {
    /// Active gameplay
    #[default]
    Playing,
    /// Player died; the world holds still until the delay runs out, then
    /// either respawns the player or ends the run
    DeathPause {
        /// Ticks left before the respawn/run-end decision
        ticks_remaining: u32,
    },
    /// Run over (death with no lives left); further ticks are inert
    Ended,
}

// =============================================================================
// LEVEL STATE
// =============================================================================

/// Complete state of one level run.
///
/// Everything the tick loop reads or writes lives here, so a bincode
/// snapshot of this struct is a full suspend/resume point and the unit of
/// comparison for determinism checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelState {
    /// Static per-level configuration
    pub config: LevelConfig,

    /// Immutable geometry/spawn model from level assembly
    pub level: AssembledLevel,

    /// Current tick, advances even during the death pause
    pub tick: u32,

    /// Current phase
    pub phase: LevelPhase,

    /// The player avatar
    pub player: PlayerState,

    /// Live enemies (BTreeMap for deterministic iteration)
    pub enemies: BTreeMap<EnemyId, EnemyState>,

    /// Live projectiles (BTreeMap for deterministic iteration)
    pub projectiles: BTreeMap<ProjectileId, ProjectileState>,

    /// Next projectile id (monotonic counter)
    pub next_projectile_id: u32,

    /// Checkpoint trigger regions, in spawn-descriptor order
    pub checkpoints: Vec<TriggerRegion>,

    /// Death-zone trigger regions, in spawn-descriptor order
    pub death_zones: Vec<TriggerRegion>,

    /// Last activated checkpoint / respawn anchor
    pub tracker: CheckpointTracker,

    /// Previous tick's input frame, for edge derivation
    pub prev_frame: InputFrame,

    /// Events generated this tick (drained by the orchestrator)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl LevelState {
    /// Build the world for a level: player at the configured start, one
    /// enemy per enemy descriptor, one trigger region per checkpoint and
    /// death-zone descriptor. Everything is constructed eagerly here, before
    /// the first tick; nothing spawns lazily later.
    ///
    /// Emits the initial HUD trio (health, score, lives) so the presentation
    /// layer starts from known values.
    pub fn new(config: LevelConfig, level: AssembledLevel) -> Self {
        let start = config.start();
        let (enemies, checkpoints, death_zones) = build_from_spawns(&level);

        let mut state = Self {
            config,
            level,
            tick: 0,
            phase: LevelPhase::Playing,
            player: PlayerState::new(start),
            enemies,
            projectiles: BTreeMap::new(),
            next_projectile_id: 0,
            checkpoints,
            death_zones,
            tracker: CheckpointTracker::new(start),
            prev_frame: InputFrame::new(),
            pending_events: Vec::new(),
        };
        state.emit_hud();
        state
    }

    /// Turn a shot request from the player into a live projectile.
    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.insert(id, ProjectileState::new(id, spawn));
        id
    }

    /// Whether the run is over.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, LevelPhase::Ended)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Full level restart: entities rebuilt from the retained spawn
    /// descriptors, player back at the level start with fresh lives and a
    /// zero score, projectiles gone, checkpoint progress forgotten. The HUD
    /// trio is re-emitted so the presentation resyncs.
    pub fn restart(&mut self) {
        let (enemies, checkpoints, death_zones) = build_from_spawns(&self.level);
        self.enemies = enemies;
        self.checkpoints = checkpoints;
        self.death_zones = death_zones;
        self.projectiles.clear();
        self.next_projectile_id = 0;
        self.player = PlayerState::new(self.config.start());
        self.tracker.reset();
        self.prev_frame = InputFrame::new();
        self.tick = 0;
        self.phase = LevelPhase::Playing;
        self.pending_events.clear();
        self.emit_hud();
    }

    fn emit_hud(&mut self) {
        let tick = self.tick;
        self.pending_events.push(GameEvent::health_changed(
            tick,
            self.player.health,
            self.player.max_health,
        ));
        self.pending_events
            .push(GameEvent::score_changed(tick, self.player.score));
        self.pending_events
            .push(GameEvent::lives_changed(tick, self.player.lives));
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Serialize the whole run to a compact binary snapshot. Pending events
    /// are transient and not captured.
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Restore a run from a snapshot produced by [`Self::encode_snapshot`].
    pub fn decode_snapshot(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Instantiate entities and trigger regions from the level's descriptors.
/// Powerup and boss-trigger descriptors are carried in the level data but
/// produce nothing here.
fn build_from_spawns(
    level: &AssembledLevel,
) -> (
    BTreeMap<EnemyId, EnemyState>,
    Vec<TriggerRegion>,
    Vec<TriggerRegion>,
) {
    let mut enemies = BTreeMap::new();
    let mut checkpoints = Vec::new();
    let mut death_zones = Vec::new();
    let mut next_enemy = 0u32;

    for spawn in &level.spawns {
        match spawn.kind {
            SpawnKind::Enemy => {
                let id = EnemyId(next_enemy);
                next_enemy += 1;
                enemies.insert(id, EnemyState::from_spawn(id, spawn));
            }
            SpawnKind::Checkpoint => checkpoints.push(TriggerRegion {
                position: spawn.position,
                extent: spawn.extent,
            }),
            SpawnKind::DeathZone => death_zones.push(TriggerRegion {
                position: spawn.position,
                extent: spawn.extent,
            }),
            SpawnKind::Powerup | SpawnKind::BossTrigger => {}
        }
    }

    (enemies, checkpoints, death_zones)
}

// =============================================================================
// TESTS
// =============================================================================
