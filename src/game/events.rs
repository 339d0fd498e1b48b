//! Game Events
//!
//! Semantic events generated during simulation. The presentation layer
//! (HUD, audio, camera cues) subscribes to these; the simulation never
//! queries presentation state back.

use serde::{Serialize, Deserialize};
use crate::core::vec2::FixedVec2;
use crate::game::state::EnemyId;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Player death processed first
    PlayerDeath = 0,
    /// Then enemy deaths
    EnemyDeath = 1,
    /// Then respawns
    Respawn = 2,
    /// Then checkpoint adoption
    Checkpoint = 3,
    /// Then HUD value updates
    HudUpdate = 4,
    /// Lowest priority
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player health reached zero
    PlayerDied {
        /// Lives remaining after the death decrement
        lives_remaining: u32,
    },

    /// Enemy health reached zero
    EnemyDied {
        /// Which enemy died
        enemy_id: EnemyId,
        /// Points the orchestrator credits for the kill
        score_value: u32,
        /// Where it died (for presentation effects)
        position: FixedVec2,
    },

    /// Player was placed back into the world
    PlayerRespawned {
        /// Respawn coordinate (checkpoint or level start)
        position: FixedVec2,
    },

    /// A new checkpoint was adopted
    CheckpointActivated {
        /// The adopted respawn coordinate
        position: FixedVec2,
    },

    /// Player health changed
    HealthChanged {
        /// New health value
        health: u32,
        /// Maximum for HUD scaling
        max_health: u32,
    },

    /// Player score changed
    ScoreChanged {
        /// New total score
        score: u32,
    },

    /// Player lives changed
    LivesChanged {
        /// New lives count
        lives: u32,
    },

    /// The run is over (death with no lives remaining)
    RunEnded {
        /// Final score
        score: u32,
        /// Total run length in ticks
        duration_ticks: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Enemy involved (for tie-breaking)
    pub enemy_id: Option<EnemyId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let enemy_id = match &data {
            GameEventData::EnemyDied { enemy_id, .. } => Some(*enemy_id),
            _ => None,
        };

        Self {
            tick,
            priority,
            enemy_id,
            data,
        }
    }

    /// Create player died event.
    pub fn player_died(tick: u32, lives_remaining: u32) -> Self {
        Self::new(
            tick,
            EventPriority::PlayerDeath,
            GameEventData::PlayerDied { lives_remaining },
        )
    }

    /// Create enemy died event.
    pub fn enemy_died(tick: u32, enemy_id: EnemyId, score_value: u32, position: FixedVec2) -> Self {
        Self::new(
            tick,
            EventPriority::EnemyDeath,
            GameEventData::EnemyDied {
                enemy_id,
                score_value,
                position,
            },
        )
    }

    /// Create player respawned event.
    pub fn player_respawned(tick: u32, position: FixedVec2) -> Self {
        Self::new(
            tick,
            EventPriority::Respawn,
            GameEventData::PlayerRespawned { position },
        )
    }

    /// Create checkpoint activated event.
    pub fn checkpoint_activated(tick: u32, position: FixedVec2) -> Self {
        Self::new(
            tick,
            EventPriority::Checkpoint,
            GameEventData::CheckpointActivated { position },
        )
    }

    /// Create health changed event.
    pub fn health_changed(tick: u32, health: u32, max_health: u32) -> Self {
        Self::new(
            tick,
            EventPriority::HudUpdate,
            GameEventData::HealthChanged { health, max_health },
        )
    }

    /// Create score changed event.
    pub fn score_changed(tick: u32, score: u32) -> Self {
        Self::new(
            tick,
            EventPriority::HudUpdate,
            GameEventData::ScoreChanged { score },
        )
    }

    /// Create lives changed event.
    pub fn lives_changed(tick: u32, lives: u32) -> Self {
        Self::new(
            tick,
            EventPriority::HudUpdate,
            GameEventData::LivesChanged { lives },
        )
    }

    /// Create run ended event.
    pub fn run_ended(tick: u32, score: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::RunEnded {
                score,
                duration_ticks: tick,
            },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.enemy_id == other.enemy_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then enemy_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.enemy_id.cmp(&other.enemy_id))
    }
}
