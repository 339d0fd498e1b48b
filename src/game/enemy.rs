//! Enemies
//!
//! One gameplay-state struct for every enemy; the behavior variant picks
//! the per-tick motion rule inside a single `update`. Patrol walks between
//! `anchor ± patrol_range` at fixed speed and turns around when it crosses a
//! bound or runs into a wall; the floating variant applies the same
//! horizontal rule with gravity off; stationary holds position.
//!
//! Enemies never mutate the player or the score. Damage is applied by the
//! orchestrator from physics contacts, and death is reported as an event
//! carrying the score value for the orchestrator to credit.

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::fixed::{Fixed, TICK_DURATION, fixed_max};
use crate::core::vec2::FixedVec2;
use crate::game::events::GameEvent;
use crate::game::level::SpawnDescriptor;
use crate::game::physics::Body;
use crate::game::state::EnemyId;

/// Behavior variant, selected by the spawn descriptor's `behavior` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks between the patrol bounds, subject to gravity
    Patrol,
    /// Same horizontal rule, gravity off (hovers at spawn height)
    FloatingPatrol,
    /// Holds position
    Stationary,
}

impl EnemyKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "patrol" => Some(Self::Patrol),
            "floating-patrol" => Some(Self::FloatingPatrol),
            "stationary" => Some(Self::Stationary),
            _ => None,
        }
    }
}

/// One live enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    /// Stable identifier, also the entity-map key
    pub id: EnemyId,
    /// Behavior variant
    pub kind: EnemyKind,
    /// Movable body
    pub body: Body,
    /// Current health, never above `max_health`
    pub health: u32,
    /// Health at spawn
    pub max_health: u32,
    /// Score credited to the player on death
    pub score_value: u32,
    /// Walk speed in fixed-point pixels per second
    pub speed: Fixed,
    /// X coordinate the patrol is centered on
    pub anchor_x: Fixed,
    /// Half-range of the patrol, so bounds are `anchor_x ± patrol_range`
    pub patrol_range: Fixed,
    /// Current walk direction, +1 right or -1 left
    pub direction: i32,
    /// Hit-flicker time remaining
    pub flicker_remaining: Fixed,
}

impl EnemyState {
    /// Health when the spawn descriptor does not override it.
    pub const DEFAULT_HEALTH: u32 = 2;

    /// Walk speed default.
    pub const DEFAULT_SPEED: Fixed = 5242880; // 80.0 * 65536

    /// Score value default.
    pub const DEFAULT_SCORE: u32 = 100;

    /// Patrol half-range default.
    pub const DEFAULT_PATROL_RANGE: Fixed = 7864320; // 120.0 * 65536

    /// Hitbox width.
    pub const HITBOX_WIDTH: Fixed = 4194304; // 64.0 * 65536

    /// Hitbox height.
    pub const HITBOX_HEIGHT: Fixed = 4194304; // 64.0 * 65536

    /// How long the hit flicker lasts.
    pub const DAMAGE_FLICKER: Fixed = 23593; // 0.36 * 65536

    /// Visibility toggle period inside the hit flicker.
    pub const FLICKER_INTERVAL: Fixed = 3932; // 0.06 * 65536

    /// Build an enemy from a spawn descriptor, reading `behavior`, `health`,
    /// `speed`, `scoreValue`, and `patrolDistance` from its property bag and
    /// falling back to the defaults above.
    pub fn from_spawn(id: EnemyId, spawn: &SpawnDescriptor) -> Self {
        let kind = match spawn.properties.get("behavior").and_then(|v| v.as_str()) {
            Some(s) => EnemyKind::parse(s).unwrap_or_else(|| {
                warn!(enemy = id.0, behavior = %s, "unknown enemy behavior; using patrol");
                EnemyKind::Patrol
            }),
            None => EnemyKind::Patrol,
        };

        let health = spawn
            .properties
            .get("health")
            .and_then(|v| v.as_i64())
            .filter(|h| *h > 0)
            .map(|h| h as u32)
            .unwrap_or(Self::DEFAULT_HEALTH);

        let speed = spawn
            .properties
            .get("speed")
            .and_then(|v| v.as_fixed())
            .unwrap_or(Self::DEFAULT_SPEED);

        let score_value = spawn
            .properties
            .get("scoreValue")
            .and_then(|v| v.as_i64())
            .filter(|s| *s >= 0)
            .map(|s| s as u32)
            .unwrap_or(Self::DEFAULT_SCORE);

        let patrol_range = spawn
            .properties
            .get("patrolDistance")
            .and_then(|v| v.as_fixed())
            .unwrap_or(Self::DEFAULT_PATROL_RANGE);

        let mut body = Body::new(
            spawn.position,
            FixedVec2::new(Self::HITBOX_WIDTH, Self::HITBOX_HEIGHT),
        );
        if kind == EnemyKind::FloatingPatrol {
            body.gravity_enabled = false;
        }

        Self {
            id,
            kind,
            body,
            health,
            max_health: health,
            score_value,
            speed,
            anchor_x: spawn.position.x,
            patrol_range,
            direction: 1,
            flicker_remaining: 0,
        }
    }

    /// Per-tick behavior step. Sets velocity intent only; the physics
    /// provider moves the body afterwards.
    pub fn update(&mut self) {
        self.flicker_remaining = fixed_max(0, self.flicker_remaining - TICK_DURATION);

        match self.kind {
            EnemyKind::Patrol | EnemyKind::FloatingPatrol => self.update_patrol(),
            EnemyKind::Stationary => {}
        }
    }

    /// Walk in the current direction, then turn around for the next tick if
    /// a patrol bound was crossed or the leading side is blocked. The turn
    /// takes effect one tick after the bound, so overshoot is at most one
    /// tick's movement.
    fn update_patrol(&mut self) {
        self.body.velocity.x = if self.direction > 0 {
            self.speed
        } else {
            -self.speed
        };

        let dist = self.body.position.x - self.anchor_x;
        if dist > self.patrol_range || self.body.blocked.right {
            self.direction = -1;
        } else if dist < -self.patrol_range || self.body.blocked.left {
            self.direction = 1;
        }
    }

    /// Apply damage, clamped at zero. Returns true when this hit was fatal;
    /// the caller must remove the enemy immediately, so a dead instance can
    /// never receive another hit. The fatal hit pushes the death event
    /// carrying the score value.
    pub fn take_damage(
        &mut self,
        amount: u32,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.flicker_remaining = Self::DAMAGE_FLICKER;

        if self.health == 0 {
            events.push(GameEvent::enemy_died(
                tick,
                self.id,
                self.score_value,
                self.body.position,
            ));
            return true;
        }
        false
    }

    /// Hit-flicker visibility cue for the renderer.
    pub fn is_visible(&self) -> bool {
        if self.flicker_remaining <= 0 {
            return true;
        }
        let elapsed = Self::DAMAGE_FLICKER - self.flicker_remaining;
        (elapsed / Self::FLICKER_INTERVAL) % 2 == 0
    }
}
