//! Projectiles
//!
//! Player shots: a fast light `Burst` from a normal trigger release and a
//! slow heavy `Nova` from a fully charged one. Projectiles fly level (no
//! gravity), die on the first thing they hit, and are culled once they
//! leave the world horizontally.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;
use crate::game::physics::Body;
use crate::game::player::Facing;
use crate::game::state::ProjectileId;

/// The two shot types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Standard shot: fast, 1 damage
    Burst,
    /// Charged shot: slower, wider, 3 damage
    Nova,
}

impl ProjectileKind {
    /// Horizontal speed in fixed-point pixels per second.
    pub const fn speed(self) -> Fixed {
        match self {
            Self::Burst => 39321600,  // 600.0 * 65536
            Self::Nova => 24903680,   // 380.0 * 65536
        }
    }

    /// Damage dealt on enemy impact.
    pub const fn damage(self) -> u32 {
        match self {
            Self::Burst => 1,
            Self::Nova => 3,
        }
    }

    /// Body width and height in pixels.
    pub fn extent(self) -> FixedVec2 {
        match self {
            Self::Burst => FixedVec2::from_ints(16, 8),
            Self::Nova => FixedVec2::from_ints(24, 12),
        }
    }
}

/// A shot request produced by the player state machine, turned into a live
/// projectile by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectileSpawn {
    /// Shot type
    pub kind: ProjectileKind,
    /// Muzzle position (projectile body center)
    pub position: FixedVec2,
    /// Travel direction
    pub facing: Facing,
}

/// One live projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Stable identifier, also the entity-map key
    pub id: ProjectileId,
    /// Shot type
    pub kind: ProjectileKind,
    /// Movable body; gravity stays off for the projectile's whole life
    pub body: Body,
}

impl ProjectileState {
    /// Build a live projectile from a spawn request.
    pub fn new(id: ProjectileId, spawn: ProjectileSpawn) -> Self {
        let speed = spawn.kind.speed();
        let vx = match spawn.facing {
            Facing::Right => speed,
            Facing::Left => -speed,
        };

        let mut body = Body::new(spawn.position, spawn.kind.extent());
        body.gravity_enabled = false;
        body.velocity = FixedVec2::new(vx, 0);

        Self {
            id,
            kind: spawn.kind,
            body,
        }
    }

    /// Whether the projectile has left the world horizontally by more than
    /// the cull margin and should be despawned.
    pub fn is_out_of_bounds(&self, world_width: Fixed, margin: Fixed) -> bool {
        self.body.position.x < -margin || self.body.position.x > world_width + margin
    }

    /// Damage this projectile deals on impact.
    pub fn damage(&self) -> u32 {
        self.kind.damage()
    }
}
