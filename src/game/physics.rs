//! Physics Contract
//!
//! The simulation does not own movement integration. It publishes intent
//! through plain [`Body`] data (position, velocity, tuning flags), a physics
//! provider moves the bodies and reports what touched what, and the
//! orchestrator resolves those [`Contact`]s into gameplay. The in-crate
//! reference provider lives in [`crate::game::arcade`]; a host engine can
//! substitute its own by implementing [`PhysicsProvider`].
//!
//! Coordinates are y-down: gravity is positive y, jumps are negative y.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, MAX_FALL_SPEED};
use crate::core::vec2::FixedVec2;
use crate::game::state::{EnemyId, LevelState, ProjectileId};

// =============================================================================
// BODIES
// =============================================================================

/// Which sides of a body touched solid geometry during the last physics step.
///
/// Written by the provider, read by gameplay logic (grounding, wall-kicks,
/// projectile impact).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedFlags {
    /// Touching ground
    pub down: bool,
    /// Touching a ceiling
    pub up: bool,
    /// Touching a wall on the left
    pub left: bool,
    /// Touching a wall on the right
    pub right: bool,
}

impl BlockedFlags {
    /// True if any side is blocked.
    pub fn any(&self) -> bool {
        self.down || self.up || self.left || self.right
    }

    /// Reset all sides to unblocked.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A movable axis-aligned box in the simulation.
///
/// `position` is the body center; `size` is the full width and height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center position in fixed-point pixels
    pub position: FixedVec2,
    /// Velocity in fixed-point pixels per second
    pub velocity: FixedVec2,
    /// Full width and height in fixed-point pixels
    pub size: FixedVec2,
    /// Whether the provider applies gravity to this body
    pub gravity_enabled: bool,
    /// Terminal downward speed in fixed-point pixels per second
    pub max_fall_speed: Fixed,
    /// Solid-geometry touch state from the last physics step
    pub blocked: BlockedFlags,
}

impl Body {
    /// A body at rest with gravity on and the world default terminal speed.
    pub fn new(position: FixedVec2, size: FixedVec2) -> Self {
        Self {
            position,
            velocity: FixedVec2::ZERO,
            size,
            gravity_enabled: true,
            max_fall_speed: MAX_FALL_SPEED,
            blocked: BlockedFlags::default(),
        }
    }

    /// Left edge.
    pub fn left(&self) -> Fixed {
        self.position.x - self.size.x / 2
    }

    /// Right edge.
    pub fn right(&self) -> Fixed {
        self.position.x + self.size.x / 2
    }

    /// Top edge (smaller y).
    pub fn top(&self) -> Fixed {
        self.position.y - self.size.y / 2
    }

    /// Bottom edge (larger y).
    pub fn bottom(&self) -> Fixed {
        self.position.y + self.size.y / 2
    }

    /// Whether this body's box overlaps another's. Touching edges do not
    /// count as overlap.
    pub fn overlaps(&self, other: &Body) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Whether this body's box overlaps an arbitrary rectangle given by
    /// top-left corner and extent.
    pub fn overlaps_rect(&self, top_left: FixedVec2, extent: FixedVec2) -> bool {
        self.left() < top_left.x + extent.x
            && self.right() > top_left.x
            && self.top() < top_left.y + extent.y
            && self.bottom() > top_left.y
    }
}

// =============================================================================
// CONTACTS
// =============================================================================

/// One overlap observed by the physics provider during a step.
///
/// Contacts are facts, not outcomes: the provider never applies damage or
/// removes entities. The orchestrator resolves them in the order the
/// provider emitted them, which must be deterministic (entity-id order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// Player body touched an enemy body
    PlayerEnemy {
        /// The enemy touched
        enemy: EnemyId,
    },
    /// A player projectile touched an enemy body
    ProjectileEnemy {
        /// The projectile involved
        projectile: ProjectileId,
        /// The enemy hit
        enemy: EnemyId,
    },
    /// A projectile hit solid geometry
    ProjectileGeometry {
        /// The projectile that impacted
        projectile: ProjectileId,
    },
    /// Player body touched a hazard tile
    PlayerHazard {
        /// True for instant-death hazards, which ignore the hurt-stun gate
        lethal: bool,
    },
    /// Player body entered a checkpoint trigger region
    PlayerCheckpoint {
        /// Respawn anchor the region carries
        position: FixedVec2,
    },
    /// Player body entered a death-zone trigger region
    PlayerDeathZone,
}

/// Seam between the simulation and whatever integrates movement.
///
/// A step must: apply gravity to gravity-enabled bodies, integrate
/// velocities over one tick, stop bodies against solid geometry and world
/// bounds (setting [`BlockedFlags`]), and report overlaps as [`Contact`]s
/// without resolving them. Given equal state, a step must produce equal
/// results.
pub trait PhysicsProvider {
    /// Advance all bodies by one tick and report overlaps.
    fn step(&mut self, state: &mut LevelState) -> Vec<Contact>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::from_int;

    fn body_at(x: i32, y: i32, w: i32, h: i32) -> Body {
        Body::new(FixedVec2::from_ints(x, y), FixedVec2::from_ints(w, h))
    }

    #[test]
    fn test_body_edges() {
        let body = body_at(100, 200, 60, 100);
        assert_eq!(body.left(), from_int(70));
        assert_eq!(body.right(), from_int(130));
        assert_eq!(body.top(), from_int(150));
        assert_eq!(body.bottom(), from_int(250));
    }

    #[test]
    fn test_overlap_is_exclusive_at_edges() {
        let a = body_at(0, 0, 32, 32);
        let b = body_at(32, 0, 32, 32); // exactly touching on the right
        let c = body_at(31, 0, 32, 32); // one pixel of overlap

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_overlaps_rect_top_left_anchored() {
        let body = body_at(100, 100, 32, 32);

        // Region covering the body's center
        assert!(body.overlaps_rect(
            FixedVec2::from_ints(90, 90),
            FixedVec2::from_ints(20, 20)
        ));
        // Region ending exactly at the body's left edge
        assert!(!body.overlaps_rect(
            FixedVec2::from_ints(52, 90),
            FixedVec2::from_ints(32, 20)
        ));
    }

    #[test]
    fn test_blocked_flags_roundtrip() {
        let mut flags = BlockedFlags::default();
        assert!(!flags.any());

        flags.down = true;
        flags.left = true;
        assert!(flags.any());

        flags.clear();
        assert!(!flags.any());
    }

    #[test]
    fn test_new_body_defaults() {
        let body = body_at(0, 0, 16, 8);
        assert!(body.gravity_enabled);
        assert_eq!(body.velocity, FixedVec2::ZERO);
        assert_eq!(body.max_fall_speed, MAX_FALL_SPEED);
        assert!(!body.blocked.any());
    }
}
