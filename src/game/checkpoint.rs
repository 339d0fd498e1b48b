//! Checkpoint Tracking
//!
//! Remembers the last distinct checkpoint the player touched. Adoption is
//! keyed on the x coordinate alone: a region whose x differs from the stored
//! one replaces it (so revisiting an earlier checkpoint moves the respawn
//! anchor back there), while re-overlapping the same checkpoint tick after
//! tick stays a no-op and fires no duplicate cue.
//!
//! Two checkpoints sharing an x at different heights would not re-trigger
//! each other. Authored levels never stack checkpoints vertically, so the
//! comparison key is kept as-is rather than widened.

use serde::{Serialize, Deserialize};

use crate::core::vec2::FixedVec2;

/// Per-level respawn progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointTracker {
    level_start: FixedVec2,
    active: Option<FixedVec2>,
}

impl CheckpointTracker {
    /// Fresh tracker anchored at the level start position.
    pub fn new(level_start: FixedVec2) -> Self {
        Self {
            level_start,
            active: None,
        }
    }

    /// Offer a checkpoint position. Adopted unless its x matches the stored
    /// checkpoint's x; returns whether it was adopted, so the caller can
    /// announce it exactly once.
    pub fn activate(&mut self, position: FixedVec2) -> bool {
        if self.active.map(|p| p.x) == Some(position.x) {
            return false;
        }
        self.active = Some(position);
        true
    }

    /// Where the player comes back after losing a life: the active
    /// checkpoint, or the level start if none has been touched.
    pub fn spawn_point(&self) -> FixedVec2 {
        self.active.unwrap_or(self.level_start)
    }

    /// The active checkpoint, if any has been touched.
    pub fn active(&self) -> Option<FixedVec2> {
        self.active
    }

    /// Forget all progress (level restart).
    pub fn reset(&mut self) {
        self.active = None;
    }
}
