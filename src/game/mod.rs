//! Game Logic Module
//!
//! All gameplay simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `input`: Input frames, edge derivation, replay recording
//! - `level`: Tilemap assembly into geometry and spawn descriptors
//! - `physics`: Body data, contact reporting, the provider seam
//! - `arcade`: Reference AABB physics provider
//! - `player`: Player controller (run, jump, dash, charge weapon)
//! - `enemy`: Enemy behaviors and damage
//! - `projectile`: Player shots
//! - `checkpoint`: Respawn-point tracking
//! - `state`: Level run state, entity maps, snapshots
//! - `tick`: Authoritative simulation loop
//! - `events`: Outbound game events for the presentation layer

pub mod input;
pub mod events;
pub mod physics;
pub mod arcade;
pub mod level;
pub mod checkpoint;
pub mod player;
pub mod enemy;
pub mod projectile;
pub mod state;
pub mod tick;

// Re-export key types
pub use input::{InputFrame, InputSample, InputRecording};
pub use level::{AssembledLevel, LevelConfig, LevelError};
pub use physics::{Body, Contact, PhysicsProvider};
pub use arcade::ArcadePhysics;
pub use state::{LevelState, LevelPhase, EnemyId, ProjectileId};
pub use tick::{tick, TickConfig, TickResult};
pub use events::GameEvent;
