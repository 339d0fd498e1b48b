//! # Batoman Gameplay Core
//!
//! Deterministic gameplay simulation for Batoman, a 2D side-scrolling
//! action platformer. The crate owns the rules of the game; a host
//! (renderer, engine, headless harness) owns presentation, device input,
//! and movement integration if it brings its own physics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BATOMAN GAMEPLAY CORE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  └── vec2.rs      - 2D vector with fixed-point               │
//! │                                                              │
//! │  game/            - Game logic (deterministic)               │
//! │  ├── input.rs     - Input frames and replay recording        │
//! │  ├── level.rs     - Tilemap assembly into level geometry     │
//! │  ├── physics.rs   - Bodies, contacts, the provider seam      │
//! │  ├── arcade.rs    - Reference AABB physics provider          │
//! │  ├── player.rs    - Player controller                        │
//! │  ├── enemy.rs     - Enemy behaviors                          │
//! │  ├── projectile.rs- Player shots                             │
//! │  ├── checkpoint.rs- Respawn-point tracking                   │
//! │  ├── state.rs     - Level run state and snapshots            │
//! │  └── tick.rs      - Authoritative simulation loop            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in game logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//!
//! Given the same level data and the same input recording, the simulation
//! produces **identical state snapshots** on any platform, which is what
//! replays and the determinism tests rely on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use game::input::{InputFrame, InputRecording};
pub use game::level::{AssembledLevel, LevelConfig, LevelError};
pub use game::physics::{Contact, PhysicsProvider};
pub use game::state::{LevelState, LevelPhase};
pub use game::tick::{tick, TickConfig, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
