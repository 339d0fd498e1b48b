//! Player Controller
//!
//! Movement, jumping, and the charge weapon for the player avatar. The
//! authoritative state is numeric (health, lives, score, a handful of
//! timers); the animation mode is a view derived from it every tick, never
//! stored. All timers count down in fixed-point seconds, one tick at a time.
//!
//! The controller only ever reports what happened (events pushed into the
//! orchestrator's queue, a projectile spawn request returned from `update`);
//! it never touches enemies, the score ledger of the HUD, or the checkpoint
//! tracker.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, TICK_DURATION, fixed_abs, fixed_max, fixed_mul};
use crate::core::vec2::FixedVec2;
use crate::game::events::GameEvent;
use crate::game::input::InputSample;
use crate::game::physics::Body;
use crate::game::projectile::{ProjectileKind, ProjectileSpawn};

/// Horizontal orientation, drives muzzle side and sprite flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Facing left (negative x)
    Left,
    /// Facing right (positive x)
    Right,
}

/// Animation-relevant mode, recomputed from authoritative state on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerMode {
    /// Standing still on the ground
    Idle,
    /// Slow horizontal movement
    Walk,
    /// Fast horizontal movement
    Run,
    /// Airborne, ascending
    Jump,
    /// Airborne, descending
    Fall,
    /// Shot pose, holds until its timer runs out
    Shoot,
    /// Charge loop while the fire button accumulates past half threshold
    Charge,
    /// Hurt-stun window after taking a hit
    Hurt,
    /// Health reached zero
    Dead,
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// The player's complete gameplay state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Movable body (60x100 hitbox, 60x60 while sliding)
    pub body: Body,
    /// Current health, always in `0..=max_health`
    pub health: u32,
    /// Health ceiling
    pub max_health: u32,
    /// Respawn attempts remaining
    pub lives: u32,
    /// Accumulated score
    pub score: u32,
    /// Horizontal orientation
    pub facing: Facing,
    /// Slide pose active (shrunk hitbox, boosted run speed)
    pub sliding: bool,
    /// Grace window for jumping after walking off a ledge
    pub coyote_remaining: Fixed,
    /// How long fire has been held this charge
    pub charge_held: Fixed,
    /// Fire is held and accumulating charge
    pub charging: bool,
    /// Burst-rate lockout after a shot
    pub cooldown_remaining: Fixed,
    /// Hurt-stun window; movement and firing are ignored while positive
    pub stun_remaining: Fixed,
    /// Shot pose hold
    pub shoot_pose_remaining: Fixed,
}

impl PlayerState {
    /// Health at spawn and after every respawn.
    pub const MAX_HEALTH: u32 = 3;

    /// Lives at level start.
    pub const STARTING_LIVES: u32 = 3;

    /// Ground speed while steering.
    pub const RUN_SPEED: Fixed = 14417920; // 220.0 * 65536

    /// Ground speed while sliding (1.5x run).
    pub const SLIDE_SPEED: Fixed = 21626880; // 330.0 * 65536

    /// Velocity multiplier per tick with no horizontal input.
    pub const DECAY_FACTOR: Fixed = 49152; // 0.75 * 65536

    /// Speed below which idle decay snaps to zero.
    pub const SNAP_EPSILON: Fixed = 327680; // 5.0 * 65536

    /// Jump impulse (upwards, so negative y).
    pub const JUMP_VELOCITY: Fixed = -38010880; // -580.0 * 65536

    /// Ascent speed an early jump release cuts down to.
    pub const JUMP_CUT_VELOCITY: Fixed = -13107200; // -200.0 * 65536

    /// Grace window after leaving the ground.
    pub const COYOTE_BUDGET: Fixed = 6554; // 0.1 * 65536

    /// Hold duration at which a release fires heavy instead of light.
    pub const CHARGE_THRESHOLD: Fixed = 52429; // 0.8 * 65536

    /// Lockout between burst shots.
    pub const BURST_COOLDOWN: Fixed = 13107; // 0.2 * 65536

    /// Hurt-stun duration after a hit.
    pub const HURT_STUN: Fixed = 41943; // 0.64 * 65536

    /// Visibility toggle period inside the hurt flicker.
    pub const FLICKER_INTERVAL: Fixed = 5243; // 0.08 * 65536

    /// How long the shot pose holds.
    pub const SHOOT_POSE: Fixed = 19661; // 0.3 * 65536

    /// Wall-kick horizontal impulse, directed away from the wall.
    pub const WALL_KICK_SPEED: Fixed = 15728640; // 240.0 * 65536

    /// Wall-kick vertical impulse.
    pub const WALL_KICK_LIFT: Fixed = -30146560; // -460.0 * 65536

    /// Standing hitbox width.
    pub const HITBOX_WIDTH: Fixed = 3932160; // 60.0 * 65536

    /// Standing hitbox height.
    pub const HITBOX_HEIGHT: Fixed = 6553600; // 100.0 * 65536

    /// Hitbox height while sliding.
    pub const SLIDE_HITBOX_HEIGHT: Fixed = 3932160; // 60.0 * 65536

    /// Muzzle offset from the body center, in the facing direction.
    pub const MUZZLE_OFFSET: Fixed = 1310720; // 20.0 * 65536

    /// Grounded speed above which the mode is Run.
    pub const RUN_THRESHOLD: Fixed = 3932160; // 60.0 * 65536

    /// Grounded speed above which the mode is Walk.
    pub const WALK_THRESHOLD: Fixed = 327680; // 5.0 * 65536

    /// Fresh player at the given position with full health and lives.
    pub fn new(position: FixedVec2) -> Self {
        Self {
            body: Body::new(
                position,
                FixedVec2::new(Self::HITBOX_WIDTH, Self::HITBOX_HEIGHT),
            ),
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            lives: Self::STARTING_LIVES,
            score: 0,
            facing: Facing::Right,
            sliding: false,
            coyote_remaining: 0,
            charge_held: 0,
            charging: false,
            cooldown_remaining: 0,
            stun_remaining: 0,
            shoot_pose_remaining: 0,
        }
    }

    // =========================================================================
    // PER-TICK UPDATE
    // =========================================================================

    /// Advance the controller by one tick: timers, steering, jumping, and
    /// the charge weapon, in that order. Returns a projectile spawn request
    /// when a shot resolved this tick.
    pub fn update(&mut self, sample: &InputSample) -> Option<ProjectileSpawn> {
        self.stun_remaining = fixed_max(0, self.stun_remaining - TICK_DURATION);
        self.cooldown_remaining = fixed_max(0, self.cooldown_remaining - TICK_DURATION);
        self.shoot_pose_remaining = fixed_max(0, self.shoot_pose_remaining - TICK_DURATION);

        let stunned = self.stun_remaining > 0;
        self.update_movement(sample, stunned);
        self.update_jump(sample, stunned);
        self.update_fire(sample, stunned)
    }

    fn update_movement(&mut self, sample: &InputSample, stunned: bool) {
        let grounded = self.body.blocked.down;
        let dir = if stunned { 0 } else { sample.held.move_x() };

        if dir != 0 {
            self.facing = if dir < 0 { Facing::Left } else { Facing::Right };

            // Down held together with a direction on the ground starts a slide
            if grounded && sample.held.down() && !self.sliding {
                self.enter_slide();
            }

            let speed = if self.sliding {
                Self::SLIDE_SPEED
            } else {
                Self::RUN_SPEED
            };
            self.body.velocity.x = if dir < 0 { -speed } else { speed };
        } else {
            self.body.velocity.x = fixed_mul(self.body.velocity.x, Self::DECAY_FACTOR);
            if fixed_abs(self.body.velocity.x) < Self::SNAP_EPSILON {
                self.body.velocity.x = 0;
            }
        }

        // Releasing down or leaving the ground reverts the slide pose
        if self.sliding && (!grounded || !sample.held.down()) {
            self.exit_slide();
        }
    }

    /// Shrink the hitbox around the feet so the slide fits under low gaps.
    fn enter_slide(&mut self) {
        self.sliding = true;
        self.body.size.y = Self::SLIDE_HITBOX_HEIGHT;
        self.body.position.y += (Self::HITBOX_HEIGHT - Self::SLIDE_HITBOX_HEIGHT) / 2;
    }

    fn exit_slide(&mut self) {
        self.sliding = false;
        self.body.size.y = Self::HITBOX_HEIGHT;
        self.body.position.y -= (Self::HITBOX_HEIGHT - Self::SLIDE_HITBOX_HEIGHT) / 2;
    }

    fn update_jump(&mut self, sample: &InputSample, stunned: bool) {
        let grounded = self.body.blocked.down;

        if grounded {
            self.coyote_remaining = Self::COYOTE_BUDGET;
        } else {
            self.coyote_remaining = fixed_max(0, self.coyote_remaining - TICK_DURATION);
        }

        if sample.jump_pressed && !stunned {
            if self.coyote_remaining > 0 {
                self.body.velocity.y = Self::JUMP_VELOCITY;
                self.coyote_remaining = 0;
            } else if self.body.blocked.left && sample.held.left() {
                // Airborne, pressed against a wall: kick away from it
                self.body.velocity.x = Self::WALL_KICK_SPEED;
                self.body.velocity.y = Self::WALL_KICK_LIFT;
            } else if self.body.blocked.right && sample.held.right() {
                self.body.velocity.x = -Self::WALL_KICK_SPEED;
                self.body.velocity.y = Self::WALL_KICK_LIFT;
            }
        }

        // Variable jump height: an early release cuts the ascent. This is
        // not a jump initiation, so the stun gate does not apply.
        if sample.jump_released && self.body.velocity.y < Self::JUMP_CUT_VELOCITY {
            self.body.velocity.y = Self::JUMP_CUT_VELOCITY;
        }
    }

    fn update_fire(&mut self, sample: &InputSample, stunned: bool) -> Option<ProjectileSpawn> {
        if stunned {
            return None;
        }

        if sample.fire_pressed {
            self.charging = true;
            self.charge_held = 0;
        }

        if self.charging && sample.held.fire() {
            self.charge_held += TICK_DURATION;
        }

        if sample.fire_released && self.charging {
            self.charging = false;
            let heavy = self.charge_held >= Self::CHARGE_THRESHOLD;
            self.charge_held = 0;

            // A burst release during the lockout fizzles entirely: no shot,
            // no pose, no cooldown reset. A full charge is never locked out.
            if !heavy && self.cooldown_remaining > 0 {
                return None;
            }

            self.cooldown_remaining = Self::BURST_COOLDOWN;
            self.shoot_pose_remaining = Self::SHOOT_POSE;

            let offset = match self.facing {
                Facing::Right => Self::MUZZLE_OFFSET,
                Facing::Left => -Self::MUZZLE_OFFSET,
            };
            return Some(ProjectileSpawn {
                kind: if heavy {
                    ProjectileKind::Nova
                } else {
                    ProjectileKind::Burst
                },
                position: FixedVec2::new(self.body.position.x + offset, self.body.position.y),
                facing: self.facing,
            });
        }

        None
    }

    // =========================================================================
    // DAMAGE / DEATH / RESPAWN
    // =========================================================================

    /// Apply damage. A no-op while hurt-stunned or already at zero health;
    /// otherwise clamps at zero, starts the stun window (abandoning any
    /// charge in progress), and on the zero transition decrements lives
    /// exactly once and reports the death.
    pub fn take_damage(&mut self, amount: u32, tick: u32, events: &mut Vec<GameEvent>) {
        if self.stun_remaining > 0 || self.health == 0 {
            return;
        }

        self.health = self.health.saturating_sub(amount);
        self.stun_remaining = Self::HURT_STUN;
        self.charging = false;
        self.charge_held = 0;

        events.push(GameEvent::health_changed(tick, self.health, self.max_health));

        if self.health == 0 {
            self.lives = self.lives.saturating_sub(1);
            events.push(GameEvent::lives_changed(tick, self.lives));
            events.push(GameEvent::player_died(tick, self.lives));
        }
    }

    /// Kill outright, ignoring the stun gate. Death zones and instant-death
    /// hazards use this path. Still a no-op at zero health, so lives never
    /// drop twice for one death.
    pub fn kill(&mut self, tick: u32, events: &mut Vec<GameEvent>) {
        if self.health == 0 {
            return;
        }

        self.health = 0;
        self.charging = false;
        self.charge_held = 0;

        events.push(GameEvent::health_changed(tick, 0, self.max_health));
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::lives_changed(tick, self.lives));
        events.push(GameEvent::player_died(tick, self.lives));
    }

    /// Bring the player back at the given position with full health, all
    /// timers cleared, and the body at rest. The only way health is ever
    /// restored; called by the orchestrator, never internally.
    pub fn respawn(&mut self, position: FixedVec2, tick: u32, events: &mut Vec<GameEvent>) {
        self.health = self.max_health;
        self.stun_remaining = 0;
        self.charging = false;
        self.charge_held = 0;
        self.cooldown_remaining = 0;
        self.shoot_pose_remaining = 0;
        self.coyote_remaining = 0;
        self.sliding = false;
        self.body.size = FixedVec2::new(Self::HITBOX_WIDTH, Self::HITBOX_HEIGHT);
        self.body.position = position;
        self.body.velocity = FixedVec2::ZERO;
        self.body.blocked.clear();

        events.push(GameEvent::player_respawned(tick, position));
        events.push(GameEvent::health_changed(tick, self.health, self.max_health));
    }

    /// Credit score (saturating) and report the new total.
    pub fn add_score(&mut self, amount: u32, tick: u32, events: &mut Vec<GameEvent>) {
        self.score = self.score.saturating_add(amount);
        events.push(GameEvent::score_changed(tick, self.score));
    }

    // =========================================================================
    // DERIVED VIEWS
    // =========================================================================

    /// The animation mode this state reads as. Priority: dead, hurt, shot
    /// pose, charge loop (past half threshold), airborne by vertical
    /// velocity sign, then grounded by horizontal speed.
    pub fn mode(&self) -> PlayerMode {
        if self.health == 0 {
            return PlayerMode::Dead;
        }
        if self.stun_remaining > 0 {
            return PlayerMode::Hurt;
        }
        if self.shoot_pose_remaining > 0 {
            return PlayerMode::Shoot;
        }
        if self.charging && self.charge_held >= Self::CHARGE_THRESHOLD / 2 {
            return PlayerMode::Charge;
        }
        if !self.body.blocked.down {
            return if self.body.velocity.y < 0 {
                PlayerMode::Jump
            } else {
                PlayerMode::Fall
            };
        }

        let speed = fixed_abs(self.body.velocity.x);
        if speed > Self::RUN_THRESHOLD {
            PlayerMode::Run
        } else if speed > Self::WALK_THRESHOLD {
            PlayerMode::Walk
        } else {
            PlayerMode::Idle
        }
    }

    /// Hurt-flicker visibility cue for the renderer.
    pub fn is_visible(&self) -> bool {
        if self.stun_remaining <= 0 {
            return true;
        }
        let elapsed = Self::HURT_STUN - self.stun_remaining;
        (elapsed / Self::FLICKER_INTERVAL) % 2 == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
