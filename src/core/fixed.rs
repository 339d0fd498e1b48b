//! Q16.16 Fixed-Point Arithmetic
//!
//! This module provides deterministic fixed-point math for game simulation.
//! All operations use integer arithmetic only - no floats in gameplay logic.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Q16.16?
//!
//! - 32k unit range covers any side-scrolling level in pixels
//! - Sub-pixel precision for velocities and timers
//! - Fast integer ops on all platforms
//! - Identical results everywhere, so replays and snapshots line up

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// Maximum positive value
pub const FIXED_MAX: Fixed = i32::MAX;

/// Minimum negative value
pub const FIXED_MIN: Fixed = i32::MIN;

// =============================================================================
// WORLD CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================
//
// Units are pixels and seconds. The y axis points down, so gravity is
// positive and a jump impulse is negative.

/// Tick duration: 1/60 second = round(65536/60) = 1092
pub const TICK_DURATION: Fixed = 1092;

/// Gravity acceleration: 800.0 px/s² = 800 * 65536 = 52428800
pub const GRAVITY: Fixed = 52428800;

/// Terminal fall speed: 800.0 px/s = 800 * 65536 = 52428800
pub const MAX_FALL_SPEED: Fixed = 52428800;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use batoman_core::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Convert an integer (pixel) value to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Convert fixed-point to an integer, flooring toward negative infinity.
///
/// Arithmetic shift keeps tile-grid lookups consistent for negative
/// coordinates (-0.5 lands in cell -1, not cell 0).
#[inline]
pub const fn to_int(f: Fixed) -> i32 {
    f >> FIXED_SCALE
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
///
/// # Determinism
/// - Uses wrapping arithmetic
/// - Truncates toward zero (Rust default for integer division)
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    // Widen to i64, multiply, shift back
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero.
///
/// # Determinism
/// - Uses wrapping arithmetic
/// - Truncates toward zero
/// - Divide-by-zero returns 0 (not panic)
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0; // Deterministic: don't panic
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

// =============================================================================
// TESTS
// =============================================================================
