//! Input Capture and Normalization
//!
//! Handles player input with deterministic normalization.
//! A frame is a packed bitfield of held buttons; press/release edges are
//! derived by comparing consecutive frames, never sampled from a device.

use serde::{Serialize, Deserialize};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Raw input state for a single frame.
///
/// Flags are *held* states, not edges. The simulation derives press and
/// release transitions itself (see [`InputSample`]), which keeps replays
/// exact no matter how the host polls its devices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct InputFrame {
    /// Held-button flags (packed bits):
    /// - Bit 0: Left
    /// - Bit 1: Right
    /// - Bit 2: Down
    /// - Bit 3: Jump
    /// - Bit 4: Fire
    /// - Bit 5-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Size in bytes
    pub const SIZE: usize = 1;

    /// Left flag bit
    pub const FLAG_LEFT: u8 = 0x01;

    /// Right flag bit
    pub const FLAG_RIGHT: u8 = 0x02;

    /// Down flag bit
    pub const FLAG_DOWN: u8 = 0x04;

    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x08;

    /// Fire flag bit
    pub const FLAG_FIRE: u8 = 0x10;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if left is held.
    #[inline]
    pub fn left(&self) -> bool {
        self.flags & Self::FLAG_LEFT != 0
    }

    /// Check if right is held.
    #[inline]
    pub fn right(&self) -> bool {
        self.flags & Self::FLAG_RIGHT != 0
    }

    /// Check if down is held.
    #[inline]
    pub fn down(&self) -> bool {
        self.flags & Self::FLAG_DOWN != 0
    }

    /// Check if jump is held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Check if fire is held.
    #[inline]
    pub fn fire(&self) -> bool {
        self.flags & Self::FLAG_FIRE != 0
    }

    /// Horizontal direction as -1, 0, or +1. Left wins when both are held.
    #[inline]
    pub fn move_x(&self) -> i32 {
        if self.left() {
            -1
        } else if self.right() {
            1
        } else {
            0
        }
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    /// Set left flag.
    #[inline]
    pub fn set_left(&mut self, held: bool) {
        self.set(Self::FLAG_LEFT, held);
    }

    /// Set right flag.
    #[inline]
    pub fn set_right(&mut self, held: bool) {
        self.set(Self::FLAG_RIGHT, held);
    }

    /// Set down flag.
    #[inline]
    pub fn set_down(&mut self, held: bool) {
        self.set(Self::FLAG_DOWN, held);
    }

    /// Set jump flag.
    #[inline]
    pub fn set_jump(&mut self, held: bool) {
        self.set(Self::FLAG_JUMP, held);
    }

    /// Set fire flag.
    #[inline]
    pub fn set_fire(&mut self, held: bool) {
        self.set(Self::FLAG_FIRE, held);
    }

    #[inline]
    fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// One frame of input with edges resolved against the previous frame.
///
/// Jump initiation and charge release both key off transitions, so the
/// orchestrator builds one of these per tick before updating the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSample {
    /// Held-button state this tick
    pub held: InputFrame,
    /// Jump transitioned from released to held
    pub jump_pressed: bool,
    /// Jump transitioned from held to released
    pub jump_released: bool,
    /// Fire transitioned from released to held
    pub fire_pressed: bool,
    /// Fire transitioned from held to released
    pub fire_released: bool,
}

impl InputSample {
    /// Resolve edges between the previous tick's frame and this tick's.
    pub fn between(prev: InputFrame, now: InputFrame) -> Self {
        Self {
            held: now,
            jump_pressed: now.jump() && !prev.jump(),
            jump_released: !now.jump() && prev.jump(),
            fire_pressed: now.fire() && !prev.fire(),
            fire_released: !now.fire() && prev.fire(),
        }
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Complete input recording for one run of a level.
///
/// Used for:
/// - Replay playback
/// - Determinism checks (same recording, same end state)
/// - Bug reproduction
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// Starting tick (usually 0)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Delta-compressed input data.
    /// Only stores ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Create a new empty recording.
    pub fn new() -> Self {
        Self {
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from the previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get input at a specific tick.
    ///
    /// Uses binary search for efficiency.
    pub fn frame_at(&self, tick: u32) -> InputFrame {
        if self.deltas.is_empty() {
            return InputFrame::new();
        }

        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            // Before first delta - idle
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Create iterator over all inputs for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.recording.end_tick {
            return None;
        }

        while self.delta_idx < self.recording.deltas.len() {
            let delta = &self.recording.deltas[self.delta_idx];
            if delta.tick <= self.current_tick {
                self.current_frame = delta.frame;
                self.delta_idx += 1;
            } else {
                break;
            }
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_frame_flags() {
        let mut frame = InputFrame::new();
        assert!(frame.is_idle());
        assert!(!frame.jump());
        assert!(!frame.fire());

        frame.set_jump(true);
        assert!(frame.jump());
        assert!(!frame.fire());

        frame.set_fire(true);
        assert!(frame.jump());
        assert!(frame.fire());

        frame.set_jump(false);
        assert!(!frame.jump());
        assert!(frame.fire());
    }

    #[test]
    fn test_move_x_left_priority() {
        let mut frame = InputFrame::new();
        assert_eq!(frame.move_x(), 0);

        frame.set_right(true);
        assert_eq!(frame.move_x(), 1);

        frame.set_left(true);
        assert_eq!(frame.move_x(), -1);

        frame.set_left(false);
        assert_eq!(frame.move_x(), 1);
    }

    #[test]
    fn test_sample_edges() {
        let mut prev = InputFrame::new();
        let mut now = InputFrame::new();
        now.set_jump(true);

        let sample = InputSample::between(prev, now);
        assert!(sample.jump_pressed);
        assert!(!sample.jump_released);

        // Held across both frames: no edge
        prev.set_jump(true);
        let sample = InputSample::between(prev, now);
        assert!(!sample.jump_pressed);
        assert!(!sample.jump_released);

        // Released this frame
        now.set_jump(false);
        let sample = InputSample::between(prev, now);
        assert!(!sample.jump_pressed);
        assert!(sample.jump_released);
    }

    #[test]
    fn test_fire_edges() {
        let mut held = InputFrame::new();
        held.set_fire(true);

        let press = InputSample::between(InputFrame::new(), held);
        assert!(press.fire_pressed);
        assert!(!press.fire_released);

        let release = InputSample::between(held, InputFrame::new());
        assert!(!release.fire_pressed);
        assert!(release.fire_released);
    }

    #[test]
    fn test_recording_delta_compression() {
        let mut recording = InputRecording::new();

        let mut frame = InputFrame::new();
        frame.set_right(true);

        // Record same input multiple times
        recording.record(0, frame);
        recording.record(1, frame);
        recording.record(2, frame);
        recording.record(3, frame);

        // Should only have 1 delta (input didn't change)
        assert_eq!(recording.delta_count(), 1);

        // Change input
        frame.set_jump(true);
        recording.record(4, frame);

        assert_eq!(recording.delta_count(), 2);
    }

    #[test]
    fn test_recording_frame_at() {
        let mut recording = InputRecording::new();

        let mut frame1 = InputFrame::new();
        frame1.set_right(true);
        let mut frame2 = InputFrame::new();
        frame2.set_left(true);

        recording.record(10, frame1);
        recording.record(20, frame2);

        // Before first delta
        assert!(recording.frame_at(5).is_idle());

        // At and between deltas
        assert_eq!(recording.frame_at(10), frame1);
        assert_eq!(recording.frame_at(15), frame1);
        assert_eq!(recording.frame_at(20), frame2);
        assert_eq!(recording.frame_at(100), frame2);
    }

    #[test]
    fn test_replay_iterator() {
        let mut recording = InputRecording::new();

        let mut frame1 = InputFrame::new();
        frame1.set_right(true);
        let mut frame2 = InputFrame::new();
        frame2.set_left(true);

        recording.record(0, frame1);
        recording.record(3, frame2);
        recording.end_tick = 5;

        let frames: Vec<_> = recording.replay_iter().collect();

        assert_eq!(frames.len(), 6); // Ticks 0-5
        assert!(frames[0].1.right());
        assert!(frames[2].1.right());
        assert!(frames[3].1.left());
        assert!(frames[5].1.left());
    }
}
