//! Input capability consumed by the tick loop
//!
//! Hosts translate keyboard, touch or scripted events into the current
//! movement direction and sit flag. The recorder only reads the current
//! values; it never owns event wiring.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI8, Ordering};

/// Horizontal movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum MoveDirection {
    Left,
    #[default]
    Idle,
    Right,
}

impl MoveDirection {
    /// -1, 0 or 1
    pub fn as_i8(self) -> i8 {
        match self {
            MoveDirection::Left => -1,
            MoveDirection::Idle => 0,
            MoveDirection::Right => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }
}

impl TryFrom<i8> for MoveDirection {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(MoveDirection::Left),
            0 => Ok(MoveDirection::Idle),
            1 => Ok(MoveDirection::Right),
            other => Err(format!("move direction must be -1, 0 or 1, got {}", other)),
        }
    }
}

impl From<MoveDirection> for i8 {
    fn from(direction: MoveDirection) -> Self {
        direction.as_i8()
    }
}

/// Source of per-tick input
pub trait InputSource: Send {
    /// Current movement direction
    fn movement(&self) -> MoveDirection;

    /// Whether the sit action is held
    fn sit_pressed(&self) -> bool;

    /// Called once after a tick has consumed the current values
    fn advance(&mut self) {}
}

/// Input that never changes
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedInput {
    pub movement: MoveDirection,
    pub sit: bool,
}

impl FixedInput {
    pub fn new(movement: MoveDirection, sit: bool) -> Self {
        Self { movement, sit }
    }
}

impl InputSource for FixedInput {
    fn movement(&self) -> MoveDirection {
        self.movement
    }

    fn sit_pressed(&self) -> bool {
        self.sit
    }
}

/// Flags toggled by host event handlers
///
/// Key/touch down sets a flag; any release clears both, matching the
/// browser hosts.
#[derive(Debug, Default)]
pub struct InputFlags {
    movement: AtomicI8,
    sit: AtomicBool,
}

impl InputFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn press_movement(&self, direction: MoveDirection) {
        self.movement.store(direction.as_i8(), Ordering::Relaxed);
    }

    pub fn press_sit(&self) {
        self.sit.store(true, Ordering::Relaxed);
    }

    pub fn release(&self) {
        self.movement.store(0, Ordering::Relaxed);
        self.sit.store(false, Ordering::Relaxed);
    }
}

impl InputSource for Arc<InputFlags> {
    fn movement(&self) -> MoveDirection {
        MoveDirection::try_from(self.movement.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn sit_pressed(&self) -> bool {
        self.sit.load(Ordering::Relaxed)
    }
}

/// One scripted input state held for `repeat` ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    #[serde(rename = "move", default)]
    pub movement: MoveDirection,
    #[serde(default)]
    pub sit: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

impl InputFrame {
    pub fn new(movement: MoveDirection, sit: bool) -> Self {
        Self {
            movement,
            sit,
            repeat: 1,
        }
    }

    pub fn times(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Plays back a list of frames, then idles
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
    remaining: u32,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        let mut script = Self {
            frames: frames.into_iter().filter(|f| f.repeat > 0).collect(),
            remaining: 0,
        };
        script.remaining = script.frames.front().map_or(0, |f| f.repeat);
        script
    }

    /// Parse a JSON array of frames
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let frames: Vec<InputFrame> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    /// Total ticks left in the script
    pub fn remaining_ticks(&self) -> u64 {
        let rest: u64 = self.frames.iter().skip(1).map(|f| u64::from(f.repeat)).sum();
        if self.frames.is_empty() {
            0
        } else {
            u64::from(self.remaining) + rest
        }
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn movement(&self) -> MoveDirection {
        self.frames.front().map_or(MoveDirection::Idle, |f| f.movement)
    }

    fn sit_pressed(&self) -> bool {
        self.frames.front().is_some_and(|f| f.sit)
    }

    fn advance(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.frames.pop_front();
            self.remaining = self.frames.front().map_or(0, |f| f.repeat);
        }
    }
}
