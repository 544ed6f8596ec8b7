//! Explicit simulation context driven once per tick
//!
//! Holds what the browser hosts kept as ambient globals: the character
//! position, the scene latch and a handle to the episode buffer.

use crate::input::InputSource;
use crate::recorder::{ObservationRecord, SharedEpisodeBuffer, sample};
use crate::world::{Position, Scene};

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// 0-indexed tick number
    pub tick: u64,
    /// The record appended to the buffer
    pub record: ObservationRecord,
    /// Whether this tick unlocked the indoor area
    pub unlocked_indoor: bool,
}

/// Character, scene and buffer for one recording session
#[derive(Debug)]
pub struct SimulationContext {
    position: Position,
    scene: Scene,
    step_size: f64,
    ticks: u64,
    buffer: SharedEpisodeBuffer,
}

impl SimulationContext {
    pub fn new(scene: Scene, start: Position, step_size: f64, buffer: SharedEpisodeBuffer) -> Self {
        Self {
            position: start,
            scene,
            step_size,
            ticks: 0,
            buffer,
        }
    }

    /// Advance one tick.
    ///
    /// Order matches the render loop: move, update the indoor latch, sample
    /// the post-move state, append.
    pub async fn tick(&mut self, input: &mut dyn InputSource) -> TickOutcome {
        let movement = input.movement();
        let sit = input.sit_pressed();

        self.position.x += movement.as_f64() * self.step_size;
        let unlocked_indoor = self.scene.update_latch(&self.position);

        let record = sample(&self.position, movement, sit, &self.scene);
        self.buffer.lock().await.append(record.clone());
        input.advance();

        let tick = self.ticks;
        self.ticks += 1;
        if record.reward > 0.0 {
            tracing::trace!(tick, reward = record.reward, "Rewarded tick");
        }

        TickOutcome {
            tick,
            record,
            unlocked_indoor,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Place the character directly, for hosts that own movement
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn buffer(&self) -> &SharedEpisodeBuffer {
        &self.buffer
    }
}
