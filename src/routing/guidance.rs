//! Instruction tracking for turn-by-turn guidance.

use super::Instruction;
use std::collections::VecDeque;

/// Holds the active instruction and the ones queued behind it.
#[derive(Debug, Default)]
pub struct InstructionTracker {
    current: Option<Instruction>,
    queue: VecDeque<Instruction>,
    /// Replace an instruction as soon as it reaches zero
    auto_advance: bool,
}

impl InstructionTracker {
    pub fn new(auto_advance: bool) -> Self {
        Self {
            auto_advance,
            ..Default::default()
        }
    }

    /// Load a fresh instruction list; the first becomes current.
    pub fn load(&mut self, instructions: Vec<Instruction>) {
        self.queue = instructions.into();
        self.current = self.queue.pop_front();
    }

    pub fn current(&self) -> Option<&Instruction> {
        self.current.as_ref()
    }

    /// Instructions still waiting behind the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Pop the next queued instruction into the current slot.
    pub fn advance(&mut self) -> Option<&Instruction> {
        self.current = self.queue.pop_front();
        self.current.as_ref()
    }

    /// Count down the current instruction by the distance travelled.
    ///
    /// The distance is clamped at zero.
    pub fn travel(&mut self, distance_m: f64) -> Option<&Instruction> {
        let reached_zero = match self.current.as_mut() {
            Some(current) => {
                current.distance_meters = (current.distance_meters - distance_m.max(0.0)).max(0.0);
                current.distance_meters == 0.0
            }
            None => false,
        };

        if reached_zero && self.auto_advance && !self.queue.is_empty() {
            tracing::debug!("Instruction reached, advancing guidance");
            self.advance();
        }
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.queue.clear();
    }
}
