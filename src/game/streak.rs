//! Win-streak state machine.
//!
//! The tracker is a bounded counter. It only reports what happened; the
//! session persists the value after every transition.

use serde::{Deserialize, Serialize};

/// Signals produced by a transition, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakEvent {
    Changed(u8),
    /// Cap reached. The celebration must finish before the counter resets.
    Completed,
    /// A loss is about to drain a non-zero streak.
    Draining,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakTracker {
    streak: u8,
    cap: u8,
}

impl StreakTracker {
    pub fn new(cap: u8) -> Self {
        Self { streak: 0, cap }
    }

    /// Rebuild from a persisted value. A value at or above the cap means a
    /// celebration never completed; it is forced back to 0. The flag tells the
    /// caller the repaired value must be written back.
    pub fn restore(raw: u32, cap: u8) -> (Self, bool) {
        if raw >= u32::from(cap) {
            (Self::new(cap), true)
        } else {
            // raw < cap <= u8::MAX
            (Self { streak: raw as u8, cap }, false)
        }
    }

    pub fn streak(&self) -> u8 {
        self.streak
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }

    /// At the cap and waiting for the celebration to finish.
    pub fn is_complete(&self) -> bool {
        self.streak >= self.cap
    }

    pub fn record(&mut self, correct: bool) -> Vec<StreakEvent> {
        if correct {
            self.record_win()
        } else {
            self.record_loss()
        }
    }

    fn record_win(&mut self) -> Vec<StreakEvent> {
        if self.streak >= self.cap {
            return Vec::new();
        }
        self.streak += 1;
        let mut events = vec![StreakEvent::Changed(self.streak)];
        if self.streak == self.cap {
            events.push(StreakEvent::Completed);
        }
        events
    }

    fn record_loss(&mut self) -> Vec<StreakEvent> {
        if self.streak == 0 {
            return Vec::new();
        }
        self.streak = 0;
        vec![StreakEvent::Draining, StreakEvent::Changed(0)]
    }

    /// Called once the celebration collaborator is done.
    pub fn finish_celebration(&mut self) -> Vec<StreakEvent> {
        if !self.is_complete() {
            return Vec::new();
        }
        self.streak = 0;
        vec![StreakEvent::Changed(0)]
    }

    /// Unconditional reset (manual escape hatch).
    pub fn reset(&mut self) -> Vec<StreakEvent> {
        self.streak = 0;
        vec![StreakEvent::Changed(0)]
    }
}

/// The number line is withheld on these streak values so the player has to
/// compare without it; a first-click hint brings it back.
const NUMBER_LINE_HIDDEN_AT: [u8; 4] = [1, 3, 5, 7];

pub fn number_line_visible(streak: u8) -> bool {
    !NUMBER_LINE_HIDDEN_AT.contains(&streak)
}
