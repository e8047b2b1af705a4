//! Deferred scheduling port.
//!
//! The session never holds callbacks. It asks the scheduler to hand a
//! [`Timer`] back after a delay, and the host feeds fired timers into
//! `GameSession::on_timer`. Browsers implement this with `setTimeout`; tests
//! use [`ManualScheduler`] and advance time synchronously.

use serde::{Deserialize, Serialize};

/// Identifies one scheduled timer so it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Deferred effects. Each carries the round it was scheduled for so a timer
/// outliving its round is recognised as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timer {
    SpeakProblem { round: u32 },
    EnableInput { round: u32 },
    SpeakExplanation { round: u32 },
}

impl Timer {
    pub fn round(&self) -> u32 {
        match *self {
            Timer::SpeakProblem { round }
            | Timer::EnableInput { round }
            | Timer::SpeakExplanation { round } => round,
        }
    }
}

pub trait Scheduler {
    fn after(&mut self, delay_ms: u32, timer: Timer) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone)]
struct Pending {
    due_ms: u64,
    handle: TimerHandle,
    timer: Timer,
}

/// Fake clock for deterministic tests.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Move the clock forward and return every timer that came due, ordered by
    /// deadline and then by scheduling order.
    pub fn advance(&mut self, ms: u64) -> Vec<(TimerHandle, Timer)> {
        self.now_ms += ms;
        let now = self.now_ms;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.due_ms, p.handle));
        due.into_iter().map(|p| (p.handle, p.timer)).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn after(&mut self, delay_ms: u32, timer: Timer) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(Pending {
            due_ms: self.now_ms + u64::from(delay_ms),
            handle,
            timer,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|p| p.handle != handle);
    }
}
