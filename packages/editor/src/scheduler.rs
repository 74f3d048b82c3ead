//! # Change Scheduler
//!
//! Debounces document changes into validation requests.
//!
//! ```text
//!            schedule(now)                poll(now ≥ deadline)
//!   Idle ───────────────────▶ Pending ──────────────────────▶ Idle + fire
//!                              │  ▲
//!                              └──┘ schedule(now): deadline = now + interval
//! ```
//!
//! Scheduling while a timer is pending replaces the timer, so only the last
//! change inside a quiet period is ever validated. Time is passed in by the
//! caller; the scheduler never reads a clock itself.

use std::time::{Duration, Instant};

/// Quiet period before a validation request goes out
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    PendingValidation { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct ValidationScheduler {
    interval: Duration,
    state: SchedulerState,
}

impl ValidationScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: SchedulerState::Idle,
        }
    }

    /// Start the timer, replacing a pending one; returns the new deadline
    pub fn schedule(&mut self, now: Instant) -> Instant {
        let deadline = now + self.interval;
        self.state = SchedulerState::PendingValidation { deadline };
        deadline
    }

    /// Fire the timer if it is due
    ///
    /// Returns `true` exactly once per started timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::PendingValidation { deadline } if now >= deadline => {
                self.state = SchedulerState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.state = SchedulerState::Idle;
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::PendingValidation { deadline } => Some(deadline),
            SchedulerState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for ValidationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
