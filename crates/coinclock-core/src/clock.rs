//! Simulated calendar advanced one day per refresh cycle.
//!
//! [`VirtualClock`] is the single writer and is owned by the refresh daemon;
//! `advance` takes `&mut self`, so a second writer cannot exist. Any number
//! of [`ClockReader`] handles observe the current date without blocking.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{CoreError, SimDate};

#[derive(Debug)]
struct ClockState {
    current_millis: AtomicI64,
    day_duration: Duration,
}

impl ClockState {
    fn load(&self) -> SimDate {
        let millis = self.current_millis.load(Ordering::Acquire);
        SimDate::from_unix_millis(millis).expect("virtual clock only stores in-range dates")
    }
}

/// Writer handle for the simulated date.
#[derive(Debug)]
pub struct VirtualClock {
    state: Arc<ClockState>,
}

impl VirtualClock {
    pub fn new(initial: SimDate, day_duration: Duration) -> Self {
        Self {
            state: Arc::new(ClockState {
                current_millis: AtomicI64::new(initial.unix_millis()),
                day_duration,
            }),
        }
    }

    /// The current simulated date.
    pub fn now(&self) -> SimDate {
        self.state.load()
    }

    /// Real time that represents one simulated day.
    pub fn day_duration(&self) -> Duration {
        self.state.day_duration
    }

    /// Move forward exactly one simulated day and return the new date.
    pub fn advance(&mut self) -> Result<SimDate, CoreError> {
        let current = self.state.load();
        let next = current
            .next_day()
            .ok_or(CoreError::ClockOverflow { date: current })?;
        self.state
            .current_millis
            .store(next.unix_millis(), Ordering::Release);
        Ok(next)
    }

    /// A read-only handle for request handlers.
    pub fn reader(&self) -> ClockReader {
        ClockReader {
            state: Arc::clone(&self.state),
        }
    }
}

/// Cloneable read-only view of a [`VirtualClock`].
#[derive(Debug, Clone)]
pub struct ClockReader {
    state: Arc<ClockState>,
}

impl ClockReader {
    pub fn now(&self) -> SimDate {
        self.state.load()
    }

    pub fn day_duration(&self) -> Duration {
        self.state.day_duration
    }
}
