//! Daily cap on destructive replace actions.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::Serialize;

/// Source of "today". Injected so tests can move the calendar.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock reading the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug)]
struct LimiterState {
    date: NaiveDate,
    used: u32,
}

/// Today's replacement budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimiterStatus {
    pub used_today: u32,
    pub max_per_day: u32,
    pub remaining: u32,
}

/// Fixed daily budget that resets when the calendar date advances.
///
/// Held in memory only; a restart forgets the day's usage.
pub struct DailyReplacementLimiter {
    max_per_day: u32,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>,
}

impl fmt::Debug for DailyReplacementLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("DailyReplacementLimiter");
        debug.field("max_per_day", &self.max_per_day);
        match self.state.try_lock() {
            Some(state) => {
                debug.field("date", &state.date).field("used", &state.used);
            }
            None => {
                debug.field("state", &"<locked>");
            }
        }
        debug.finish()
    }
}

impl DailyReplacementLimiter {
    /// Limiter on the local clock.
    pub fn new(max_per_day: u32) -> Self {
        Self::with_clock(max_per_day, Arc::new(LocalClock))
    }

    pub fn with_clock(max_per_day: u32, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            max_per_day,
            clock,
            state: Mutex::new(LimiterState {
                date: today,
                used: 0,
            }),
        }
    }

    fn current(&self) -> parking_lot::MutexGuard<'_, LimiterState> {
        let today = self.clock.today();
        let mut state = self.state.lock();
        if today != state.date {
            state.date = today;
            state.used = 0;
        }
        state
    }

    /// True when another replacement is allowed today.
    pub fn check(&self) -> bool {
        self.current().used < self.max_per_day
    }

    pub fn increment(&self) {
        self.current().used += 1;
    }

    /// Checks and consumes a slot in one step.
    pub fn try_reserve(&self) -> bool {
        let mut state = self.current();
        if state.used < self.max_per_day {
            state.used += 1;
            true
        } else {
            false
        }
    }

    /// Returns a reserved slot after an aborted replacement.
    pub fn release(&self) {
        let mut state = self.current();
        state.used = state.used.saturating_sub(1);
    }

    /// Forgets today's usage.
    pub fn reset(&self) {
        self.current().used = 0;
    }

    /// Replacements counted against today.
    pub fn used_today(&self) -> u32 {
        self.current().used
    }

    pub fn status(&self) -> LimiterStatus {
        let used = self.used_today();
        LimiterStatus {
            used_today: used,
            max_per_day: self.max_per_day,
            remaining: self.max_per_day.saturating_sub(used),
        }
    }
}
