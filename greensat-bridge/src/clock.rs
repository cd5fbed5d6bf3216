//! Receipt-time clock
//!
//! The board has no real-time clock, so every timestamp in the store is the
//! bridge's local wall time when the line arrived. Stored at one-second
//! resolution as `%Y-%m-%d %H:%M:%S`, which sorts the same as time does.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDateTime, Timelike};

/// Stored timestamp format
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of receipt timestamps
pub trait Clock: Send + Sync {
    /// Current local time, whole seconds
    fn now(&self) -> NaiveDateTime;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Settable clock for tests
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Clock stopped at `now`
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Parse a `%Y-%m-%d %H:%M:%S` timestamp
    pub fn at(timestamp: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(timestamp, DATE_TIME_FORMAT).map(Self::new)
    }

    /// Move to `now`, backwards included
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Format for storage and display
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a stored timestamp
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
}
