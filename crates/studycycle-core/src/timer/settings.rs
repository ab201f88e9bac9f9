use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Lengths of the study/break cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSettings {
    #[serde(default = "default_study_minutes")]
    pub study_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Every n-th completed session is followed by a long break.
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
}

fn default_study_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            study_minutes: default_study_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_until_long_break: default_sessions_until_long_break(),
        }
    }
}

impl TimerSettings {
    pub fn study_secs(&self) -> u64 {
        u64::from(self.study_minutes).saturating_mul(60)
    }

    /// Break that follows the `completed`-th finished session.
    pub fn break_after(&self, completed: u32) -> BreakKind {
        if completed % self.sessions_until_long_break.max(1) == 0 {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }

    pub fn break_secs(&self, kind: BreakKind) -> u64 {
        let minutes = match kind {
            BreakKind::Short => self.short_break_minutes,
            BreakKind::Long => self.long_break_minutes,
        };
        u64::from(minutes).saturating_mul(60)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Short,
    Long,
}

/// Source of wall-clock timestamps for session records.
///
/// Countdown progress never reads the clock; it only advances on ticks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
