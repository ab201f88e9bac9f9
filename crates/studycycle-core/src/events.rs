use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{BreakKind, StudySession, TimerState};

/// Every timer state change and ledger sync produces an Event.
/// The CLI prints them; the ledger consumes the sessions they carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    StudyStarted {
        session_id: String,
        subject: String,
        task_id: Option<String>,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        state: TimerState,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        state: TimerState,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Study countdown ran out; the break has begun.
    SessionCompleted {
        session: StudySession,
        break_kind: BreakKind,
        break_secs: u64,
        at: DateTime<Utc>,
    },
    /// Study interval cancelled before the countdown ran out.
    SessionStopped {
        session: StudySession,
        at: DateTime<Utc>,
    },
    BreakFinished {
        at: DateTime<Utc>,
    },
    BreakSkipped {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Every rotation day has a daily log.
    LedgerSynced {
        start_date: NaiveDate,
        days: usize,
        attempts: u32,
        fallback_days: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The closed session carried by this event, if any.
    pub fn session(&self) -> Option<&StudySession> {
        match self {
            Event::SessionCompleted { session, .. } | Event::SessionStopped { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::BreakFinished { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BreakFinished");
        assert!(event.session().is_none());
    }
}
