use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timed study interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudySession {
    pub id: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub completed: bool,
    /// Ledger task this session counts towards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Ledger day of `task_id`; defaults to the local day the session started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl StudySession {
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Ledger day the session reports into.
    pub fn ledger_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| self.start_time.with_timezone(&Local).date_naive())
    }

    pub fn hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}

/// Append-only list of closed sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    sessions: Vec<StudySession>,
}

/// Totals over a session history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistorySummary {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub total_minutes: u32,
    pub minutes_by_subject: BTreeMap<String, u32>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: Vec<StudySession>) -> Self {
        Self { sessions }
    }

    pub(crate) fn push(&mut self, session: StudySession) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    pub fn last(&self) -> Option<&StudySession> {
        self.sessions.last()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summary(&self) -> HistorySummary {
        let mut summary = HistorySummary::default();
        for s in &self.sessions {
            summary.total_sessions += 1;
            if s.completed {
                summary.completed_sessions += 1;
            }
            summary.total_minutes += s.duration_minutes;
            *summary
                .minutes_by_subject
                .entry(s.subject.clone())
                .or_default() += s.duration_minutes;
        }
        summary
    }
}
