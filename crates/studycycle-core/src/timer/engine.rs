//! Session timer state machine.
//!
//! The timer has no internal thread. The caller feeds it one `tick()` per
//! second; every transition is a synchronous reaction to a tick or a command.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Studying --countdown 0--> OnBreak --countdown 0--> Idle
//!                    |                         |
//!                    +----------stop-----------+--> Idle
//! ```
//!
//! `pause`/`resume` only gate ticking in `Studying` and `OnBreak`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(TimerSettings::default());
//! timer.start(StartRequest::new("Math").task("t1"))?;
//! // Once per second:
//! if let Some(event) = timer.tick(&mut ledger)? { /* render */ }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use chrono::NaiveDate;

use super::session::{SessionHistory, StudySession};
use super::settings::{Clock, SystemClock, TimerSettings};
use crate::error::TimerError;
use crate::events::Event;
use crate::ledger::ProgressSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Studying,
    OnBreak,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Studying => "studying",
            TimerState::OnBreak => "on_break",
        };
        f.write_str(s)
    }
}

/// What to study in a new session.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub subject: String,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub task_id: Option<String>,
    /// Ledger day of `task_id`.
    pub date: Option<NaiveDate>,
}

impl StartRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    pub fn task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Read-only view for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub paused: bool,
    pub remaining_secs: u64,
    pub current_session: Option<StudySession>,
    pub completed_sessions: u32,
}

/// Countdown timer that turns study intervals into closed sessions.
#[derive(Debug)]
pub struct SessionTimer<C: Clock = SystemClock> {
    settings: TimerSettings,
    clock: C,
    state: TimerState,
    paused: bool,
    remaining_secs: u64,
    /// Study seconds actually ticked in the current session.
    elapsed_secs: u64,
    current: Option<StudySession>,
    completed_sessions: u32,
    history: SessionHistory,
}

impl SessionTimer<SystemClock> {
    pub fn new(settings: TimerSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> SessionTimer<C> {
    pub fn with_clock(settings: TimerSettings, clock: C) -> Self {
        Self {
            settings,
            clock,
            state: TimerState::Idle,
            paused: false,
            remaining_secs: 0,
            elapsed_secs: 0,
            current: None,
            completed_sessions: 0,
            history: SessionHistory::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn current_session(&self) -> Option<&StudySession> {
        self.current.as_ref()
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// True while the caller should keep delivering ticks.
    pub fn needs_ticks(&self) -> bool {
        self.state != TimerState::Idle && !self.paused
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            paused: self.paused,
            remaining_secs: self.remaining_secs,
            current_session: self.current.clone(),
            completed_sessions: self.completed_sessions,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open a study session. Only legal from `Idle`.
    pub fn start(&mut self, request: StartRequest) -> Result<Event, TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::NotIdle {
                state: self.state.to_string(),
            });
        }
        let subject = request.subject.trim();
        if subject.is_empty() {
            return Err(TimerError::EmptySubject);
        }

        let now = self.clock.now();
        let session = StudySession {
            id: uuid::Uuid::new_v4().to_string(),
            subject: subject.to_string(),
            topic: request.topic.filter(|t| !t.is_empty()),
            subtopic: request.subtopic.filter(|t| !t.is_empty()),
            start_time: now,
            end_time: None,
            duration_minutes: 0,
            completed: false,
            task_id: request.task_id,
            date: request.date,
        };

        self.state = TimerState::Studying;
        self.paused = false;
        self.remaining_secs = self.settings.study_secs();
        self.elapsed_secs = 0;
        debug!(session = %session.id, subject = %session.subject, "study session started");

        let event = Event::StudyStarted {
            session_id: session.id.clone(),
            subject: session.subject.clone(),
            task_id: session.task_id.clone(),
            duration_secs: self.remaining_secs,
            at: now,
        };
        self.current = Some(session);
        Ok(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state == TimerState::Idle || self.paused {
            return None;
        }
        self.paused = true;
        Some(Event::TimerPaused {
            state: self.state,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state == TimerState::Idle || !self.paused {
            return None;
        }
        self.paused = false;
        Some(Event::TimerResumed {
            state: self.state,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Cancel the current interval.
    ///
    /// A study session is closed as incomplete with the minutes ticked so far
    /// and credited to its task. A break is discarded.
    pub fn stop(&mut self, sink: &mut dyn ProgressSink) -> Result<Option<Event>, TimerError> {
        match self.state {
            TimerState::Idle => Ok(None),
            TimerState::Studying => {
                let minutes = (self.elapsed_secs / 60) as u32;
                let session = self.close_session(minutes, false);
                self.reset_to_idle();
                report(sink, &session)?;
                let at = session.end_time.unwrap_or_else(|| self.clock.now());
                Ok(Some(Event::SessionStopped { session, at }))
            }
            TimerState::OnBreak => {
                let remaining_secs = self.remaining_secs;
                self.reset_to_idle();
                Ok(Some(Event::BreakSkipped {
                    remaining_secs,
                    at: self.clock.now(),
                }))
            }
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self, sink: &mut dyn ProgressSink) -> Result<Option<Event>, TimerError> {
        if !self.needs_ticks() {
            return Ok(None);
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.state == TimerState::Studying {
            self.elapsed_secs += 1;
        }
        if self.remaining_secs > 0 {
            return Ok(None);
        }

        match self.state {
            TimerState::Studying => self.finish_study(sink).map(Some),
            TimerState::OnBreak => {
                debug!("break finished");
                self.reset_to_idle();
                Ok(Some(Event::BreakFinished {
                    at: self.clock.now(),
                }))
            }
            TimerState::Idle => Ok(None),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish_study(&mut self, sink: &mut dyn ProgressSink) -> Result<Event, TimerError> {
        let session = self.close_session(self.settings.study_minutes, true);
        self.completed_sessions += 1;
        let break_kind = self.settings.break_after(self.completed_sessions);
        let break_secs = self.settings.break_secs(break_kind);

        self.state = TimerState::OnBreak;
        self.paused = false;
        self.remaining_secs = break_secs;
        self.elapsed_secs = 0;
        // The closed session stays current until the break ends.
        self.current = Some(session.clone());
        debug!(
            completed = self.completed_sessions,
            ?break_kind,
            "study session completed"
        );

        report(sink, &session)?;
        let at = session.end_time.unwrap_or_else(|| self.clock.now());
        Ok(Event::SessionCompleted {
            session,
            break_kind,
            break_secs,
            at,
        })
    }

    /// Close the current session and append it to the history.
    fn close_session(&mut self, minutes: u32, completed: bool) -> StudySession {
        let now = self.clock.now();
        let mut session = self.current.take().unwrap_or_else(|| StudySession {
            id: uuid::Uuid::new_v4().to_string(),
            subject: String::new(),
            topic: None,
            subtopic: None,
            start_time: now,
            end_time: None,
            duration_minutes: 0,
            completed: false,
            task_id: None,
            date: None,
        });
        session.end_time = Some(now);
        session.duration_minutes = minutes;
        session.completed = completed;
        self.history.push(session.clone());
        session
    }

    fn reset_to_idle(&mut self) {
        self.state = TimerState::Idle;
        self.paused = false;
        self.remaining_secs = 0;
        self.elapsed_secs = 0;
        self.current = None;
    }
}

/// Credit a closed session to the ledger. Unknown dates or tasks are logged
/// and skipped; the session itself is already recorded.
fn report(sink: &mut dyn ProgressSink, session: &StudySession) -> Result<(), TimerError> {
    match sink.record_session(session) {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            warn!(session = %session.id, %err, "session not credited to ledger");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
