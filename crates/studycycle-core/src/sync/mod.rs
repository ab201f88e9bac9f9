//! Ledger seeding from a generated rotation.
//!
//! Maps rotation day `i` onto the calendar date `start + i` and makes sure the
//! ledger holds a non-empty daily log for every one of them. Days the scheduler
//! left empty, and days whose tasks all fail ledger validation, receive a
//! single fallback task. The whole pass is retried a bounded number of times
//! before giving up.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, SyncError};
use crate::events::Event;
use crate::ledger::{LedgerStore, ProgressLedger};
use crate::scheduler::CycleDay;
use crate::schedule::{short_uid, slug, StudyTask, TaskPriority};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Minimum planned hours of a fallback task.
const FALLBACK_TASK_HOURS: f64 = 2.5;

/// Outcome of a successful reconcile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconcileReport {
    pub start_date: NaiveDate,
    pub days: usize,
    /// Passes it took, starting at 1.
    pub attempts: u32,
    /// Dates that received a fallback task.
    pub fallback_dates: Vec<NaiveDate>,
}

impl ReconcileReport {
    pub fn to_event(&self, at: DateTime<Utc>) -> Event {
        Event::LedgerSynced {
            start_date: self.start_date,
            days: self.days,
            attempts: self.attempts,
            fallback_days: self.fallback_dates.len(),
            at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCoordinator {
    max_attempts: u32,
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl SyncCoordinator {
    /// A zero budget is treated as one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Seed `ledger` with every day of `cycle`, starting at `start`.
    ///
    /// Days that already hold tasks are left alone, so reconciling twice is
    /// harmless.
    pub fn reconcile<S: LedgerStore>(
        &self,
        ledger: &mut ProgressLedger<S>,
        cycle: &[CycleDay],
        start: NaiveDate,
    ) -> Result<ReconcileReport, SyncError> {
        let mut fallback_dates = Vec::new();
        let mut missing = Vec::new();

        for attempt in 1..=self.max_attempts {
            fallback_dates.clear();
            for (offset, day) in cycle.iter().enumerate() {
                let date = start + Duration::days(offset as i64);
                let result = if day.is_empty() {
                    fallback_dates.push(date);
                    ledger.initialize_day(date, &[fallback_task(day)]).map(|_| ())
                } else {
                    match ledger.initialize_day(date, &day.tasks).map(|_| ()) {
                        Err(LedgerError::EmptyDay { .. }) => {
                            debug!(%date, "no valid tasks, substituting fallback");
                            fallback_dates.push(date);
                            ledger.initialize_day(date, &[fallback_task(day)]).map(|_| ())
                        }
                        other => other,
                    }
                };
                if let Err(err) = result {
                    warn!(%date, attempt, %err, "failed to initialize day");
                }
            }

            missing = missing_dates(ledger, start, cycle.len());
            if missing.is_empty() {
                info!(%start, days = cycle.len(), attempt, "ledger in sync with rotation");
                return Ok(ReconcileReport {
                    start_date: start,
                    days: cycle.len(),
                    attempts: attempt,
                    fallback_dates,
                });
            }
            warn!(attempt, missing = missing.len(), "days still missing after pass");
        }

        Err(SyncError::InitializationFailed {
            attempts: self.max_attempts,
            missing,
        })
    }
}

/// Placeholder task for a rotation day the scheduler could not fill.
fn fallback_task(day: &CycleDay) -> StudyTask {
    let subject = match day.summary.trim() {
        "" => format!("Day {}", day.day_index),
        summary => summary.to_string(),
    };
    let id = format!(
        "auto-task-{}-{}-{}",
        day.day_index,
        slug(&subject),
        short_uid()
    );
    debug!(day = day.day_index, %id, "using fallback task");
    let hours = day.total_planned_hours.max(FALLBACK_TASK_HOURS);
    let mut task = StudyTask::new(id, subject, hours);
    task.priority = TaskPriority::Medium;
    task
}

fn missing_dates<S: LedgerStore>(
    ledger: &ProgressLedger<S>,
    start: NaiveDate,
    days: usize,
) -> Vec<NaiveDate> {
    (0..days)
        .map(|i| start + Duration::days(i as i64))
        .filter(|date| !ledger.get_day(*date).is_some_and(|log| log.has_tasks()))
        .collect()
}
