//! Daily progress ledger.
//!
//! The ledger is the only durable record of task state. It maps a calendar
//! day to a [`DailyStudyLog`] and owns every aggregate on it: callers never
//! write `total_studied_hours` or `completed` themselves.
//!
//! Every mutation runs against a copy of the map, persists the copy through
//! the [`LedgerStore`], and only then swaps it in. A failed write leaves both
//! memory and storage as they were.

pub mod store;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{LedgerError, ValidationError};
use crate::schedule::{StudyTask, DEFAULT_COLOR};
use crate::timer::StudySession;

pub use store::{LedgerStore, MemoryStore};

/// Persisted ledger contents.
pub type LedgerMap = BTreeMap<NaiveDate, DailyStudyLog>;

/// Smallest planned duration a ledger task may carry, in hours.
const MIN_PLANNED_HOURS: f64 = 0.5;

/// Task progress for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStudyLog {
    pub date: NaiveDate,
    pub tasks: Vec<StudyTask>,
    pub total_planned_hours: f64,
    pub total_studied_hours: f64,
    /// True iff every task is completed.
    pub completed: bool,
}

impl DailyStudyLog {
    fn new(date: NaiveDate, tasks: Vec<StudyTask>) -> Self {
        let mut log = Self {
            date,
            tasks,
            total_planned_hours: 0.0,
            total_studied_hours: 0.0,
            completed: false,
        };
        log.recompute();
        log
    }

    fn recompute(&mut self) {
        self.total_planned_hours = self.tasks.iter().map(|t| t.planned_hours).sum();
        self.total_studied_hours = self.tasks.iter().map(|t| t.studied_hours).sum();
        self.completed = self.tasks.iter().all(|t| t.completed);
    }

    pub fn task(&self, task_id: &str) -> Option<&StudyTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// 0.0 .. 100.0 of the day's planned hours studied.
    pub fn progress_pct(&self) -> f64 {
        if self.total_planned_hours <= 0.0 {
            return 0.0;
        }
        (self.total_studied_hours / self.total_planned_hours * 100.0).min(100.0)
    }
}

/// Planned and studied hours over one week.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyTotals {
    pub planned_hours: f64,
    pub studied_hours: f64,
}

/// Receives closed study sessions.
pub trait ProgressSink {
    /// Credit a closed session to its task. Sessions without a task are
    /// ignored.
    fn record_session(&mut self, session: &StudySession) -> Result<(), LedgerError>;
}

/// Keyed store of per-day task progress.
#[derive(Debug)]
pub struct ProgressLedger<S: LedgerStore> {
    logs: LedgerMap,
    store: S,
}

impl<S: LedgerStore> ProgressLedger<S> {
    /// Load the ledger from `store`.
    pub fn open(store: S) -> Result<Self, LedgerError> {
        let logs = store.load()?;
        debug!(days = logs.len(), "loaded progress ledger");
        Ok(Self { logs, store })
    }

    pub fn logs(&self) -> &LedgerMap {
        &self.logs
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the log for `date` unless one with tasks already exists.
    ///
    /// Invalid tasks are dropped. When none survive, fails with
    /// [`LedgerError::EmptyDay`] and creates nothing.
    pub fn initialize_day(
        &mut self,
        date: NaiveDate,
        tasks: &[StudyTask],
    ) -> Result<&DailyStudyLog, LedgerError> {
        if self.logs.get(&date).is_some_and(DailyStudyLog::has_tasks) {
            debug!(%date, "daily log already exists, keeping it");
            return Ok(&self.logs[&date]);
        }

        let valid: Vec<StudyTask> = tasks
            .iter()
            .filter_map(|task| match clean_task(task) {
                Ok(clean) => Some(clean),
                Err(err) => {
                    warn!(%date, %err, "dropping invalid task");
                    None
                }
            })
            .collect();

        if valid.is_empty() {
            return Err(LedgerError::EmptyDay { date });
        }

        let log = DailyStudyLog::new(date, valid);
        self.commit(|logs| {
            logs.insert(date, log);
            Ok(())
        })?;
        debug!(%date, "created daily log");
        Ok(&self.logs[&date])
    }

    /// Set a task's studied hours, clamped to its planned hours.
    ///
    /// `completed` defaults to whether the task reached its planned hours.
    pub fn update_task_progress(
        &mut self,
        date: NaiveDate,
        task_id: &str,
        studied_hours: f64,
        completed: Option<bool>,
    ) -> Result<&DailyStudyLog, LedgerError> {
        self.commit(|logs| {
            let log = find_log(logs, date)?;
            let task = find_task(log, date, task_id)?;
            task.studied_hours = studied_hours.max(0.0).min(task.planned_hours);
            task.completed = completed.unwrap_or(studied_hours >= task.planned_hours);
            log.recompute();
            Ok(())
        })?;
        Ok(&self.logs[&date])
    }

    /// Flip a task's completion. Completing fills its studied hours; undoing
    /// leaves them as they are.
    pub fn toggle_task_completion(
        &mut self,
        date: NaiveDate,
        task_id: &str,
    ) -> Result<&DailyStudyLog, LedgerError> {
        self.commit(|logs| {
            let log = find_log(logs, date)?;
            let task = find_task(log, date, task_id)?;
            task.completed = !task.completed;
            if task.completed {
                task.studied_hours = task.planned_hours;
            }
            log.recompute();
            Ok(())
        })?;
        Ok(&self.logs[&date])
    }

    pub fn get_day(&self, date: NaiveDate) -> Option<&DailyStudyLog> {
        self.logs.get(&date)
    }

    /// Totals over the seven days starting at `week_start`.
    pub fn weekly_totals(&self, week_start: NaiveDate) -> WeeklyTotals {
        (0..7)
            .filter_map(|i| self.logs.get(&(week_start + Duration::days(i))))
            .fold(WeeklyTotals::default(), |acc, log| WeeklyTotals {
                planned_hours: acc.planned_hours + log.total_planned_hours,
                studied_hours: acc.studied_hours + log.total_studied_hours,
            })
    }

    /// Drop the logs of `days` consecutive days from `start`. Returns how many
    /// were removed.
    pub fn remove_range(&mut self, start: NaiveDate, days: usize) -> Result<usize, LedgerError> {
        let end = start + Duration::days(days as i64);
        let doomed = self.logs.range(start..end).count();
        if doomed == 0 {
            return Ok(0);
        }
        self.commit(|logs| {
            logs.retain(|date, _| *date < start || *date >= end);
            Ok(())
        })?;
        debug!(%start, days, removed = doomed, "cleared daily logs");
        Ok(doomed)
    }

    fn commit<F>(&mut self, mutate: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut LedgerMap) -> Result<(), LedgerError>,
    {
        let mut next = self.logs.clone();
        mutate(&mut next)?;
        self.store.save(&next)?;
        self.logs = next;
        Ok(())
    }
}

impl<S: LedgerStore> ProgressSink for ProgressLedger<S> {
    fn record_session(&mut self, session: &StudySession) -> Result<(), LedgerError> {
        let (Some(task_id), true) = (session.task_id.as_deref(), session.is_closed()) else {
            return Ok(());
        };
        let date = session.ledger_date();
        let log = self
            .logs
            .get(&date)
            .ok_or(LedgerError::DayNotFound { date })?;
        let studied = log
            .task(task_id)
            .ok_or_else(|| LedgerError::TaskNotFound {
                date,
                task_id: task_id.to_string(),
            })?
            .studied_hours;

        self.update_task_progress(date, task_id, studied + session.hours(), None)?;
        Ok(())
    }
}

fn find_log(logs: &mut LedgerMap, date: NaiveDate) -> Result<&mut DailyStudyLog, LedgerError> {
    logs.get_mut(&date).ok_or(LedgerError::DayNotFound { date })
}

fn find_task<'a>(
    log: &'a mut DailyStudyLog,
    date: NaiveDate,
    task_id: &str,
) -> Result<&'a mut StudyTask, LedgerError> {
    log.tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| LedgerError::TaskNotFound {
            date,
            task_id: task_id.to_string(),
        })
}

/// Validate an incoming task and reset its progress.
fn clean_task(task: &StudyTask) -> Result<StudyTask, ValidationError> {
    let id = task.id.trim();
    if id.is_empty() {
        return Err(ValidationError::MissingId);
    }
    if task.subject.trim().is_empty() {
        return Err(ValidationError::MissingSubject {
            task_id: id.to_string(),
        });
    }
    if !(task.planned_hours > 0.0) {
        return Err(ValidationError::NonPositiveHours {
            task_id: id.to_string(),
            hours: task.planned_hours,
        });
    }

    Ok(StudyTask {
        id: id.to_string(),
        subject: task.subject.clone(),
        topic: task.topic.clone().filter(|t| !t.is_empty()),
        subtopic: task.subtopic.clone().filter(|t| !t.is_empty()),
        planned_hours: task.planned_hours.max(MIN_PLANNED_HOURS),
        studied_hours: 0.0,
        completed: false,
        color: if task.color.is_empty() {
            DEFAULT_COLOR.to_string()
        } else {
            task.color.clone()
        },
        priority: task.priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn ledger() -> ProgressLedger<MemoryStore> {
        ProgressLedger::open(MemoryStore::new()).unwrap()
    }

    fn seeded() -> ProgressLedger<MemoryStore> {
        let mut ledger = ledger();
        ledger
            .initialize_day(
                day(1),
                &[StudyTask::new("t1", "Math", 1.0), StudyTask::new("t2", "Art", 2.0)],
            )
            .unwrap();
        ledger
    }

    fn assert_completed_is_and(log: &DailyStudyLog) {
        assert_eq!(log.completed, log.tasks.iter().all(|t| t.completed));
    }

    #[test]
    fn initialize_creates_fresh_log() {
        let mut ledger = ledger();
        let mut task = StudyTask::new("t1", "Math", 1.5);
        task.studied_hours = 1.0;
        task.completed = true;
        let log = ledger.initialize_day(day(1), &[task]).unwrap();
        assert_eq!(log.tasks[0].studied_hours, 0.0);
        assert!(!log.tasks[0].completed);
        assert_eq!(log.total_planned_hours, 1.5);
        assert_eq!(log.total_studied_hours, 0.0);
        assert!(!log.completed);
        assert_eq!(ledger.store().save_count(), 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut ledger = seeded();
        let first = ledger.get_day(day(1)).unwrap().clone();
        let second = ledger
            .initialize_day(day(1), &[StudyTask::new("other", "Bio", 2.0)])
            .unwrap();
        assert_eq!(*second, first);
        assert_eq!(ledger.store().save_count(), 1);
    }

    #[test]
    fn initialize_drops_invalid_tasks() {
        let mut ledger = ledger();
        let tasks = vec![
            StudyTask::new("", "Math", 1.0),
            StudyTask::new("t2", "", 1.0),
            StudyTask::new("t3", "Art", 0.0),
            StudyTask::new("t4", "Bio", -1.0),
            StudyTask::new("t5", "Chem", 0.2),
        ];
        let log = ledger.initialize_day(day(2), &tasks).unwrap();
        assert_eq!(log.tasks.len(), 1);
        assert_eq!(log.tasks[0].id, "t5");
        assert_eq!(log.tasks[0].planned_hours, 0.5);
    }

    #[test]
    fn initialize_empty_day_fails_without_entry() {
        let mut ledger = ledger();
        let err = ledger.initialize_day(day(3), &[]).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyDay { .. }));
        assert!(ledger.get_day(day(3)).is_none());

        let err = ledger
            .initialize_day(day(3), &[StudyTask::new("x", "Math", 0.0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyDay { .. }));
        assert!(ledger.get_day(day(3)).is_none());
    }

    #[test]
    fn update_clamps_and_defaults_completion() {
        let mut ledger = seeded();
        let log = ledger.update_task_progress(day(1), "t1", 0.5, None).unwrap();
        assert_eq!(log.tasks[0].studied_hours, 0.5);
        assert!(!log.tasks[0].completed);
        assert_completed_is_and(log);

        let log = ledger.update_task_progress(day(1), "t1", 1e9, None).unwrap();
        assert_eq!(log.tasks[0].studied_hours, 1.0);
        assert!(log.tasks[0].completed);
        assert_eq!(log.total_studied_hours, 1.0);
        assert!(!log.completed);
        assert_completed_is_and(log);

        let log = ledger
            .update_task_progress(day(1), "t2", 0.1, Some(true))
            .unwrap();
        assert!(log.tasks[1].completed);
        assert!(log.completed);
        assert_completed_is_and(log);
    }

    #[test]
    fn update_unknown_date_or_task() {
        let mut ledger = seeded();
        let err = ledger.update_task_progress(day(9), "t1", 1.0, None).unwrap_err();
        assert!(matches!(err, LedgerError::DayNotFound { .. }));
        let err = ledger.update_task_progress(day(1), "zz", 1.0, None).unwrap_err();
        assert!(matches!(err, LedgerError::TaskNotFound { .. }));
        assert!(err.is_not_found());
        assert_eq!(ledger.store().save_count(), 1);
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let mut ledger = seeded();
        ledger.update_task_progress(day(1), "t2", 0.5, None).unwrap();

        let log = ledger.toggle_task_completion(day(1), "t2").unwrap();
        assert!(log.tasks[1].completed);
        assert_eq!(log.tasks[1].studied_hours, 2.0);
        assert_completed_is_and(log);

        let log = ledger.toggle_task_completion(day(1), "t2").unwrap();
        assert!(!log.tasks[1].completed);
        assert_eq!(log.tasks[1].studied_hours, 2.0);
        assert_completed_is_and(log);
    }

    #[test]
    fn toggle_unknown_task_fails() {
        let mut ledger = seeded();
        assert!(ledger.toggle_task_completion(day(2), "t1").is_err());
        assert!(ledger.toggle_task_completion(day(1), "nope").is_err());
    }

    #[test]
    fn failed_write_leaves_ledger_unchanged() {
        let mut ledger = ProgressLedger::open(MemoryStore::failing_first(1)).unwrap();
        let err = ledger
            .initialize_day(day(1), &[StudyTask::new("t1", "Math", 1.0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(ledger.get_day(day(1)).is_none());
        assert!(ledger.store().persisted().is_empty());
    }

    #[test]
    fn weekly_totals_sum_seven_days() {
        let mut ledger = ledger();
        for d in [1, 3, 7, 8] {
            ledger
                .initialize_day(day(d), &[StudyTask::new(format!("t{d}"), "Math", 2.0)])
                .unwrap();
        }
        ledger.toggle_task_completion(day(3), "t3").unwrap();
        let totals = ledger.weekly_totals(day(1));
        assert_eq!(totals.planned_hours, 6.0);
        assert_eq!(totals.studied_hours, 2.0);
        assert_eq!(ledger.weekly_totals(day(20)), WeeklyTotals::default());
    }

    #[test]
    fn remove_range_drops_only_that_window() {
        let mut ledger = ledger();
        for d in 1..=5 {
            ledger
                .initialize_day(day(d), &[StudyTask::new("t", "Math", 1.0)])
                .unwrap();
        }
        assert_eq!(ledger.remove_range(day(2), 3).unwrap(), 3);
        let left: Vec<_> = ledger.logs().keys().copied().collect();
        assert_eq!(left, vec![day(1), day(5)]);
    }

    #[test]
    fn record_session_adds_hours() {
        let mut ledger = seeded();
        let session = StudySession {
            id: "s1".into(),
            subject: "Art".into(),
            topic: None,
            subtopic: None,
            start_time: Utc::now(),
            end_time: Some(Utc::now()),
            duration_minutes: 30,
            completed: true,
            task_id: Some("t2".into()),
            date: Some(day(1)),
        };
        ledger.record_session(&session).unwrap();
        ledger.record_session(&session).unwrap();
        let task = ledger.get_day(day(1)).unwrap().task("t2").unwrap();
        assert!((task.studied_hours - 1.0).abs() < 1e-9);
        assert!(!task.completed);
    }

    #[test]
    fn progress_pct() {
        let mut ledger = seeded();
        let log = ledger.update_task_progress(day(1), "t2", 1.5, None).unwrap();
        assert!((log.progress_pct() - 50.0).abs() < 1e-9);
        assert_eq!(log.completed_count(), 0);
    }
}
