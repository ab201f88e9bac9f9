//! Cycle scheduler for study rotations.
//!
//! Distributes weighted subjects over a fixed 14-day rotation:
//! - Derives a scheduling weight per subject from proficiency and focus mode
//! - Picks a working pool (all subjects, or the heaviest few)
//! - Composes each day greedily against a per-day hour target
//! - Carries usage counters across days to balance exposure and spacing
//!
//! Generation is pure. Seeding the progress ledger is a separate step (see
//! [`crate::sync::SyncCoordinator`]).

pub mod composer;
pub mod weight;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::schedule::{Subject, StudyTask};

pub use composer::{DayComposer, WeightedSubjectState, MAX_TASKS_PER_DAY, MAX_TASK_HOURS, MIN_TASK_HOURS};
pub use weight::{subject_weight, FocusMode};

/// Number of days in one rotation (two notional weeks).
pub const ROTATION_DAYS: usize = 14;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Cycle generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleConfig {
    /// Schedule every subject instead of only the heaviest ones.
    pub force_all_subjects: bool,
    /// Pool size when `force_all_subjects` is off.
    pub subjects_per_cycle: usize,
    pub focus_mode: FocusMode,
    /// Keep a subject off the day right after it was studied.
    pub avoid_consecutive: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            force_all_subjects: true,
            subjects_per_cycle: 4,
            focus_mode: FocusMode::Balanced,
            avoid_consecutive: true,
        }
    }
}

/// One day of the rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleDay {
    /// 1-based position in the rotation.
    pub day_index: usize,
    pub day_name: String,
    /// Subject name for a single-task day, otherwise a count label.
    pub summary: String,
    pub tasks: Vec<StudyTask>,
    pub total_planned_hours: f64,
}

impl CycleDay {
    fn new(day: usize, tasks: Vec<StudyTask>) -> Self {
        let summary = match tasks.as_slice() {
            [only] => only.subject.clone(),
            _ => format!("{} subjects", tasks.len()),
        };
        let total_planned_hours = tasks.iter().map(|t| t.planned_hours).sum();
        Self {
            day_index: day + 1,
            day_name: DAY_NAMES[day % DAY_NAMES.len()].to_string(),
            summary,
            tasks,
            total_planned_hours,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Planned hours of the first rotation week against the weekly limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeeklyLoad {
    pub total_hours: f64,
    pub limit: f64,
    pub over_limit: bool,
}

/// Builds rotations from a subject list.
#[derive(Debug, Clone, Default)]
pub struct CycleScheduler {
    config: CycleConfig,
}

impl CycleScheduler {
    pub fn new(config: CycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Generate a rotation of [`ROTATION_DAYS`] days.
    ///
    /// Returns an empty rotation when there are no subjects. Days the
    /// composer could not fill are kept with zero planned hours.
    pub fn generate(&self, subjects: &[Subject], weekly_hours: f64) -> Vec<CycleDay> {
        if subjects.is_empty() {
            warn!("no subjects provided for cycle generation");
            return Vec::new();
        }

        let total_cycle_hours = weekly_hours * 2.0;
        let average_per_day = (total_cycle_hours / ROTATION_DAYS as f64).max(1.5);
        let target_hours = average_per_day.min(weekly_hours / 7.0).max(1.0);

        let mut pool = self.working_pool(subjects);
        let composer = DayComposer::new(self.config.focus_mode, self.config.avoid_consecutive);

        let cycle: Vec<CycleDay> = (0..ROTATION_DAYS)
            .map(|day| {
                let tasks = composer.compose(&mut pool, day as i32, target_hours);
                CycleDay::new(day, tasks)
            })
            .collect();

        info!(
            subjects = pool.len(),
            target_hours,
            planned_hours = cycle.iter().map(|d| d.total_planned_hours).sum::<f64>(),
            "generated study cycle"
        );
        cycle
    }

    fn working_pool(&self, subjects: &[Subject]) -> Vec<WeightedSubjectState> {
        let mut pool: Vec<WeightedSubjectState> = subjects
            .iter()
            .map(|s| {
                WeightedSubjectState::new(s.clone(), subject_weight(s.level, self.config.focus_mode))
            })
            .collect();

        if !self.config.force_all_subjects {
            // Stable sort keeps caller order among equal weights.
            pool.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            pool.truncate(self.config.subjects_per_cycle);
        }
        pool
    }
}

/// Generate a rotation with the given config.
pub fn generate_cycle(subjects: &[Subject], weekly_hours: f64, config: &CycleConfig) -> Vec<CycleDay> {
    CycleScheduler::new(config.clone()).generate(subjects, weekly_hours)
}

/// Sum the first week of a rotation and compare it to `limit`.
pub fn weekly_load(cycle: &[CycleDay], limit: f64) -> WeeklyLoad {
    let total_hours = cycle.iter().take(7).map(|d| d.total_planned_hours).sum();
    WeeklyLoad {
        total_hours,
        limit,
        over_limit: total_hours > limit,
    }
}
