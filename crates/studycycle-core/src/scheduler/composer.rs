//! Greedy composition of a single rotation day.
//!
//! The composer fills one day with tasks until the day's hour target is met,
//! four tasks are placed, or the attempt budget runs out. Usage counters on the
//! pool are updated in place so later days see earlier choices.

use tracing::debug;

use crate::schedule::{slug, short_uid, Subject, StudyTask, TaskPriority};

use super::weight::FocusMode;

/// Upper bound on tasks placed on one day.
pub const MAX_TASKS_PER_DAY: usize = 4;
/// Shortest task the composer will emit, in hours.
pub const MIN_TASK_HOURS: f64 = 0.5;
/// Longest task the composer will emit, in hours.
pub const MAX_TASK_HOURS: f64 = 2.5;
/// `last_used_day` of a subject that has not been scheduled yet. Far enough
/// below day 0 that it never reads as "yesterday".
pub const NEVER_USED: i32 = -3;

/// Per-run usage state of one subject.
#[derive(Debug, Clone)]
pub struct WeightedSubjectState {
    pub subject: Subject,
    pub weight: f64,
    pub times_used: u32,
    pub last_used_day: i32,
}

impl WeightedSubjectState {
    pub fn new(subject: Subject, weight: f64) -> Self {
        Self {
            subject,
            weight,
            times_used: 0,
            last_used_day: NEVER_USED,
        }
    }

    fn decayed_weight(&self) -> f64 {
        self.weight / (self.times_used as f64 + 1.0)
    }
}

/// Fills one day from a pool of weighted subjects.
#[derive(Debug, Clone, Copy)]
pub struct DayComposer {
    pub focus_mode: FocusMode,
    pub avoid_consecutive: bool,
}

impl DayComposer {
    pub fn new(focus_mode: FocusMode, avoid_consecutive: bool) -> Self {
        Self {
            focus_mode,
            avoid_consecutive,
        }
    }

    /// Compose the tasks for zero-based `day`.
    ///
    /// A day may end up with fewer tasks than wanted (or none) when the
    /// spacing constraints leave no candidates.
    pub fn compose(
        &self,
        pool: &mut [WeightedSubjectState],
        day: i32,
        target_hours: f64,
    ) -> Vec<StudyTask> {
        let mut tasks = Vec::new();
        let mut used_today: Vec<usize> = Vec::new();
        let mut hours = 0.0;
        let max_attempts = pool.len() * 3;
        let mut attempts = 0;

        while hours < target_hours && tasks.len() < MAX_TASKS_PER_DAY && attempts < max_attempts {
            attempts += 1;

            let available: Vec<usize> = (0..pool.len())
                .filter(|i| !used_today.contains(i))
                .filter(|&i| !(self.avoid_consecutive && pool[i].last_used_day == day - 1))
                .collect();

            let Some(chosen) = self.select(pool, &available) else {
                debug!(day = day + 1, "no available subjects, closing day");
                break;
            };

            let duration = task_duration(target_hours - hours, tasks.len());
            let state = &mut pool[chosen];
            let task = build_task(state, day, duration);
            debug!(
                day = day + 1,
                subject = %task.subject,
                hours = task.planned_hours,
                "placed task"
            );

            state.times_used += 1;
            state.last_used_day = day;
            used_today.push(chosen);
            hours += task.planned_hours;
            tasks.push(task);
        }

        tasks
    }

    fn select(&self, pool: &[WeightedSubjectState], available: &[usize]) -> Option<usize> {
        let (&first, rest) = available.split_first()?;
        let mut best = first;
        for &i in rest {
            let (cur, top) = (&pool[i], &pool[best]);
            let better = match self.focus_mode {
                FocusMode::Balanced => {
                    cur.times_used < top.times_used
                        || (cur.times_used == top.times_used && cur.weight > top.weight)
                }
                FocusMode::Priority | FocusMode::Difficulty => {
                    cur.decayed_weight() > top.decayed_weight()
                }
            };
            if better {
                best = i;
            }
        }
        Some(best)
    }
}

/// Spread the remaining hours over the task slots still open, within the
/// per-task floor and ceiling. Rounded to one decimal place.
pub fn task_duration(remaining: f64, tasks_so_far: usize) -> f64 {
    let slots = MAX_TASKS_PER_DAY.saturating_sub(tasks_so_far).max(1) as f64;
    let ceiling = MAX_TASK_HOURS.min(remaining);
    let raw = MIN_TASK_HOURS.max(ceiling.min(remaining / slots));
    (raw * 10.0).round() / 10.0
}

fn build_task(state: &WeightedSubjectState, day: i32, duration: f64) -> StudyTask {
    let subject = &state.subject;
    StudyTask {
        id: format!("day{}-{}-{}", day + 1, slug(&subject.name), short_uid()),
        subject: subject.name.clone(),
        topic: subject.first_topic().map(str::to_string),
        subtopic: subject.first_subtopic().map(str::to_string),
        planned_hours: duration,
        studied_hours: 0.0,
        completed: false,
        color: subject.color.clone(),
        priority: TaskPriority::from_weight(state.weight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ProficiencyLevel;

    fn state(name: &str, weight: f64) -> WeightedSubjectState {
        WeightedSubjectState::new(
            Subject::new(name, name, ProficiencyLevel::Intermediate),
            weight,
        )
    }

    #[test]
    fn duration_respects_floor_and_ceiling() {
        assert_eq!(task_duration(1.4, 0), 0.5);
        assert_eq!(task_duration(0.2, 3), 0.5);
        assert_eq!(task_duration(12.0, 0), 2.5);
        assert_eq!(task_duration(4.0, 0), 1.0);
        assert_eq!(task_duration(3.0, 3), 2.5);
    }

    #[test]
    fn balanced_prefers_least_used_then_heavier() {
        let composer = DayComposer::new(FocusMode::Balanced, false);
        let mut pool = vec![state("A", 1.0), state("B", 3.0)];
        pool[1].times_used = 2;
        let tasks = composer.compose(&mut pool, 0, 0.5);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].subject, "A");

        let mut pool = vec![state("A", 1.0), state("B", 3.0)];
        let tasks = composer.compose(&mut pool, 0, 0.5);
        assert_eq!(tasks[0].subject, "B");
    }

    #[test]
    fn weighted_mode_uses_decayed_weight() {
        let composer = DayComposer::new(FocusMode::Priority, false);
        let mut pool = vec![state("A", 4.5), state("B", 3.0)];
        pool[0].times_used = 1; // 4.5 / 2 = 2.25 < 3.0
        let tasks = composer.compose(&mut pool, 0, 0.5);
        assert_eq!(tasks[0].subject, "B");
    }

    #[test]
    fn never_repeats_subject_within_day() {
        let composer = DayComposer::new(FocusMode::Balanced, false);
        let mut pool = vec![state("A", 3.0)];
        let tasks = composer.compose(&mut pool, 0, 8.0);
        assert_eq!(tasks.len(), 1);
        assert_eq!(pool[0].times_used, 1);
        assert_eq!(pool[0].last_used_day, 0);
    }

    #[test]
    fn avoid_consecutive_skips_yesterdays_subjects() {
        let composer = DayComposer::new(FocusMode::Balanced, true);
        let mut pool = vec![state("A", 3.0), state("B", 1.0)];
        pool[0].last_used_day = 4;
        let tasks = composer.compose(&mut pool, 5, 0.5);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].subject, "B");
    }

    #[test]
    fn caps_tasks_per_day() {
        let composer = DayComposer::new(FocusMode::Balanced, false);
        let mut pool: Vec<_> = (0..6).map(|i| state(&format!("S{i}"), 2.0)).collect();
        let tasks = composer.compose(&mut pool, 0, 100.0);
        assert_eq!(tasks.len(), MAX_TASKS_PER_DAY);
    }

    #[test]
    fn empty_pool_yields_empty_day() {
        let composer = DayComposer::new(FocusMode::Difficulty, true);
        assert!(composer.compose(&mut [], 0, 2.0).is_empty());
    }

    #[test]
    fn task_carries_first_topic_and_priority() {
        use crate::schedule::Topic;
        let subject = Subject::new("m", "Linear Algebra", ProficiencyLevel::Beginner).with_topic(Topic {
            id: "t1".into(),
            name: "Vectors".into(),
            subtopics: vec!["Dot product".into()],
        });
        let mut pool = vec![WeightedSubjectState::new(subject, 3.0)];
        let tasks = DayComposer::new(FocusMode::Balanced, false).compose(&mut pool, 2, 1.0);
        let task = &tasks[0];
        assert!(task.id.starts_with("day3-linear-algebra-"));
        assert_eq!(task.topic.as_deref(), Some("Vectors"));
        assert_eq!(task.subtopic.as_deref(), Some("Dot product"));
        assert_eq!(task.priority, TaskPriority::High);
    }
}
