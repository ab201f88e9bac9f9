use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Subject;
use crate::scheduler::{CycleConfig, CycleDay};

/// A generated rotation together with the inputs that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Calendar date of rotation day 1.
    pub start_date: NaiveDate,
    pub weekly_hours: f64,
    pub config: CycleConfig,
    pub subjects: Vec<Subject>,
    pub cycle: Vec<CycleDay>,
}

impl PlanRecord {
    pub fn new(
        start_date: NaiveDate,
        weekly_hours: f64,
        config: CycleConfig,
        subjects: Vec<Subject>,
        cycle: Vec<CycleDay>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            start_date,
            weekly_hours,
            config,
            subjects,
            cycle,
        }
    }

    /// Calendar date of the rotation day at `offset` (0-based).
    pub fn date_of(&self, offset: usize) -> NaiveDate {
        self.start_date + Duration::days(offset as i64)
    }

    /// Rotation day falling on `date`, if it is inside the rotation.
    pub fn day_on(&self, date: NaiveDate) -> Option<&CycleDay> {
        let offset = (date - self.start_date).num_days();
        usize::try_from(offset).ok().and_then(|i| self.cycle.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::generate_cycle;
    use crate::schedule::ProficiencyLevel;

    #[test]
    fn maps_dates_onto_rotation_days() {
        let subjects = vec![Subject::new("m", "Math", ProficiencyLevel::Beginner)];
        let config = CycleConfig::default();
        let cycle = generate_cycle(&subjects, 7.0, &config);
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let plan = PlanRecord::new(start, 7.0, config, subjects, cycle);

        assert_eq!(plan.date_of(13), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(plan.day_on(start).unwrap().day_index, 1);
        assert_eq!(plan.day_on(plan.date_of(13)).unwrap().day_index, 14);
        assert!(plan.day_on(plan.date_of(14)).is_none());
        assert!(plan.day_on(start - Duration::days(1)).is_none());
    }
}
