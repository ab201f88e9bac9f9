//! Schedule types: subjects, topics and the study tasks placed on a day.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color used when a subject or task has none.
pub const DEFAULT_COLOR: &str = "#8884d8";

/// Learner proficiency in a subject. Weaker subjects get more scheduling mass.
///
/// Deserializes through [`FromStr`], so unrecognised levels read as
/// intermediate instead of failing the whole record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ProficiencyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl FromStr for ProficiencyLevel {
    type Err = std::convert::Infallible;

    /// Unknown text falls back to intermediate.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => ProficiencyLevel::Beginner,
            "advanced" => ProficiencyLevel::Advanced,
            _ => ProficiencyLevel::Intermediate,
        })
    }
}

impl From<String> for ProficiencyLevel {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// Task priority shown next to a study task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Derive a priority from a scheduling weight.
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 3.0 {
            TaskPriority::High
        } else if weight >= 2.0 {
            TaskPriority::Medium
        } else {
            TaskPriority::Low
        }
    }
}

/// A topic inside a subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
}

/// A subject the learner studies.
///
/// `weight` is the caller's own value; the scheduler derives its scheduling
/// weight from `level` and the focus mode instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub priority: i32,
    /// Minutes already logged against this subject.
    #[serde(default)]
    pub total_time: u32,
    #[serde(default)]
    pub level: ProficiencyLevel,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Subject {
    /// Create a subject with no topics at the given level.
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: ProficiencyLevel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            topics: Vec::new(),
            weight: 0.0,
            color: default_color(),
            priority: 1,
            total_time: 0,
            level,
        }
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }

    /// Name of the first topic, if any.
    pub fn first_topic(&self) -> Option<&str> {
        self.topics.first().map(|t| t.name.as_str())
    }

    /// First subtopic of the first topic, if any.
    pub fn first_subtopic(&self) -> Option<&str> {
        self.topics
            .first()
            .and_then(|t| t.subtopics.first())
            .map(String::as_str)
    }
}

/// A unit of planned study on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyTask {
    pub id: String,
    /// Subject name.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub planned_hours: f64,
    #[serde(default)]
    pub studied_hours: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl StudyTask {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, planned_hours: f64) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            topic: None,
            subtopic: None,
            planned_hours,
            studied_hours: 0.0,
            completed: false,
            color: default_color(),
            priority: TaskPriority::Medium,
        }
    }

    /// 0.0 .. 100.0 of planned hours studied.
    pub fn progress_pct(&self) -> f64 {
        if self.planned_hours <= 0.0 {
            return 0.0;
        }
        (self.studied_hours / self.planned_hours * 100.0).min(100.0)
    }
}

/// Lowercase, dash-separated form of a name for use inside ids.
pub(crate) fn slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Short random suffix that keeps generated ids unique.
pub(crate) fn short_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parse_falls_back_to_intermediate() {
        assert_eq!("Beginner".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Beginner);
        assert_eq!("advanced".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Advanced);
        assert_eq!("expert".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Intermediate);
    }

    #[test]
    fn priority_from_weight() {
        assert_eq!(TaskPriority::from_weight(6.0), TaskPriority::High);
        assert_eq!(TaskPriority::from_weight(3.0), TaskPriority::High);
        assert_eq!(TaskPriority::from_weight(2.0), TaskPriority::Medium);
        assert_eq!(TaskPriority::from_weight(1.5), TaskPriority::Low);
    }

    #[test]
    fn slug_collapses_whitespace() {
        assert_eq!(slug("World  History"), "world-history");
    }

    #[test]
    fn subject_deserializes_with_defaults() {
        let s: Subject = serde_json::from_str(r#"{"id":"1","name":"Math"}"#).unwrap();
        assert_eq!(s.level, ProficiencyLevel::Intermediate);
        assert_eq!(s.color, DEFAULT_COLOR);
        assert!(s.topics.is_empty());
    }

    #[test]
    fn subject_with_unknown_level_reads_as_intermediate() {
        let subjects: Vec<Subject> = serde_json::from_str(
            r#"[{"id":"1","name":"Math","level":"expert"},
                {"id":"2","name":"Art","level":"Beginner"}]"#,
        )
        .unwrap();
        assert_eq!(subjects[0].level, ProficiencyLevel::Intermediate);
        assert_eq!(subjects[1].level, ProficiencyLevel::Beginner);

        let json = serde_json::to_string(&subjects[1]).unwrap();
        assert!(json.contains(r#""level":"beginner""#));
    }

    #[test]
    fn first_topic_and_subtopic() {
        let s = Subject::new("1", "Math", ProficiencyLevel::Beginner).with_topic(Topic {
            id: "t".into(),
            name: "Algebra".into(),
            subtopics: vec!["Linear equations".into()],
        });
        assert_eq!(s.first_topic(), Some("Algebra"));
        assert_eq!(s.first_subtopic(), Some("Linear equations"));
    }
}
