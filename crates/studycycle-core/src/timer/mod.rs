mod engine;
mod session;
mod settings;

pub use engine::{SessionTimer, StartRequest, TimerSnapshot, TimerState};
pub use session::{HistorySummary, SessionHistory, StudySession};
pub use settings::{BreakKind, Clock, ManualClock, SystemClock, TimerSettings};
