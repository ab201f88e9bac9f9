//! # studycycle Core Library
//!
//! Core logic for planning recurring study sessions across subjects and
//! tracking completion over time. The `studycycle` CLI is a thin layer over
//! this crate; everything it does is available here.
//!
//! ## Architecture
//!
//! - **Cycle Scheduler**: Greedy, weight-driven distribution of subjects over
//!   a 14-day rotation under per-day hour and task limits
//! - **Progress Ledger**: Per-day task progress with idempotent seeding and
//!   all-or-nothing writes through a pluggable store
//! - **Sync Coordinator**: Seeds the ledger from a rotation with a bounded
//!   retry budget
//! - **Session Timer**: A tick-driven state machine; the caller invokes
//!   `tick()` once per second
//! - **Storage**: SQLite for the plan, ledger and sessions; TOML for config
//!
//! ## Key Components
//!
//! - [`CycleScheduler`]: Rotation generation
//! - [`ProgressLedger`]: Daily progress tracking
//! - [`SyncCoordinator`]: Rotation to ledger reconciliation
//! - [`SessionTimer`]: Study/break state machine
//! - [`Database`]: Persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod ledger;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod sync;
pub mod timer;

pub use error::{ConfigError, CoreError, LedgerError, StorageError, SyncError, TimerError, ValidationError};
pub use events::Event;
pub use ledger::{DailyStudyLog, LedgerStore, MemoryStore, ProgressLedger, ProgressSink, WeeklyTotals};
pub use schedule::{ProficiencyLevel, StudyTask, Subject, TaskPriority, Topic};
pub use scheduler::{generate_cycle, weekly_load, CycleConfig, CycleDay, CycleScheduler, FocusMode, WeeklyLoad};
pub use storage::{Config, Database, PlanRecord};
pub use sync::{ReconcileReport, SyncCoordinator};
pub use timer::{
    BreakKind, Clock, SessionHistory, SessionTimer, StartRequest, StudySession, TimerSettings,
    TimerSnapshot, TimerState,
};
