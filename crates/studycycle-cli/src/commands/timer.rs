use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use studycycle_core::timer::HistorySummary;
use studycycle_core::{
    Config, Database, Event, ProgressLedger, SessionTimer, StartRequest, StudySession, TimerState,
};

use super::{open_ledger, print_json, today, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run one study session (and its break) in the foreground
    Run {
        /// Ledger task to credit; its subject is used when --subject is absent
        #[arg(long)]
        task: Option<String>,
        /// Subject to study
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        /// Ledger day of the task (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Study length in minutes (default from config)
        #[arg(long)]
        minutes: Option<u32>,
        /// Exit when the study interval ends instead of running the break
        #[arg(long)]
        skip_break: bool,
    },
    /// Print recorded sessions and their totals
    History {
        /// Only the last N sessions
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct HistoryOutput<'a> {
    summary: HistorySummary,
    sessions: &'a [StudySession],
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            task,
            subject,
            topic,
            date,
            minutes,
            skip_break,
        } => {
            let mut settings = Config::load()?.timer;
            if let Some(minutes) = minutes {
                settings.study_minutes = minutes;
            }
            let mut ledger = open_ledger()?;
            let date = date.unwrap_or_else(today);

            let subject = match (subject, &task) {
                (Some(subject), _) => subject,
                (None, Some(task_id)) => ledger
                    .get_day(date)
                    .and_then(|log| log.task(task_id))
                    .map(|t| t.subject.clone())
                    .ok_or_else(|| format!("task '{task_id}' not found for {date}"))?,
                (None, None) => return Err("give --subject or --task".into()),
            };
            let mut request = StartRequest::new(subject).on(date);
            if let Some(task_id) = task {
                request = request.task(task_id);
            }
            if let Some(topic) = topic {
                request = request.topic(topic);
            }

            let mut timer = SessionTimer::new(settings);
            emit(&timer.start(request)?, ledger.store())?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(drive(&mut timer, &mut ledger, skip_break))
        }
        TimerAction::History { limit } => {
            let ledger = open_ledger()?;
            let history = ledger.store().sessions()?;
            let sessions = history.sessions();
            let shown = match limit {
                Some(n) => &sessions[sessions.len().saturating_sub(n)..],
                None => sessions,
            };
            print_json(&HistoryOutput {
                summary: history.summary(),
                sessions: shown,
            })
        }
    }
}

/// Feed the timer one tick per second until it returns to idle or the user
/// interrupts.
async fn drive(
    timer: &mut SessionTimer,
    ledger: &mut ProgressLedger<Database>,
    skip_break: bool,
) -> CliResult {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick of a tokio interval fires immediately.
    interval.tick().await;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    while timer.state() != TimerState::Idle {
        tokio::select! {
            _ = &mut interrupted => {
                debug!("interrupted");
                if let Some(event) = timer.stop(ledger)? {
                    emit(&event, ledger.store())?;
                }
                break;
            }
            _ = interval.tick() => {
                let Some(event) = timer.tick(ledger)? else {
                    continue;
                };
                emit(&event, ledger.store())?;
                if skip_break && matches!(event, Event::SessionCompleted { .. }) {
                    if let Some(skipped) = timer.stop(ledger)? {
                        emit(&skipped, ledger.store())?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Persist the session an event closes, then print the event as one JSON line.
fn emit(event: &Event, db: &Database) -> studycycle_core::error::Result<()> {
    if let Some(session) = event.session() {
        db.record_session(session)?;
        debug!(session = %session.id, "recorded session");
    }
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use studycycle_core::{BreakKind, CoreError};

    fn completed_event() -> Event {
        let start = Utc::now() - ChronoDuration::minutes(25);
        Event::SessionCompleted {
            session: StudySession {
                id: "s1".into(),
                subject: "Physics".into(),
                topic: None,
                subtopic: None,
                start_time: start,
                end_time: Some(start + ChronoDuration::minutes(25)),
                duration_minutes: 25,
                completed: true,
                task_id: Some("t1".into()),
                date: None,
            },
            break_kind: BreakKind::Short,
            break_secs: 300,
            at: Utc::now(),
        }
    }

    #[test]
    fn emit_records_the_closed_session() {
        let db = Database::open_memory().unwrap();
        emit(&completed_event(), &db).unwrap();

        let history = db.sessions().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.sessions()[0].id, "s1");
        assert_eq!(history.sessions()[0].duration_minutes, 25);
    }

    #[test]
    fn emit_fails_when_history_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studycycle.db");
        let db = Database::open_at(&path).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE sessions")
            .unwrap();

        let err = emit(&completed_event(), &db).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)), "got {err}");
    }
}
