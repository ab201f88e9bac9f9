use chrono::{Datelike, Duration, NaiveDate};
use clap::Subcommand;
use serde::Serialize;

use studycycle_core::WeeklyTotals;

use super::{open_ledger, print_json, today, CliResult};

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Print the daily log of one day
    Show {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Set the studied hours of a task
    Progress {
        task_id: String,
        /// Hours studied so far
        hours: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Override completion (defaults to whether planned hours are reached)
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task between done and not done
    Toggle {
        task_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Planned and studied hours for one week
    Week {
        /// First day of the week (default: Monday of the current week)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct WeekOutput {
    week_start: NaiveDate,
    #[serde(flatten)]
    totals: WeeklyTotals,
    progress_pct: f64,
}

pub fn run(action: LedgerAction) -> CliResult {
    let mut ledger = open_ledger()?;

    match action {
        LedgerAction::Show { date } => {
            let date = date.unwrap_or_else(today);
            match ledger.get_day(date) {
                Some(log) => print_json(log)?,
                None => return Err(format!("no daily log for {date}").into()),
            }
        }
        LedgerAction::Progress {
            task_id,
            hours,
            date,
            completed,
        } => {
            let date = date.unwrap_or_else(today);
            let log = ledger.update_task_progress(date, &task_id, hours, completed)?;
            print_json(log)?;
        }
        LedgerAction::Toggle { task_id, date } => {
            let date = date.unwrap_or_else(today);
            let log = ledger.toggle_task_completion(date, &task_id)?;
            print_json(log)?;
        }
        LedgerAction::Week { start } => {
            let week_start = start.unwrap_or_else(|| {
                let now = today();
                now - Duration::days(i64::from(now.weekday().num_days_from_monday()))
            });
            let totals = ledger.weekly_totals(week_start);
            let progress_pct = if totals.planned_hours > 0.0 {
                (totals.studied_hours / totals.planned_hours * 100.0).min(100.0)
            } else {
                0.0
            };
            print_json(&WeekOutput {
                week_start,
                totals,
                progress_pct,
            })?;
        }
    }
    Ok(())
}
