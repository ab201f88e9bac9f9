use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use studycycle_core::scheduler::{weekly_load, FocusMode, WeeklyLoad};
use studycycle_core::{
    generate_cycle, Config, PlanRecord, ProficiencyLevel, ReconcileReport, Subject,
    SyncCoordinator,
};

use super::{open_ledger, print_json, today, CliResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Generate a rotation from subjects given on the command line
    Generate {
        /// Subject as NAME or NAME:LEVEL (beginner, intermediate, advanced). Repeatable.
        #[arg(long = "subject", required = true)]
        subjects: Vec<String>,
        #[command(flatten)]
        options: PlanOptions,
    },
    /// Generate a rotation from a JSON file holding a list of subjects
    Load {
        path: PathBuf,
        #[command(flatten)]
        options: PlanOptions,
    },
    /// Print the stored plan
    Show,
}

#[derive(Args)]
pub struct PlanOptions {
    /// Study hours per week (default from config)
    #[arg(long)]
    weekly_hours: Option<f64>,
    /// balanced, priority or difficulty (default from config)
    #[arg(long)]
    focus_mode: Option<FocusMode>,
    /// First day of the rotation (YYYY-MM-DD, default today)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Only schedule the heaviest `cycle.subjects_per_cycle` subjects
    #[arg(long)]
    top_only: bool,
    /// Allow a subject on two days in a row
    #[arg(long)]
    allow_consecutive: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    plan: &'a PlanRecord,
    sync: ReconcileReport,
    first_week: WeeklyLoad,
}

pub fn run(action: PlanAction) -> CliResult {
    match action {
        PlanAction::Generate { subjects, options } => {
            let subjects = subjects
                .iter()
                .enumerate()
                .map(|(i, spec)| parse_subject(i, spec))
                .collect::<Result<Vec<_>, _>>()?;
            generate(subjects, options)
        }
        PlanAction::Load { path, options } => {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            let subjects: Vec<Subject> = serde_json::from_str(&content)?;
            generate(subjects, options)
        }
        PlanAction::Show => {
            let ledger = open_ledger()?;
            match ledger.store().load_plan()? {
                Some(plan) => print_json(&plan),
                None => Err("no plan yet; run `studycycle plan generate`".into()),
            }
        }
    }
}

fn generate(subjects: Vec<Subject>, options: PlanOptions) -> CliResult {
    let config = Config::load()?;
    let weekly_hours = options.weekly_hours.unwrap_or(config.cycle.weekly_hours);
    if !(weekly_hours > 0.0) {
        return Err(format!("weekly hours must be positive, got {weekly_hours}").into());
    }

    let mut cycle_config = config.cycle.cycle_config();
    if let Some(mode) = options.focus_mode {
        cycle_config.focus_mode = mode;
    }
    if options.top_only {
        cycle_config.force_all_subjects = false;
    }
    if options.allow_consecutive {
        cycle_config.avoid_consecutive = false;
    }
    let start = options.start.unwrap_or_else(today);

    let cycle = generate_cycle(&subjects, weekly_hours, &cycle_config);
    if cycle.is_empty() {
        return Err("no subjects to schedule".into());
    }

    let mut ledger = open_ledger()?;
    if let Some(old) = ledger.store().load_plan()? {
        let removed = ledger.remove_range(old.start_date, old.cycle.len())?;
        info!(plan = %old.id, removed, "replacing previous plan");
    }

    let plan = PlanRecord::new(start, weekly_hours, cycle_config, subjects, cycle);
    ledger.store().save_plan(&plan)?;

    let sync = SyncCoordinator::new(config.sync.max_attempts)
        .reconcile(&mut ledger, &plan.cycle, start)?;
    let first_week = weekly_load(&plan.cycle, weekly_hours);

    print_json(&PlanOutput {
        plan: &plan,
        sync,
        first_week,
    })
}

fn parse_subject(index: usize, spec: &str) -> Result<Subject, String> {
    let (name, level) = match spec.rsplit_once(':') {
        Some((name, level)) => (name.trim(), level.parse::<ProficiencyLevel>().unwrap_or_default()),
        None => (spec.trim(), ProficiencyLevel::default()),
    };
    if name.is_empty() {
        return Err(format!("subject '{spec}' has no name"));
    }
    Ok(Subject::new(format!("subject-{}", index + 1), name, level))
}
