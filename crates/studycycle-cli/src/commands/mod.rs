pub mod config;
pub mod ledger;
pub mod plan;
pub mod timer;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use studycycle_core::{Database, ProgressLedger};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Open the database and load the ledger it holds.
pub fn open_ledger() -> studycycle_core::error::Result<ProgressLedger<Database>> {
    let db = Database::open()?;
    Ok(ProgressLedger::open(db)?)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
