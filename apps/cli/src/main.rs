#![deny(warnings)]

//! Headless CLI: load a ramp configuration, run the simulation, and
//! report the monthly ledger.
//!
//! The binary only consumes the engine's output sequence; nothing here
//! feeds back into the simulation.

use anyhow::{Context, Result};
use ramp_core::{MonthlyRecord, SimulationConfig};
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<String>,
    months: Option<u32>,
    csv: Option<String>,
    quiet: bool,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        months: None,
        csv: None,
        quiet: false,
        version: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--months" => args.months = it.next().and_then(|s| s.parse().ok()),
            "--csv" => args.csv = it.next(),
            "--quiet" => args.quiet = true,
            "--version" => args.version = true,
            _ => {}
        }
    }
    args
}

/// Load a configuration file, picking the format by extension
/// (`.yaml`/`.yml` for YAML, anything else parsed as JSON).
fn load_config(path: &str) -> Result<SimulationConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let config = match ext {
        "yaml" | "yml" => {
            serde_yaml::from_str(&raw).with_context(|| format!("parsing {path} as YAML"))?
        }
        _ => serde_json::from_str(&raw).with_context(|| format!("parsing {path} as JSON"))?,
    };
    Ok(config)
}

fn write_csv(path: &str, records: &[MonthlyRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_table(records: &[MonthlyRecord]) {
    println!(
        "{:<9} {:>8} {:>9} {:>9} {:>8} {:>10} {:>8} {:>9} {:>12} {:>13} {:>12}",
        "Month",
        "Furnaces",
        "Fixtures",
        "Limiter",
        "Boards",
        "CumBoards",
        "Modules",
        "CumMods",
        "FurnaceSpend",
        "FixtureSpend",
        "CumSpend"
    );
    for r in records {
        println!(
            "{:<9} {:>8} {:>9} {:>9} {:>8} {:>10} {:>8} {:>9} {:>12} {:>13} {:>12}",
            r.month_label,
            r.online_furnaces,
            r.cumulative_fixtures_fabricated,
            r.limiter.to_string(),
            r.boards,
            r.cumulative_boards,
            r.modules,
            r.cumulative_modules,
            r.furnace_spend_usd.to_string(),
            r.fixture_spend_usd.to_string(),
            r.cumulative_spend_usd.to_string()
        );
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    if args.version {
        println!("ramp {} ({})", env!("GIT_SHA"), env!("BUILD_DATE"));
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(months) = args.months {
        config.horizon_months = months;
    }
    info!(
        config_file = ?args.config,
        months = config.horizon_months,
        furnace_limit = config.total_furnace_limit,
        "starting ramp simulation"
    );

    let records = ramp_engine::run(config.clone())?;

    if !args.quiet {
        print_table(&records);
    }
    if let Some(path) = &args.csv {
        write_csv(path, &records)?;
        info!(rows = records.len(), path = %path, "ledger exported");
    }

    if let Some(last) = records.last() {
        println!(
            "Ramp OK | months: {} | furnaces online: {}/{} | boards: {} | modules: {} | total spend: ${}",
            records.len(),
            last.online_furnaces,
            config.total_furnace_limit,
            last.cumulative_boards,
            last.cumulative_modules,
            last.cumulative_spend_usd
        );
    }

    Ok(())
}
