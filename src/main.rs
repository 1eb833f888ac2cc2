//! # Lunar Almanac Application Entry Point
//!
//! This binary prints a lunar almanac for the observer configured in
//! lunar-config.toml: the current phase and illumination, the next four
//! principal phases, a moonrise/moonset table and, on request, an ASCII
//! chart of the illuminated fraction. `--json` emits the same data as JSON.
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to trace the
//! horizon searches.

// Test modules
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, TimeZone, Utc};
use clap::Parser;
use log::debug;

use lunar_almanac_lib::{
    config::{Config, CONFIG_FILE},
    renderer::{draw_ascii, render_almanac, Almanac},
    series::illumination_series,
};

/// Moon phases, illumination and moonrise/moonset for one observer.
#[derive(Debug, Parser)]
#[command(name = "lunar-almanac", version, about)]
struct Args {
    /// First civil day of the report (YYYY-MM-DD); defaults to today in the observer's zone
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Number of days in the moonrise/moonset table
    #[arg(long)]
    days: Option<u32>,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Print the almanac as JSON
    #[arg(long)]
    json: bool,

    /// Append an ASCII chart of the illuminated fraction
    #[arg(long)]
    chart: bool,
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = Config::load_from_path(&args.config);
    let lunar_time = config
        .lunar_time()
        .context("configured observer is not usable")?;
    let zone = *lunar_time.zone();

    // Reference instant: now, or local midnight of the requested day
    let (reference, first_day) = match args.date {
        Some(date) => {
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .context("requested date has no midnight")?;
            let start = zone
                .from_local_datetime(&midnight)
                .earliest()
                .with_context(|| format!("local midnight of {date} does not exist in {zone}"))?;
            (start.with_timezone(&Utc), date)
        }
        None => {
            let now = Utc::now();
            (now, now.with_timezone(&zone).date_naive())
        }
    };
    let days = args.days.unwrap_or(config.report.days);
    debug!("almanac for {first_day} ({days} days), reference {reference}");

    let almanac = Almanac::compute(
        &config.observer.name,
        &lunar_time,
        reference,
        first_day,
        days,
        config.report.precision,
    )
    .context("failed to compute almanac")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&almanac)?);
        return Ok(());
    }

    print!("{}", render_almanac(&almanac));

    if args.chart {
        let window_hours = i16::try_from(u32::from(config.report.chart_window_days) * 24)
            .context("chart window too wide")?;
        let series = illumination_series(Some(reference), window_hours, 24)?;
        println!();
        draw_ascii(&series);
    }

    Ok(())
}
