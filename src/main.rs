use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use activity_counts_rs::{convert, tabular, Mode};

#[derive(Parser, Debug)]
#[command(name = "activity_counts")]
#[command(about = "Convert raw accelerometer recordings into activity counts", long_about = None)]
struct Args {
    /// Input recording (.csv or .csv.gz) with X, Y, Z columns
    input: PathBuf,

    /// Output CSV for the epoch counts
    output: PathBuf,

    /// Sampling frequency of the recording in Hz (30-100 in steps of 10)
    #[arg(long, default_value = "30")]
    frequency: u32,

    /// Epoch length in seconds
    #[arg(long, default_value = "60")]
    epoch: u32,

    /// Enable the low-frequency extension
    #[arg(long)]
    lfe: bool,

    /// Execution mode (fast, reference)
    #[arg(long, default_value = "fast")]
    mode: String,

    /// Timestamp column to carry into the output
    #[arg(long)]
    time_column: Option<String>,

    /// Write a JSON run summary next to the output
    #[arg(long)]
    summary: bool,
}

#[derive(Serialize)]
struct RunSummary {
    input: String,
    samples: usize,
    frequency: u32,
    epoch_seconds: u32,
    lfe: bool,
    mode: String,
    epochs: usize,
    axis_totals: [i64; 3],
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mode = match args.mode.as_str() {
        "fast" => Mode::Fast,
        "reference" => Mode::Reference,
        other => anyhow::bail!("unknown mode {:?} (expected fast or reference)", other),
    };

    println!("[{}] Reading {}", ts_now(), args.input.display());
    let table = tabular::read_raw_table(&args.input, args.time_column.as_deref())?;
    println!("  Samples: {} at {} Hz", table.series.len(), args.frequency);
    println!(
        "  Epoch: {} s  LFE: {}  Mode: {}",
        args.epoch,
        args.lfe,
        mode.as_str()
    );

    println!("[{}] Converting to counts", ts_now());
    let counts = convert(&table.series, args.frequency, args.epoch, args.lfe, mode)?;

    let stamps = if args.time_column.is_some() {
        tabular::align_timestamps(&table.timestamps, args.epoch, counts.num_epochs())?
    } else {
        Vec::new()
    };

    tabular::write_counts_table(&args.output, &counts, &stamps, args.time_column.as_deref())?;
    println!(
        "[{}] Wrote {} epochs to {}",
        ts_now(),
        counts.num_epochs(),
        args.output.display()
    );

    if args.summary {
        let summary = RunSummary {
            input: args.input.display().to_string(),
            samples: table.series.len(),
            frequency: args.frequency,
            epoch_seconds: args.epoch,
            lfe: args.lfe,
            mode: mode.as_str().to_string(),
            epochs: counts.num_epochs(),
            axis_totals: counts.axis_totals(),
        };
        let path = args.output.with_extension("summary.json");
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)?;
        println!("[{}] Summary written to {}", ts_now(), path.display());
    }

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
