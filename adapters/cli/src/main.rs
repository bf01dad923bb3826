#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays tactics grid scenarios.

mod scenario;

use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

use crate::scenario::{Report, Scenario};

/// Replays a JSON scenario against a fresh battle and prints the final board.
#[derive(Debug, Parser)]
#[command(name = "tactics-grid", version)]
struct Args {
    /// Path to the JSON scenario to replay.
    scenario: PathBuf,
    /// Overrides the terrain seed stored in the scenario.
    #[arg(long)]
    seed: Option<u64>,
    /// Format used for the final report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Raises log verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Entry point for the tactics grid command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(seed) = args.seed {
        scenario.terrain_seed = seed;
    }

    let report = scenario.replay();
    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()?;
    Ok(())
}

fn render_text(report: &Report) -> String {
    let mut text = format!("terrain: {:?} ({}x{})\n", report.terrain, report.size, report.size);

    text.push_str("\nevents:\n");
    for event in &report.events {
        text.push_str(&format!("  {event:?}\n"));
    }

    text.push_str("\nboard:\n");
    text.push_str(&report.board);

    push_rows(&mut text, "matrix", &report.matrix);
    push_rows(&mut text, "lower aggression", &report.lower_aggression);
    push_rows(&mut text, "upper aggression", &report.upper_aggression);

    let engaged: Vec<String> = report.engaged.iter().map(ToString::to_string).collect();
    text.push_str(&format!("\nengaged: [{}]\n", engaged.join(", ")));
    text
}

fn push_rows(text: &mut String, title: &str, rows: &[Vec<i32>]) {
    text.push_str(&format!("\n{title}:\n"));
    for row in rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        text.push_str(&cells.join(" "));
        text.push('\n');
    }
}
