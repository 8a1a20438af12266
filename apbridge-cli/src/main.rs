use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use apbridge_core::transcript::{self, ReplayReport};
use apbridge_core::{BridgeConfig, ItemTable, Result};

#[derive(Debug, Parser)]
#[command(name = "apbridge", version, about = "Pokeclicker Archipelago bridge tools")]
struct Args {
    /// Log every dispatched item.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the category and effect of item ids.
    Classify {
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
    },
    /// Print the item id ranges.
    Table,
    /// Replay transcripts (files or directories) against a simulated game.
    Replay {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Bridge config file; defaults to the per-user config.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        server: Option<String>,

        #[arg(long)]
        player: Option<String>,

        /// Print full reports as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) -> std::result::Result<(), fern::InitError> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn classify(ids: &[i64]) {
    let table = ItemTable::standard();
    for id in ids {
        println!("{id}\t{}\t{}", table.classify(*id), table.describe(*id));
    }
}

fn print_table() {
    let table = ItemTable::standard();
    for range in table.ranges() {
        let upper = if range.upper == i64::MAX {
            "inf".to_string()
        } else {
            range.upper.to_string()
        };
        println!(
            "[{}, {})\t{}\t{} entries",
            range.lower,
            upper,
            range.category,
            range.entry_count()
        );
    }
}

fn load_config(
    path: Option<&Path>,
    server: Option<String>,
    player: Option<String>,
) -> Result<BridgeConfig> {
    let mut config = match path {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::load_or_default(),
    };
    if let Some(server) = server {
        config.server_url = server;
    }
    if let Some(player) = player {
        config.player_name = player;
    }
    config.validate()?;
    Ok(config)
}

fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(transcript::collect(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn print_summary(report: &ReplayReport) {
    println!("{}", report.name);
    println!(
        "  items: {} applied, {} duplicate, {} unknown, {} still queued, {} failed",
        report.applied, report.duplicates, report.unknown, report.queued, report.failed
    );
    println!("  packets sent: {}", report.sent.len());
    for (location, delivery) in &report.checks {
        println!("  check {location}: {delivery}");
    }
    for notification in &report.notifications {
        println!("  {:?}: {}", notification.kind, notification.message);
    }
    for (key, value) in &report.flags {
        println!("  {key} = {value}");
    }
    if report.victory {
        println!("  goal reached");
    }
}

fn replay(paths: &[PathBuf], config: &BridgeConfig, json: bool) -> Result<()> {
    let files = expand(paths)?;
    if files.is_empty() {
        log::warn!("no transcripts found");
    }
    for file in files {
        let transcript = transcript::load(&file)?;
        let report = transcript::replay(&transcript, config)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_summary(&report);
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Classify { ids } => classify(&ids),
        Command::Table => print_table(),
        Command::Replay {
            paths,
            config,
            server,
            player,
            json,
        } => {
            let config = load_config(config.as_deref(), server, player)?;
            replay(&paths, &config, json)?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(err) = init_logging(args.verbose) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
