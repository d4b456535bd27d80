//! `viddup`: find near-duplicate videos in a media library. A single
//! binary with one subcommand per verb, using `clap::Subcommand` to frame
//! each verb as a case of one CLI rather than a separate `[[bin]]` target.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use viddup_core::Config;

mod cancellation;
mod commands;
mod sidecar;

#[derive(Parser)]
#[command(name = "viddup", about = "Find near-duplicate videos in a media library", version)]
struct Cli {
    /// Path to the library's SQLite database file.
    #[arg(long, global = true, env = "VIDDUP_DB", default_value = "./viddup.db")]
    db: PathBuf,

    /// Optional TOML configuration file, layered on top of built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity; repeat for more detail (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a directory and ingest any new video files found.
    Ingest {
        dir: PathBuf,
        /// Comma-separated extension list, overriding the configured set.
        #[arg(long = "exts", value_delimiter = ',')]
        extensions: Option<Vec<String>>,
    },
    /// Run the search pass and print duplicate clusters.
    Search {
        #[arg(long)]
        len: Option<usize>,
        #[arg(long = "scene")]
        scene_cap_secs: Option<f64>,
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        step: Option<usize>,
        #[arg(long = "trim-start")]
        trim_start_secs: Option<f64>,
        #[arg(long = "trim-end")]
        trim_end_secs: Option<f64>,
        #[arg(long)]
        backend: Option<String>,
    },
    /// Record a whitelist clique over the listed files.
    Whitelist { files: Vec<PathBuf> },
    /// Report, or with --delete apply, removal of records for files that
    /// no longer exist on disk.
    Purge {
        #[arg(long)]
        delete: bool,
    },
    /// Re-probe files with missing or drifted metadata and update them.
    FixMetadata,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let cancelled = cancellation::install();

    match cli.command {
        Command::Ingest { dir, extensions } => {
            if let Some(exts) = extensions {
                config.store.extensions = exts;
            }
            config.validate()?;
            commands::ingest::run(&cli.db, &config, &dir, &cancelled)
        }
        Command::Search {
            len,
            scene_cap_secs,
            radius,
            step,
            trim_start_secs,
            trim_end_secs,
            backend,
        } => {
            if let Some(v) = len {
                config.window.window_len = v;
            }
            if let Some(v) = scene_cap_secs {
                config.window.scene_cap_secs = v;
            }
            if let Some(v) = radius {
                config.search.radius = v;
            }
            if let Some(v) = step {
                config.search.step = v;
            }
            if let Some(v) = trim_start_secs {
                config.window.trim_start_secs = v;
            }
            if let Some(v) = trim_end_secs {
                config.window.trim_end_secs = v;
            }
            if let Some(v) = backend {
                config.search.backend = v;
            }
            config.validate()?;
            commands::search::run(&cli.db, &config, &cancelled)
        }
        Command::Whitelist { files } => commands::whitelist::run(&cli.db, &config, &files),
        Command::Purge { delete } => commands::purge::run(&cli.db, &config, delete),
        Command::FixMetadata => commands::fix_metadata::run(&cli.db, &config),
    }
}
