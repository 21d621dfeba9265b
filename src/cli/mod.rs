pub mod dashboard;
pub mod sync;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use dashboard::{process_dashboard_command, DashboardCommand};
use sync::{process_report_command, process_sync_command, RemoteCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    classify::Classifier,
    tracker::{collection::host::LinesHost, start_tracker, TrackerConfig},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, TRACKER_PREFIX},
    },
};

/// Name of the local store inside the application directory.
pub const STORE_FILE: &str = "storage.json";

const MAX_FLUSH_INTERVAL: u64 = 24 * 60 * 60;
const MAX_RETAIN_DAYS: i64 = 100 * 365;

#[derive(Parser, Debug)]
#[command(name = "sitetally", version, long_about = None)]
#[command(about = "Tracks time spent on websites and reports it", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level written to the log files")]
    log: Option<LevelFilter>,
    #[arg(long = "log-console", global = true, help = "Also print logs to stdout")]
    log_console: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(
        about = "Track the active tab. Reads browser events, one json object per line, from stdin"
    )]
    Track {
        #[arg(
            long,
            default_value_t = 60,
            value_name = "SECONDS",
            value_parser = clap::value_parser!(u64).range(1..=MAX_FLUSH_INTERVAL),
            help = "How often the open interval is persisted"
        )]
        flush_interval: u64,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=MAX_RETAIN_DAYS),
            help = "Drop days older than this many days"
        )]
        retain_days: Option<u32>,
    },
    #[command(about = "Show today's breakdown, the last week and the top domains")]
    Dashboard {
        #[command(flatten)]
        command: DashboardCommand,
    },
    #[command(about = "Print the category of each hostname")]
    Classify { hosts: Vec<String> },
    #[command(about = "Upload the local data to a reporting server")]
    Sync {
        #[command(flatten)]
        command: RemoteCommand,
    },
    #[command(about = "Print the weekly report kept by a reporting server")]
    Report {
        #[command(flatten)]
        command: RemoteCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, Ok)?;
    let prefix = match args.commands {
        Commands::Track { .. } => TRACKER_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir, args.log, args.log_console)?;

    let store_path = app_dir.join(STORE_FILE);
    match args.commands {
        Commands::Track {
            flush_interval,
            retain_days,
        } => {
            let config = TrackerConfig {
                store_path,
                flush_interval: Duration::from_secs(flush_interval),
                retain_days,
            };
            start_tracker(config, LinesHost::stdin()).await
        }
        Commands::Dashboard { command } => process_dashboard_command(command, &store_path).await,
        Commands::Classify { hosts } => {
            let classifier = Classifier::default();
            for host in hosts {
                println!("{host}\t{}", classifier.classify(&host));
            }
            Ok(())
        }
        Commands::Sync { command } => process_sync_command(command, &store_path).await,
        Commands::Report { command } => process_report_command(command).await,
    }
}
