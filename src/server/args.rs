use std::{net::IpAddr, path::PathBuf};

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "sitetally-server", version)]
#[command(about = "Serves per-user browsing aggregates over a JSON API", long_about = None)]
pub struct ServerArgs {
    #[arg(long, default_value = "0.0.0.0", env = "SITETALLY_HOST")]
    pub host: IpAddr,
    #[arg(long, default_value_t = 3000, env = "SITETALLY_PORT")]
    pub port: u16,
    #[arg(long, help = "Document store file. Defaults to db.json inside the application directory")]
    pub db: Option<PathBuf>,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
