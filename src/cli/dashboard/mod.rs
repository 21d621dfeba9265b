pub mod render;
pub mod view;

use std::{
    fmt::Display,
    io::{IsTerminal, Write},
    path::Path,
    time::Duration,
};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use render::Renderer;
use tracing::{error, info};
use view::DashboardView;

use crate::{
    storage::{document_store::JsonFileStore, entities::TimeStore, time_data::load_time_store},
    utils::clock::{Clock, DefaultClock},
};

use super::Args;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const LOAD_ERROR: &str = "Error loading data";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct DashboardCommand {
    #[arg(
        long,
        help = "Day shown as today. Examples are \"yesterday\", \"3 days ago\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Redraw the dashboard every SECONDS until interrupted"
    )]
    watch: Option<u64>,
    #[arg(long, help = "Disable colours even when printing to a terminal")]
    no_color: bool,
}

/// Resolves the day the user asked for. The calendar date typed in is used as the day key
/// as is.
fn reference_day(date: &str, date_style: DateStyle) -> Result<NaiveDate> {
    match parse_date_string(date, Local::now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
    }
}

/// Loads the local store and draws one frame. A store that can't be read is drawn as an
/// empty one below the error banner instead of failing the command.
pub async fn draw(store: &JsonFileStore, today: NaiveDate, renderer: &Renderer) -> String {
    match load_time_store(store).await {
        Ok(time_store) => renderer.render(&DashboardView::build(&time_store, today)),
        Err(e) => {
            error!("Failed to load time data from {:?} {e:?}", store.path());
            format!(
                "{}\n\n{}",
                renderer.error_banner(LOAD_ERROR),
                renderer.render(&DashboardView::build(&TimeStore::default(), today))
            )
        }
    }
}

/// Command to process `dashboard`. Prints today's breakdown, the last week and the top
/// domains of the local store.
pub async fn process_dashboard_command(
    DashboardCommand {
        date,
        date_style,
        watch,
        no_color,
    }: DashboardCommand,
    store_path: &Path,
) -> Result<()> {
    let fixed_day = date
        .map(|date| reference_day(&date, date_style))
        .transpose()?;
    let renderer = Renderer::new(!no_color && std::io::stdout().is_terminal());
    let store = JsonFileStore::new(store_path.to_path_buf());

    let Some(seconds) = watch else {
        let today = fixed_day.unwrap_or_else(|| DefaultClock.today());
        print!("{}", draw(&store, today, &renderer).await);
        return Ok(());
    };

    info!("Watching {store_path:?} every {seconds}s");
    let mut interval = tokio::time::interval(Duration::from_secs(seconds.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let today = fixed_day.unwrap_or_else(|| DefaultClock.today());
                let frame = draw(&store, today, &renderer).await;
                let mut stdout = std::io::stdout().lock();
                write!(stdout, "{CLEAR_SCREEN}{frame}")?;
                stdout.flush()?;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
