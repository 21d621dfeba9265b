use std::{path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::{
    server::handlers::{SaveDataBody, SaveDataResponse},
    storage::{
        document_store::JsonFileStore,
        entities::{DailySummary, TimeStore},
        time_data::load_time_store,
    },
    utils::time::{display_day, format_seconds},
};

#[derive(Debug, Parser)]
pub struct RemoteCommand {
    #[arg(
        long,
        env = "SITETALLY_SERVER",
        default_value = "http://localhost:3000",
        help = "Base url of the reporting server"
    )]
    server: Url,
    #[arg(long, help = "User the data belongs to on the server")]
    user: String,
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{base} can't be used as a server url"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(10)).build()?)
}

/// Uploads every day of `time_store`. Days already on the server are replaced by ours.
pub async fn push_time_store(
    client: &Client,
    server: &Url,
    user_id: &str,
    time_store: &TimeStore,
) -> Result<()> {
    let url = endpoint(server, &["api", "save-data"])?;
    debug!("Posting {} days to {url}", time_store.0.len());

    let body = SaveDataBody {
        user_id: user_id.to_string(),
        time_data: time_store.clone(),
    };
    let response = client
        .post(url.clone())
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Server rejected the upload with {status}");
    }
    let response: SaveDataResponse = response.json().await?;
    if !response.success {
        bail!("Server didn't accept the upload");
    }
    Ok(())
}

pub async fn fetch_weekly_report(
    client: &Client,
    server: &Url,
    user_id: &str,
) -> Result<Vec<DailySummary>> {
    let url = endpoint(server, &["api", "weekly-report", user_id])?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    match response.status() {
        StatusCode::NOT_FOUND => bail!("User not found"),
        status if !status.is_success() => bail!("Server answered with {status}"),
        _ => Ok(response.json().await?),
    }
}

fn format_report(report: &[DailySummary]) -> String {
    let mut lines = vec![format!(
        "{:>7}  {:>12}  {:>12}  {:>12}",
        "Day", "Productive", "Unproductive", "Neutral"
    )];
    lines.extend(report.iter().map(|day| {
        format!(
            "{:>7}  {:>12}  {:>12}  {:>12}",
            display_day(&day.date),
            format_seconds(day.productive),
            format_seconds(day.unproductive),
            format_seconds(day.neutral)
        )
    }));
    lines.join("\n")
}

/// Command to process `sync`. Sends the local store to the server.
pub async fn process_sync_command(
    RemoteCommand { server, user }: RemoteCommand,
    store_path: &Path,
) -> Result<()> {
    let time_store = load_time_store(&JsonFileStore::new(store_path.to_path_buf())).await?;
    if time_store.is_empty() {
        println!("Nothing to sync yet");
        return Ok(());
    }

    push_time_store(&http_client()?, &server, &user, &time_store).await?;
    info!("Synced {} days for {user}", time_store.0.len());
    println!("Synced {} days to {server}", time_store.0.len());
    Ok(())
}

/// Command to process `report`. Prints the weekly summary kept by the server.
pub async fn process_report_command(RemoteCommand { server, user }: RemoteCommand) -> Result<()> {
    let report = fetch_weekly_report(&http_client()?, &server, &user).await?;
    println!("{}", format_report(&report));
    Ok(())
}
