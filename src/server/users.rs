use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{
    document_store::DocumentStore,
    entities::{DailySummary, TimeStore},
};

use super::error::ReportError;

/// Number of days in the weekly report.
pub const REPORT_DAYS: usize = 7;

/// The document kept for every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub time_data: TimeStore,
}

/// Per-user reads and merges on top of a [DocumentStore]. Saves are a plain
/// read-modify-write, concurrent saves for the same user may lose each other's days.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn find(&self, user_id: &str) -> Result<Option<UserRecord>, ReportError> {
        let Some(document) = self.store.load(user_id).await? else {
            return Ok(None);
        };
        let record: UserRecord = serde_json::from_value(document)
            .with_context(|| format!("Stored record of {user_id} is malformed"))?;
        Ok(Some(record))
    }

    /// Creates the user when needed and overlays the given days onto the stored ones.
    pub async fn save(&self, user_id: &str, time_data: TimeStore) -> Result<(), ReportError> {
        let mut record = match self.find(user_id).await? {
            Some(record) => record,
            None => {
                info!("Creating user {user_id}");
                UserRecord {
                    user_id: user_id.to_string(),
                    time_data: TimeStore::default(),
                }
            }
        };

        debug!("Merging {} days for {user_id}", time_data.0.len());
        record.time_data.overlay(time_data);

        let document = serde_json::to_value(&record).context("Failed to serialize user")?;
        self.store.save(user_id, document).await?;
        Ok(())
    }

    pub async fn time_data(&self, user_id: &str) -> Result<TimeStore, ReportError> {
        self.find(user_id)
            .await?
            .map(|record| record.time_data)
            .ok_or(ReportError::UserNotFound)
    }

    /// The most recent days, oldest first. Users with fewer days get fewer rows.
    pub async fn weekly_report(&self, user_id: &str) -> Result<Vec<DailySummary>, ReportError> {
        let time_data = self.time_data(user_id).await?;
        Ok(time_data.recent_summaries(REPORT_DAYS))
    }
}
