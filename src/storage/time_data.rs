use anyhow::{Context, Result};

use super::{document_store::DocumentStore, entities::TimeStore};

/// Key the local [TimeStore] lives under.
pub const TIME_DATA_KEY: &str = "timeData";

pub async fn load_time_store(store: &(impl DocumentStore + ?Sized)) -> Result<TimeStore> {
    match store.load(TIME_DATA_KEY).await? {
        Some(document) => {
            serde_json::from_value(document).context("Stored time data has an unexpected shape")
        }
        None => Ok(TimeStore::default()),
    }
}

pub async fn save_time_store(
    store: &(impl DocumentStore + ?Sized),
    time_store: &TimeStore,
) -> Result<()> {
    store
        .save(TIME_DATA_KEY, serde_json::to_value(time_store)?)
        .await
}
