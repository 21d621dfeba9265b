use anyhow::Result;
use tracing::{debug, info};

use crate::{
    storage::{
        document_store::DocumentStore,
        time_data::{load_time_store, save_time_store},
    },
    tracker::collection::session::Visit,
    utils::clock::Clock,
};

use super::module::EventProcessor;

/// Folds visits into the day-keyed [TimeStore](crate::storage::entities::TimeStore). Every
/// visit is a full read-modify-write of the stored document.
pub struct Aggregator<S: DocumentStore> {
    store: S,
    date_provider: Box<dyn Clock>,
    retain_days: Option<u32>,
}

impl<S: DocumentStore> Aggregator<S> {
    pub fn new(store: S, date_provider: Box<dyn Clock>) -> Self {
        Self {
            store,
            date_provider,
            retain_days: None,
        }
    }

    /// Days older than `retain_days` get pruned whenever something is recorded.
    pub fn with_retention(self, retain_days: Option<u32>) -> Self {
        Self {
            retain_days,
            ..self
        }
    }

    pub async fn record(&self, visit: &Visit) -> Result<()> {
        if visit.seconds == 0 {
            return Ok(());
        }
        let today = self.date_provider.today();

        let mut time_store = load_time_store(&self.store).await?;
        time_store.record(today, &visit.domain, visit.seconds, visit.category);

        if let Some(retain_days) = self.retain_days {
            let pruned = time_store.prune(today, retain_days);
            if pruned > 0 {
                info!("Pruned {pruned} days older than {retain_days} days");
            }
        }

        save_time_store(&self.store, &time_store).await?;
        debug!("Saved {today}: {:?}", time_store.day(today));
        Ok(())
    }
}

impl<S: DocumentStore> EventProcessor for Aggregator<S> {
    async fn process_next(&mut self, visit: Visit) -> Result<()> {
        self.record(&visit).await
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
