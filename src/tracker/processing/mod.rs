use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use crate::tracker::collection::session::Visit;

pub mod aggregate;
pub mod module;

/// Receives visits from the tracker and hands them to a processor. A visit that fails to be
/// processed is logged and dropped.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<Visit>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<Visit>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(visit) = self.receiver.recv().await {
            debug!("Processing visit {:?}", visit);
            match self.processor.process_next(visit.clone()).await {
                Ok(_) => {
                    info!("Recorded {}s on {}", visit.seconds, visit.domain)
                }
                Err(e) => {
                    error!("Error processing visit {:?}: {e:?}", visit)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
