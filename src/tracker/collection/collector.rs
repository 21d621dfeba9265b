use std::time::Duration;

use anyhow::Result;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{classify::Classifier, utils::clock::Clock};

use super::{
    host::BrowserHost,
    session::{Session, Transition, Visit},
};

/// Drives a [Session] from browser events, a periodic flush timer and the shutdown token.
/// Closed intervals are forwarded to the processing module.
pub struct TrackingModule {
    next: mpsc::Sender<Visit>,
    host: Box<dyn BrowserHost>,
    shutdown: CancellationToken,
    classifier: Classifier,
    flush_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl TrackingModule {
    pub fn new(
        next: mpsc::Sender<Visit>,
        host: Box<dyn BrowserHost>,
        shutdown: CancellationToken,
        classifier: Classifier,
        flush_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            host,
            shutdown,
            classifier,
            flush_interval,
            time_provider,
        }
    }

    async fn apply(&self, session: Session, transition: Transition<'_>) -> Result<Session> {
        let now = self.time_provider.time();
        let (session, visit) = session.advance(transition, now, &self.classifier);

        if let Some(visit) = visit {
            let span = info_span!("Forwarding visit");
            debug!("Sending visit {:?}", visit);
            self.next
                .send(visit)
                .instrument(span)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        }
        Ok(session)
    }

    /// Executes the tracker event loop. Returns once the browser goes away, its stream fails
    /// or shutdown is requested, after flushing whatever was open.
    pub async fn run(mut self) -> Result<()> {
        let mut session = Session::Idle;
        // An interval too large to schedule means no periodic flushes at all.
        let mut flush_point = self
            .time_provider
            .instant()
            .checked_add(self.flush_interval);

        loop {
            tokio::select! {
                // Cancelation drops the sender once we return, which in turn stops the
                // processing module.
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, flushing open interval");
                    self.apply(session, Transition::Flush).await?;
                    return Ok(());
                }
                _ = flush_timer(self.time_provider.as_ref(), flush_point) => {
                    flush_point =
                        flush_point.and_then(|point| point.checked_add(self.flush_interval));
                    session = self.apply(session, Transition::Flush).await?;
                }
                event = self.host.next_event() => {
                    match event {
                        Ok(Some(event)) => {
                            debug!("Browser event {event:?}");
                            if let Some(transition) = event.transition() {
                                session = self.apply(session, transition).await?;
                            }
                        }
                        Ok(None) => {
                            info!("Browser host closed, stopping tracker");
                            self.apply(session, Transition::Stop).await?;
                            return Ok(());
                        }
                        Err(e) => {
                            error!("Failed to receive browser event, stopping tracker {e:?}");
                            self.apply(session, Transition::Stop).await?;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

async fn flush_timer(clock: &dyn Clock, flush_point: Option<Instant>) {
    match flush_point {
        Some(point) => clock.sleep_until(point).await,
        None => std::future::pending().await,
    }
}
