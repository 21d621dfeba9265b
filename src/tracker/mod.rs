use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use collection::{collector::TrackingModule, host::BrowserHost, session::Visit};
use processing::{aggregate::Aggregator, ProcessingModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    classify::Classifier,
    storage::document_store::{DocumentStore, JsonFileStore},
    utils::clock::{Clock, DefaultClock},
};

pub mod collection;
pub mod processing;
pub mod shutdown;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

pub struct TrackerConfig {
    pub store_path: PathBuf,
    pub flush_interval: Duration,
    pub retain_days: Option<u32>,
}

/// Represents the starting point for the tracker. Runs until the host goes away or the
/// process is interrupted.
pub async fn start_tracker(config: TrackerConfig, host: impl BrowserHost + 'static) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<Visit>(10);

    let shutdown_token = CancellationToken::new();

    let tracker = create_tracker(
        sender,
        host,
        &shutdown_token,
        config.flush_interval,
        DefaultClock,
    );

    let store = JsonFileStore::new(config.store_path);
    let processor = create_processor(store, config.retain_days, receiver, DefaultClock);

    let (_, tracking_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = tracker.run().await;
            // Lets the shutdown detector finish when the browser closed on its own.
            shutdown_token.cancel();
            result
        },
        processor.run(),
    );

    if let Err(tracking_result) = tracking_result {
        error!("Tracking module got an error {:?}", tracking_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

fn create_tracker(
    sender: mpsc::Sender<Visit>,
    host: impl BrowserHost + 'static,
    shutdown_token: &CancellationToken,
    flush_interval: Duration,
    clock: impl Clock,
) -> TrackingModule {
    TrackingModule::new(
        sender,
        Box::new(host),
        shutdown_token.clone(),
        Classifier::default(),
        flush_interval,
        Box::new(clock),
    )
}

fn create_processor<S: DocumentStore>(
    store: S,
    retain_days: Option<u32>,
    receiver: mpsc::Receiver<Visit>,
    clock: impl Clock,
) -> ProcessingModule<Aggregator<S>> {
    let aggregator = Aggregator::new(store, Box::new(clock)).with_retention(retain_days);
    ProcessingModule::new(receiver, aggregator)
}

#[cfg(test)]
mod tracker_tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::{
        io::{AsyncWriteExt, BufReader},
        sync::mpsc,
    };
    use tokio_util::sync::CancellationToken;

    use crate::{
        classify::Category,
        storage::{
            document_store::{JsonFileStore, MemoryDocumentStore},
            entities::DomainRecord,
            time_data::load_time_store,
        },
        tracker::{
            collection::{
                host::{BrowserEvent, BrowserHost, LinesHost},
                session::Visit,
            },
            create_processor, create_tracker, DEFAULT_FLUSH_INTERVAL,
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn activated(url: &str) -> BrowserEvent {
        BrowserEvent::TabActivated {
            url: Some(url.into()),
        }
    }

    /// github.com for two minutes, facebook.com for five, then shutdown. Periodic flushes in
    /// between must not change the totals.
    #[tokio::test(start_paused = true)]
    async fn test_browsing_session_is_aggregated() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (events, host) = mpsc::channel::<BrowserEvent>(10);
        let (sender, receiver) = mpsc::channel::<Visit>(10);

        let tracker = create_tracker(
            sender,
            host,
            &shutdown_token,
            DEFAULT_FLUSH_INTERVAL,
            clock.clone(),
        );
        let store = Arc::new(MemoryDocumentStore::new());
        let processor = create_processor(store.clone(), None, receiver, clock.clone());

        let (script_result, tracking_result, processing_result) = tokio::join!(
            async {
                events.send(activated("https://github.com/rust-lang")).await?;
                tokio::time::sleep(Duration::from_secs(120)).await;
                events.send(activated("https://www.facebook.com/")).await?;
                tokio::time::sleep(Duration::from_secs(300)).await;
                shutdown_token.cancel();
                anyhow::Ok(())
            },
            tracker.run(),
            processor.run(),
        );
        script_result?;
        tracking_result?;
        processing_result?;

        let time_store = load_time_store(&store).await?;
        let day = time_store.day(TEST_START_DATE.date()).unwrap();
        assert_eq!(day.productive_seconds, 120);
        assert_eq!(day.unproductive_seconds, 300);
        assert_eq!(day.neutral_seconds, 0);
        assert_eq!(
            day.domains["github.com"],
            DomainRecord {
                total_seconds: 120,
                category: Category::Productive
            }
        );
        assert_eq!(
            day.domains["facebook.com"],
            DomainRecord {
                total_seconds: 300,
                category: Category::Unproductive
            }
        );
        Ok(())
    }

    /// Time while no browser window has focus isn't attributed to anything.
    #[tokio::test(start_paused = true)]
    async fn test_unfocused_time_is_not_counted() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (events, host) = mpsc::channel::<BrowserEvent>(10);
        let (sender, receiver) = mpsc::channel::<Visit>(10);

        let tracker = create_tracker(
            sender,
            host,
            &shutdown_token,
            DEFAULT_FLUSH_INTERVAL,
            clock.clone(),
        );
        let store = Arc::new(MemoryDocumentStore::new());
        let processor = create_processor(store.clone(), None, receiver, clock.clone());

        let (script_result, tracking_result, processing_result) = tokio::join!(
            async {
                events.send(activated("https://example.org")).await?;
                tokio::time::sleep(Duration::from_secs(30)).await;
                events.send(BrowserEvent::WindowFocusLost).await?;
                tokio::time::sleep(Duration::from_secs(600)).await;
                events
                    .send(BrowserEvent::WindowFocused {
                        active_url: Some("https://example.org/other".into()),
                    })
                    .await?;
                tokio::time::sleep(Duration::from_secs(10)).await;
                // Closing the host stops the tracker, same as the browser exiting.
                drop(events);
                anyhow::Ok(())
            },
            tracker.run(),
            processor.run(),
        );
        script_result?;
        tracking_result?;
        processing_result?;

        let time_store = load_time_store(&store).await?;
        let day = time_store.day(TEST_START_DATE.date()).unwrap();
        assert_eq!(day.neutral_seconds, 40);
        assert_eq!(day.domains["example.org"].total_seconds, 40);
        Ok(())
    }

    /// Smoke test over the line protocol and the file store.
    #[tokio::test(start_paused = true)]
    async fn test_lines_host_into_file_store() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let path = dir.path().join("storage.json");
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<Visit>(10);
        let (mut browser, bridge) = tokio::io::duplex(1024);

        let tracker = create_tracker(
            sender,
            LinesHost::new(BufReader::new(bridge)),
            &shutdown_token,
            DEFAULT_FLUSH_INTERVAL,
            clock.clone(),
        );
        let processor =
            create_processor(JsonFileStore::new(path.clone()), None, receiver, clock.clone());

        let (script_result, tracking_result, processing_result) = tokio::join!(
            async move {
                browser
                    .write_all(b"{\"type\":\"tabActivated\",\"url\":\"https://gitlab.com/x\"}\n")
                    .await?;
                tokio::time::sleep(Duration::from_secs(90)).await;
                // Browser exits, the stream ends.
                drop(browser);
                anyhow::Ok(())
            },
            tracker.run(),
            processor.run(),
        );
        script_result?;
        tracking_result?;
        processing_result?;

        let time_store = load_time_store(&JsonFileStore::new(path)).await?;
        let day = time_store.day(TEST_START_DATE.date()).unwrap();
        assert_eq!(day.productive_seconds, 90);
        assert_eq!(day.domains["gitlab.com"].total_seconds, 90);
        Ok(())
    }

    /// The timer alone persists progress of a tab that stays active.
    #[tokio::test(start_paused = true)]
    async fn test_periodic_flush_persists_progress() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (events, host) = mpsc::channel::<BrowserEvent>(10);
        let (sender, receiver) = mpsc::channel::<Visit>(10);

        let tracker = create_tracker(
            sender,
            host,
            &shutdown_token,
            DEFAULT_FLUSH_INTERVAL,
            clock.clone(),
        );
        let store = Arc::new(MemoryDocumentStore::new());
        let processor = create_processor(store.clone(), None, receiver, clock.clone());

        let (script_result, tracking_result, processing_result) = tokio::join!(
            async {
                events.send(activated("https://example.org")).await?;
                tokio::time::sleep(Duration::from_secs(90)).await;
                let time_store = load_time_store(&store).await?;
                let flushed = time_store
                    .day(TEST_START_DATE.date())
                    .map(|day| day.neutral_seconds);
                drop(events);
                anyhow::Ok(flushed)
            },
            tracker.run(),
            processor.run(),
        );
        let flushed = script_result?;
        tracking_result?;
        processing_result?;

        assert_eq!(flushed, Some(60));
        let time_store = load_time_store(&store).await?;
        let day = time_store.day(TEST_START_DATE.date()).unwrap();
        assert_eq!(day.neutral_seconds, 90);
        assert_eq!(day.domains["example.org"].total_seconds, 90);
        Ok(())
    }

    /// An interval that can't be scheduled disables periodic flushes instead of failing.
    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_flush_interval() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (events, host) = mpsc::channel::<BrowserEvent>(10);
        let (sender, receiver) = mpsc::channel::<Visit>(10);

        let tracker = create_tracker(sender, host, &shutdown_token, Duration::MAX, clock.clone());
        let store = Arc::new(MemoryDocumentStore::new());
        let processor = create_processor(store.clone(), Some(u32::MAX), receiver, clock.clone());

        let (script_result, tracking_result, processing_result) = tokio::join!(
            async {
                events.send(activated("https://github.com")).await?;
                tokio::time::sleep(Duration::from_secs(30)).await;
                shutdown_token.cancel();
                anyhow::Ok(())
            },
            tracker.run(),
            processor.run(),
        );
        script_result?;
        tracking_result?;
        processing_result?;

        let time_store = load_time_store(&store).await?;
        assert_eq!(
            time_store
                .day(TEST_START_DATE.date())
                .unwrap()
                .productive_seconds,
            30
        );
        Ok(())
    }

    /// Yields its events, then fails the way a broken stdin would.
    struct BrokenHost {
        events: Vec<BrowserEvent>,
    }

    #[async_trait]
    impl BrowserHost for BrokenHost {
        async fn next_event(&mut self) -> Result<Option<BrowserEvent>> {
            match self.events.pop() {
                Some(event) => Ok(Some(event)),
                None => {
                    tokio::time::sleep(Duration::from_secs(20)).await;
                    Err(anyhow!("Input/output error"))
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_failure_stops_tracker() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<Visit>(10);

        let tracker = create_tracker(
            sender,
            BrokenHost {
                events: vec![activated("https://example.org")],
            },
            &shutdown_token,
            DEFAULT_FLUSH_INTERVAL,
            clock.clone(),
        );
        let store = Arc::new(MemoryDocumentStore::new());
        let processor = create_processor(store.clone(), None, receiver, clock.clone());

        let (tracking_result, processing_result) = tokio::join!(tracker.run(), processor.run());
        tracking_result?;
        processing_result?;

        let time_store = load_time_store(&store).await?;
        let day = time_store.day(TEST_START_DATE.date()).unwrap();
        assert_eq!(day.neutral_seconds, 20);
        assert_eq!(day.domains["example.org"].total_seconds, 20);
        Ok(())
    }
}
