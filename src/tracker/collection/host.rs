//! Contains the contract between the tracker and the browser it observes.
//! [BrowserHost] abstracts the browser's event callbacks so that the tracker can run against a
//! real extension bridge or a scripted sequence of events.

use std::io::ErrorKind;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, Lines},
    sync::mpsc,
};
use tracing::{trace, warn};

use super::session::Transition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserEvent {
    /// The user switched to another tab.
    TabActivated {
        #[serde(default)]
        url: Option<String>,
    },
    /// A tab navigated somewhere else.
    TabUpdated {
        url: String,
        #[serde(default)]
        active: bool,
    },
    /// A browser window got focus. Carries the url of its active tab, if there is one.
    #[serde(rename_all = "camelCase")]
    WindowFocused {
        #[serde(default)]
        active_url: Option<String>,
    },
    /// No browser window is focused anymore.
    WindowFocusLost,
    /// The browser is about to suspend the extension.
    Suspend,
}

impl BrowserEvent {
    /// Effect of the event on the open interval. Events that don't concern the active tab have
    /// none.
    pub fn transition(&self) -> Option<Transition<'_>> {
        match self {
            BrowserEvent::TabActivated { url } => Some(Transition::Switch(url.as_deref())),
            BrowserEvent::TabUpdated { url, active: true } => {
                Some(Transition::Switch(Some(url.as_str())))
            }
            BrowserEvent::TabUpdated { active: false, .. } => None,
            BrowserEvent::WindowFocused {
                active_url: Some(url),
            } => Some(Transition::Switch(Some(url.as_str()))),
            BrowserEvent::WindowFocused { active_url: None } => None,
            BrowserEvent::WindowFocusLost => Some(Transition::Stop),
            BrowserEvent::Suspend => Some(Transition::Flush),
        }
    }
}

/// Intended to serve as a contract every browser integration must implement.
#[async_trait]
pub trait BrowserHost: Send {
    /// Waits for the next event. `None` means the browser went away, an error that the stream
    /// is unusable; the tracker stops on both. Must be cancel safe, the tracker races it
    /// against its timers.
    async fn next_event(&mut self) -> Result<Option<BrowserEvent>>;
}

/// Reads one json encoded [BrowserEvent] per line. Used to receive events piped from an
/// extension bridge over stdin.
pub struct LinesHost<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LinesHost<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl LinesHost<tokio::io::BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> BrowserHost for LinesHost<R> {
    async fn next_event(&mut self) -> Result<Option<BrowserEvent>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!("Skipping browser event that isn't utf-8: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BrowserEvent>(&line) {
                Ok(event) => {
                    trace!("Received {event:?}");
                    return Ok(Some(event));
                }
                Err(e) => warn!("Skipping malformed browser event {line:?}: {e}"),
            }
        }
    }
}

#[async_trait]
impl BrowserHost for mpsc::Receiver<BrowserEvent> {
    async fn next_event(&mut self) -> Result<Option<BrowserEvent>> {
        Ok(self.recv().await)
    }
}
