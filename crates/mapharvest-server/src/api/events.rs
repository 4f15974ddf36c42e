//! Live progress channel: every harvest's events fan out to all connected
//! Server-Sent Events subscribers.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use mapharvest_core::ProgressEvent;
use mapharvest_scraper::ProgressReporter;
use tokio::sync::broadcast::{self, error::RecvError};

use super::scrape::ScrapeOutcome;
use super::AppState;

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    Progress(ProgressEvent),
    Complete(ScrapeOutcome),
}

impl ServerEvent {
    fn name(&self) -> &'static str {
        match self {
            ServerEvent::Progress(_) => "scraping-progress",
            ServerEvent::Complete(_) => "scraping-complete",
        }
    }

    fn to_sse(&self) -> Result<Event, serde_json::Error> {
        let data = match self {
            ServerEvent::Progress(event) => serde_json::to_string(event)?,
            ServerEvent::Complete(outcome) => serde_json::to_string(outcome)?,
        };
        Ok(Event::default().event(self.name()).data(data))
    }
}

/// Broadcast hub for server events. Publishing with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ServerEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }
}

impl ProgressReporter for EventBus {
    fn report(&self, event: ProgressEvent) {
        self.publish(ServerEvent::Progress(event));
    }
}

pub(super) async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    tracing::debug!("event subscriber connected");

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.to_sse() {
                    Ok(sse) => return Some((Ok(sse), rx)),
                    Err(err) => tracing::warn!(error = %err, "failed to encode server event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
