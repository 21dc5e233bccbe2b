//! Progress stream client with SSE transport.
//!
//! Holds at most one open server-push connection, scoped to a single task,
//! and turns raw `data:` payloads into [`ProgressEvent`]s. The stream is
//! polled in place by its owner, so events are handled strictly in arrival
//! order and never interleave.

mod event;

pub use event::{parse_event, parse_timestamp, ProgressEvent};

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};

use crate::api::TaskId;
use crate::error::ClientError;

/// Raw message payloads (the `data:` field of each SSE event).
pub type MessageStream = BoxStream<'static, Result<String, ClientError>>;

/// Opens progress subscriptions for a task.
///
/// Connections are closed by dropping the returned stream.
pub trait EventTransport: Send + Sync {
    fn connect(&self, task_id: &TaskId) -> Result<MessageStream, ClientError>;
}

/// What the stream produced on the last poll.
#[derive(Debug)]
pub enum StreamSignal {
    /// A successfully parsed event.
    Event(ProgressEvent),
    /// The connection failed. The stream has already been closed.
    TransportError(ClientError),
    /// The server closed the stream. The stream has already been closed.
    Ended,
}

struct ActiveStream {
    task_id: TaskId,
    messages: MessageStream,
}

/// Client owning the single progress subscription of a session.
pub struct EventStreamClient {
    transport: Arc<dyn EventTransport>,
    active: Option<ActiveStream>,
}

impl EventStreamClient {
    pub fn new(transport: Arc<dyn EventTransport>) -> Self {
        Self {
            transport,
            active: None,
        }
    }

    /// Subscribe to progress for `task_id`, closing any previous subscription.
    pub fn open(&mut self, task_id: &TaskId) -> Result<(), ClientError> {
        self.close();
        let messages = self.transport.connect(task_id)?;
        tracing::info!("Opened progress stream for task {}", task_id);
        self.active = Some(ActiveStream {
            task_id: task_id.clone(),
            messages,
        });
        Ok(())
    }

    /// Close the current subscription. Returns false if nothing was open.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                tracing::info!("Closed progress stream for task {}", active.task_id);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Task the open subscription belongs to.
    pub fn task_id(&self) -> Option<&TaskId> {
        self.active.as_ref().map(|a| &a.task_id)
    }

    /// Wait for the next event.
    ///
    /// Malformed messages are logged and skipped. Returns `None` when no
    /// stream is open.
    pub async fn next_event(&mut self) -> Option<StreamSignal> {
        loop {
            let active = self.active.as_mut()?;
            match active.messages.next().await {
                Some(Ok(data)) => match parse_event(&data) {
                    Ok(event) => {
                        if event.is_terminal() {
                            tracing::info!("Task {} reached a terminal event", active.task_id);
                        } else {
                            tracing::debug!("Task {} event: {:?}", active.task_id, event);
                        }
                        return Some(StreamSignal::Event(event));
                    }
                    Err(e) => {
                        tracing::warn!("Dropping message on task {}: {}", active.task_id, e);
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!("Progress stream for task {} failed: {}", active.task_id, e);
                    self.close();
                    return Some(StreamSignal::TransportError(e));
                }
                None => {
                    tracing::debug!("Progress stream for task {} ended", active.task_id);
                    self.close();
                    return Some(StreamSignal::Ended);
                }
            }
        }
    }
}

impl Drop for EventStreamClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Production transport: `GET {base_url}/api/status/{task_id}` as SSE.
///
/// Automatic reconnects are disabled; a dropped connection is final.
#[derive(Clone)]
pub struct SseTransport {
    base_url: String,
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    fn status_url(&self, task_id: &TaskId) -> String {
        format!(
            "{}/api/status/{}",
            self.base_url,
            urlencoding::encode(task_id.as_str())
        )
    }
}

impl EventTransport for SseTransport {
    fn connect(&self, task_id: &TaskId) -> Result<MessageStream, ClientError> {
        let request = self.client.get(self.status_url(task_id));
        let mut source = EventSource::new(request)
            .map_err(|e| ClientError::Transport(format!("Cannot build SSE request: {}", e)))?;
        source.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        let stream = async_stream::stream! {
            while let Some(item) = source.next().await {
                match item {
                    Ok(Event::Open) => tracing::debug!("SSE connection open"),
                    Ok(Event::Message(message)) => yield Ok(message.data),
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        source.close();
                        yield Err(ClientError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
