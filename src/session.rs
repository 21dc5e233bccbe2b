//! Task session: the orchestrator the front end talks to.
//!
//! A session owns the current task, its progress stream, the progress
//! machine and the activity log, and drives a [`ViewPort`]. It is meant to be
//! used from a single task: every event is applied to completion before the
//! next one is read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::api::{JobApi, TaskId};
use crate::error::{ClientError, CONNECTION_LOST_MESSAGE, SUBMISSION_FAILED_MESSAGE};
use crate::progress::{ProgressMachine, TerminalKind};
use crate::stream::{EventStreamClient, EventTransport, ProgressEvent, StreamSignal};
use crate::terminal::{Osc52Clipboard, TerminalMarkdown};
use crate::view::{Clipboard, MarkdownRenderer, UiSection, ViewPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Streaming,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub topic: String,
    pub state: TaskState,
    /// Failure message, once failed.
    pub error: Option<String>,
}

/// Result of [`TaskSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Blank topic; nothing happened.
    Ignored,
    /// Job accepted and its progress stream is open.
    Streaming(TaskId),
    /// Job creation failed; the error section is showing.
    Rejected,
    /// Job accepted but its progress stream could not be opened. The task
    /// is already failed and the error section is showing.
    Failed(TaskId),
}

/// Where a task stands after [`TaskSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    NoTask,
    Pending(TaskId),
    Completed(TaskId),
    Failed { task_id: TaskId, message: String },
}

pub struct TaskSession<V: ViewPort> {
    api: Arc<dyn JobApi>,
    stream: EventStreamClient,
    view: V,
    renderer: Box<dyn MarkdownRenderer>,
    clipboard: Box<dyn Clipboard>,
    download_dir: PathBuf,
    machine: ProgressMachine,
    log: ActivityLog,
    task: Option<Task>,
    article: Option<String>,
    section: UiSection,
    input_enabled: bool,
}

impl<V: ViewPort> TaskSession<V> {
    pub fn new(api: Arc<dyn JobApi>, transport: Arc<dyn EventTransport>, view: V) -> Self {
        Self {
            api,
            stream: EventStreamClient::new(transport),
            view,
            renderer: Box::new(TerminalMarkdown),
            clipboard: Box::new(Osc52Clipboard),
            download_dir: PathBuf::from("."),
            machine: ProgressMachine::new(),
            log: ActivityLog::new(),
            task: None,
            article: None,
            section: UiSection::Form,
            input_enabled: true,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn section(&self) -> UiSection {
        self.section
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn progress(&self) -> &ProgressMachine {
        &self.machine
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_open()
    }

    /// Rendered article of the last completed task.
    pub fn article(&self) -> Option<&str> {
        self.article.as_deref()
    }

    fn show(&mut self, section: UiSection) {
        self.section = section;
        self.view.show_section(section);
    }

    fn set_input(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.view.set_input_enabled(enabled);
    }

    /// Submit a new topic. Blank topics are ignored.
    pub async fn start(&mut self, topic: &str) -> StartOutcome {
        let topic = topic.trim();
        if topic.is_empty() {
            return StartOutcome::Ignored;
        }

        // A new submission replaces whatever came before.
        self.stream.close();
        self.task = None;
        self.article = None;
        self.machine.reset();
        self.log.clear();
        self.view.clear_log();
        self.show(UiSection::Progress);
        self.set_input(false);

        tracing::info!("Submitting topic {:?}", topic);
        let task_id = match self.api.submit(topic).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("{}", e);
                self.show(UiSection::Error);
                self.view.show_error(SUBMISSION_FAILED_MESSAGE);
                self.set_input(true);
                return StartOutcome::Rejected;
            }
        };

        self.task = Some(Task {
            id: task_id.clone(),
            topic: topic.to_string(),
            state: TaskState::Created,
            error: None,
        });
        let display = self.machine.start();
        self.view.set_progress(&display);

        if let Err(e) = self.stream.open(&task_id) {
            self.on_stream_lost(e);
            return StartOutcome::Failed(task_id);
        }
        if let Some(task) = self.task.as_mut() {
            task.state = TaskState::Streaming;
        }
        StartOutcome::Streaming(task_id)
    }

    /// Process stream events until the task ends or the stream goes away.
    pub async fn run(&mut self) -> TaskOutcome {
        while !self.machine.is_terminal() {
            let Some(signal) = self.stream.next_event().await else {
                break;
            };
            match signal {
                StreamSignal::Event(event) => self.handle_event(event),
                StreamSignal::TransportError(e) => self.on_stream_lost(e),
                StreamSignal::Ended => self.on_stream_lost(ClientError::Transport(
                    "stream ended before the task finished".to_string(),
                )),
            }
        }
        self.outcome()
    }

    /// Apply a single progress event.
    pub fn handle_event(&mut self, event: ProgressEvent) {
        if self.machine.is_terminal() {
            tracing::debug!("Ignoring event after terminal state: {:?}", event);
            return;
        }
        match event {
            ProgressEvent::Progress {
                stage,
                message,
                timestamp,
            } => {
                let Some(display) = self.machine.advance(stage.clone(), &message) else {
                    return;
                };
                self.view.set_progress(&display);
                let entry = self.log.append(stage, message, timestamp);
                self.view.append_log_entry(entry);
            }
            ProgressEvent::Completed { artifact } => {
                self.on_terminal(TerminalKind::Completed, artifact)
            }
            ProgressEvent::Error { message } => self.on_terminal(TerminalKind::Failed, message),
        }
    }

    /// Finish the current task. `payload` is the article or the error message.
    pub fn on_terminal(&mut self, kind: TerminalKind, payload: String) {
        let applied = match kind {
            TerminalKind::Completed => match self.machine.complete() {
                Some(display) => {
                    self.view.set_progress(&display);
                    true
                }
                None => false,
            },
            TerminalKind::Failed => self.machine.fail(),
        };
        if !applied {
            return;
        }
        self.stream.close();

        match kind {
            TerminalKind::Completed => {
                if let Some(task) = self.task.as_mut() {
                    task.state = TaskState::Completed;
                    tracing::info!("Task {} completed", task.id);
                }
                let rendered = self.renderer.render(&payload);
                self.show(UiSection::Article);
                self.view.show_article(&rendered);
                self.article = Some(rendered);
            }
            TerminalKind::Failed => {
                if let Some(task) = self.task.as_mut() {
                    task.state = TaskState::Failed;
                    task.error = Some(payload.clone());
                    tracing::warn!("Task {} failed: {}", task.id, payload);
                }
                self.show(UiSection::Error);
                self.view.show_error(&payload);
            }
        }
        self.set_input(true);
    }

    /// The stream broke without a terminal event: the task is lost.
    fn on_stream_lost(&mut self, error: ClientError) {
        tracing::warn!("{}", error);
        self.on_terminal(TerminalKind::Failed, CONNECTION_LOST_MESSAGE.to_string());
    }

    /// Leave the article or error section and go back to the form.
    ///
    /// Does not resubmit. Ignored while a task is still in progress, since
    /// only a new submission may cancel a stream. Returns whether anything
    /// changed.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.section, UiSection::Article | UiSection::Error) {
            tracing::debug!("Ignoring retry from the {} section", self.section);
            return false;
        }
        self.task = None;
        self.show(UiSection::Form);
        self.view.focus_input();
        true
    }

    /// Close the stream on shutdown.
    pub fn teardown(&mut self) {
        self.stream.close();
    }

    pub fn outcome(&self) -> TaskOutcome {
        match &self.task {
            None => TaskOutcome::NoTask,
            Some(task) => match task.state {
                TaskState::Created | TaskState::Streaming => TaskOutcome::Pending(task.id.clone()),
                TaskState::Completed => TaskOutcome::Completed(task.id.clone()),
                TaskState::Failed => TaskOutcome::Failed {
                    task_id: task.id.clone(),
                    message: task.error.clone().unwrap_or_default(),
                },
            },
        }
    }

    /// Save the completed article to the download directory.
    ///
    /// Failures are reported through [`ViewPort::notify`] only.
    pub async fn download_article(&mut self) -> Option<PathBuf> {
        let task_id = match &self.task {
            Some(task) if task.state == TaskState::Completed => task.id.clone(),
            _ => return None,
        };

        let result = match self.api.download(&task_id).await {
            Ok(body) => save_article(&self.download_dir, &body).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(path) => {
                tracing::info!("Saved article for task {} to {}", task_id, path.display());
                self.view
                    .notify(&format!("Article saved to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.view
                    .notify(&format!("Failed to download article: {}", e));
                None
            }
        }
    }

    /// Copy the rendered article's text. Returns whether it was copied.
    pub fn copy_article(&mut self) -> bool {
        let Some(text) = self.article.as_deref() else {
            return false;
        };
        match self.clipboard.write_text(text) {
            Ok(()) => {
                self.view.notify("Copied!");
                true
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.view.notify("Failed to copy to clipboard");
                false
            }
        }
    }
}

async fn save_article(dir: &Path, body: &[u8]) -> Result<PathBuf, ClientError> {
    let filename = format!("article_{}.md", chrono::Utc::now().timestamp_millis());
    let path = dir.join(filename);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ClientError::Download(format!("{}: {}", dir.display(), e)))?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| ClientError::Download(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}
