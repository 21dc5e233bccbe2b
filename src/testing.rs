//! Test doubles for the session's collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use serde_json::json;

use crate::activity::LogEntry;
use crate::api::{JobApi, TaskId, TaskInfo};
use crate::error::ClientError;
use crate::progress::StageDisplay;
use crate::stream::{EventTransport, MessageStream};
use crate::view::{Clipboard, UiSection, ViewPort};

pub fn progress(agent: &str, status: &str) -> Result<String, ClientError> {
    Ok(json!({
        "type": "progress",
        "agent": agent,
        "status": status,
        "timestamp": "2024-05-01T12:00:00.000000"
    })
    .to_string())
}

pub fn completed(article: &str) -> Result<String, ClientError> {
    Ok(json!({ "type": "completed", "article": article }).to_string())
}

pub fn error_event(message: &str) -> Result<String, ClientError> {
    Ok(json!({ "type": "error", "error": message }).to_string())
}

/// Job API that hands out ids from a fixed list, or always fails.
pub struct FakeJobApi {
    ids: Mutex<VecDeque<String>>,
    reject: Option<String>,
    article: Option<String>,
    submissions: Mutex<Vec<String>>,
}

impl FakeJobApi {
    pub fn accepting(ids: &[&str]) -> Self {
        Self {
            ids: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            reject: None,
            article: None,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
            ..Self::accepting(&[])
        }
    }

    pub fn with_article(mut self, article: &str) -> Self {
        self.article = Some(article.to_string());
        self
    }

    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobApi for FakeJobApi {
    async fn submit(&self, topic: &str) -> Result<TaskId, ClientError> {
        self.submissions.lock().unwrap().push(topic.to_string());
        if let Some(reason) = &self.reject {
            return Err(ClientError::Submission(reason.clone()));
        }
        self.ids
            .lock()
            .unwrap()
            .pop_front()
            .map(TaskId::new)
            .ok_or_else(|| ClientError::Submission("no more task ids".to_string()))
    }

    async fn download(&self, task_id: &TaskId) -> Result<Bytes, ClientError> {
        self.article
            .clone()
            .map(Bytes::from)
            .ok_or_else(|| ClientError::Download(format!("404 for {}", task_id)))
    }

    async fn task_info(&self, task_id: &TaskId) -> Result<TaskInfo, ClientError> {
        Err(ClientError::TaskInfo(format!("unknown task {}", task_id)))
    }
}

/// Counts stream drops, i.e. closed connections.
struct CloseGuard(Arc<AtomicUsize>);

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport replaying scripted message lists, one per `connect`.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<(Vec<Result<String, ClientError>>, bool)>>,
    connects: Mutex<Vec<String>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages followed by the server closing the stream.
    pub fn script(&self, messages: Vec<Result<String, ClientError>>) {
        self.scripts.lock().unwrap().push_back((messages, false));
    }

    /// Messages followed by a connection that stays open forever.
    pub fn script_held_open(&self, messages: Vec<Result<String, ClientError>>) {
        self.scripts.lock().unwrap().push_back((messages, true));
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl EventTransport for ScriptedTransport {
    fn connect(&self, task_id: &TaskId) -> Result<MessageStream, ClientError> {
        self.connects.lock().unwrap().push(task_id.to_string());
        let (messages, hold_open) = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        let guard = CloseGuard(self.closed.clone());
        let items = stream::iter(messages);
        let stream: MessageStream = if hold_open {
            items
                .chain(stream::pending())
                .map(move |m| {
                    let _keep = &guard;
                    m
                })
                .boxed()
        } else {
            items
                .map(move |m| {
                    let _keep = &guard;
                    m
                })
                .boxed()
        };
        Ok(stream)
    }
}

/// Transport whose connections are always refused.
pub struct RefusingTransport;

impl EventTransport for RefusingTransport {
    fn connect(&self, task_id: &TaskId) -> Result<MessageStream, ClientError> {
        Err(ClientError::Transport(format!("refused {}", task_id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Section(UiSection),
    Progress(u8),
    Log(String),
    ClearLog,
    Input(bool),
    Article(String),
    Error(String),
    Notify(String),
    Focus,
}

/// View that records every call and keeps the latest visible state.
#[derive(Debug)]
pub struct RecordingView {
    pub calls: Vec<ViewCall>,
    pub section: UiSection,
    pub input_enabled: bool,
    pub article: Option<String>,
    pub error: Option<String>,
    pub notices: Vec<String>,
    pub focused: bool,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            section: UiSection::Form,
            input_enabled: true,
            article: None,
            error: None,
            notices: Vec::new(),
            focused: false,
        }
    }
}

impl ViewPort for RecordingView {
    fn show_section(&mut self, section: UiSection) {
        self.section = section;
        self.calls.push(ViewCall::Section(section));
    }

    fn set_progress(&mut self, display: &StageDisplay) {
        self.calls.push(ViewCall::Progress(display.percent));
    }

    fn append_log_entry(&mut self, entry: &LogEntry) {
        self.calls.push(ViewCall::Log(entry.message.clone()));
    }

    fn clear_log(&mut self) {
        self.calls.push(ViewCall::ClearLog);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.calls.push(ViewCall::Input(enabled));
    }

    fn show_article(&mut self, rendered: &str) {
        self.article = Some(rendered.to_string());
        self.calls.push(ViewCall::Article(rendered.to_string()));
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.calls.push(ViewCall::Error(message.to_string()));
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
        self.calls.push(ViewCall::Notify(message.to_string()));
    }

    fn focus_input(&mut self) {
        self.focused = true;
        self.calls.push(ViewCall::Focus);
    }
}

pub struct FailingClipboard;

impl Clipboard for FailingClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClientError> {
        Err(ClientError::Clipboard("no clipboard available".to_string()))
    }
}
