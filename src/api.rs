//! HTTP client for the article generation server.
//!
//! Covers job submission, artifact download and task info lookups. The
//! progress stream itself lives in [`crate::stream`].

use std::fmt;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ClientError;
use crate::stream::SseTransport;

/// Opaque server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side view of a task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskInfo {
    pub task_id: TaskId,
    pub topic: String,
    /// One of `pending`, `running`, `completed`, `error`.
    pub status: String,
    #[serde(default)]
    pub progress_count: usize,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub has_article: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    task_id: TaskId,
    #[serde(default)]
    status: Option<String>,
}

/// Job submission and artifact retrieval.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a generation job for `topic`.
    async fn submit(&self, topic: &str) -> Result<TaskId, ClientError>;

    /// Fetch the finished article.
    async fn download(&self, task_id: &TaskId) -> Result<Bytes, ClientError>;

    /// Look up a task's server-side status.
    async fn task_info(&self, task_id: &TaskId) -> Result<TaskInfo, ClientError>;
}

#[derive(Clone)]
pub struct HttpJobApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpJobApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Progress stream transport sharing this client's connection pool.
    pub fn event_transport(&self) -> SseTransport {
        SseTransport::new(self.base_url.clone(), self.client.clone())
    }

    fn task_url(&self, route: &str, task_id: &TaskId) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            route,
            urlencoding::encode(task_id.as_str())
        )
    }

    async fn submit_internal(&self, topic: &str) -> anyhow::Result<TaskId> {
        let url = format!("{}/api/generate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "topic": topic }))
            .send()
            .await
            .context("Failed to call /api/generate")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("/api/generate failed: {} - {}", status, text);
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse /api/generate response: {}", text))?;
        tracing::debug!(
            "Server accepted task {} ({})",
            parsed.task_id,
            parsed.status.as_deref().unwrap_or("no status")
        );
        Ok(parsed.task_id)
    }

    async fn download_internal(&self, task_id: &TaskId) -> anyhow::Result<Bytes> {
        let url = self.task_url("download", task_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to call /api/download")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Download failed: {} - {}", status, text);
        }

        resp.bytes().await.context("Failed to read article body")
    }

    async fn task_info_internal(&self, task_id: &TaskId) -> anyhow::Result<TaskInfo> {
        let url = self.task_url("task", task_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to call /api/task")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("/api/task failed: {} - {}", status, text);
        }

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse task info: {}", text))
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, topic: &str) -> Result<TaskId, ClientError> {
        self.submit_internal(topic)
            .await
            .map_err(|e| ClientError::Submission(format!("{:#}", e)))
    }

    async fn download(&self, task_id: &TaskId) -> Result<Bytes, ClientError> {
        self.download_internal(task_id)
            .await
            .map_err(|e| ClientError::Download(format!("{:#}", e)))
    }

    async fn task_info(&self, task_id: &TaskId) -> Result<TaskInfo, ClientError> {
        self.task_info_internal(task_id)
            .await
            .map_err(|e| ClientError::TaskInfo(format!("{:#}", e)))
    }
}
