//! Progress events decoded from the task status stream.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Deserialize;

use crate::error::ClientError;
use crate::stage::StageName;

/// A typed event delivered by the progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A stage reported a status update.
    Progress {
        stage: StageName,
        message: String,
        timestamp: DateTime<Local>,
    },
    /// The job finished and produced its article.
    Completed { artifact: String },
    /// The job failed on the server.
    Error { message: String },
}

impl ProgressEvent {
    /// Whether this event ends the task.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Error { .. }
        )
    }
}

/// JSON envelope as sent by the server, discriminated by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Progress {
        agent: StageName,
        #[serde(default)]
        status: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Completed {
        article: String,
    },
    Error {
        #[serde(default)]
        error: Option<String>,
    },
}

/// Decode one `data:` payload from the stream.
pub fn parse_event(data: &str) -> Result<ProgressEvent, ClientError> {
    let wire: WireEvent = serde_json::from_str(data)
        .map_err(|e| ClientError::Parse(format!("{}: {}", e, truncate(data, 120))))?;

    Ok(match wire {
        WireEvent::Progress {
            agent,
            status,
            timestamp,
        } => {
            let timestamp = match timestamp.as_deref().and_then(parse_timestamp) {
                Some(ts) => ts,
                None => {
                    tracing::debug!(
                        "Progress event for {} has no usable timestamp ({:?}), using receipt time",
                        agent,
                        timestamp
                    );
                    Local::now()
                }
            };
            ProgressEvent::Progress {
                stage: agent,
                message: status,
                timestamp,
            }
        }
        WireEvent::Completed { article } => ProgressEvent::Completed { artifact: article },
        WireEvent::Error { error } => ProgressEvent::Error {
            message: error.unwrap_or_else(|| "Unknown error".to_string()),
        },
    })
}

/// Parse an ISO-8601 timestamp. Values without an offset are local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_progress() {
        let event = parse_event(
            r#"{"type":"progress","agent":"Researcher","status":"searching","timestamp":"2024-05-01T12:30:45.123456"}"#,
        )
        .unwrap();

        match event {
            ProgressEvent::Progress {
                stage,
                message,
                timestamp,
            } => {
                assert_eq!(stage, StageName::Researcher);
                assert_eq!(message, "searching");
                assert_eq!(timestamp.hour(), 12);
                assert_eq!(timestamp.minute(), 30);
                assert_eq!(timestamp.second(), 45);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_progress_unknown_agent() {
        let event =
            parse_event(r#"{"type":"progress","agent":"Editor","status":"tidying"}"#).unwrap();
        assert!(matches!(
            event,
            ProgressEvent::Progress { stage: StageName::Other(ref name), .. } if name == "Editor"
        ));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_parse_terminal_events() {
        let done = parse_event(r##"{"type":"completed","article":"# Title"}"##).unwrap();
        assert_eq!(
            done,
            ProgressEvent::Completed {
                artifact: "# Title".to_string()
            }
        );
        assert!(done.is_terminal());

        let failed = parse_event(r#"{"type":"error","error":"rate limited"}"#).unwrap();
        assert_eq!(
            failed,
            ProgressEvent::Error {
                message: "rate limited".to_string()
            }
        );

        let bare = parse_event(r#"{"type":"error","error":null}"#).unwrap();
        assert_eq!(
            bare,
            ProgressEvent::Error {
                message: "Unknown error".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_event("not json"), Err(ClientError::Parse(_))));
        // The server's "task not found" payload carries no type.
        assert!(parse_event(r#"{"error":"Task not found"}"#).is_err());
        assert!(parse_event(r#"{"type":"heartbeat"}"#).is_err());
        assert!(parse_event(r#"{"type":"completed"}"#).is_err());
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-05-01T12:30:45+00:00").unwrap();
        assert_eq!(ts.timestamp(), 1714566645);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_truncate_long_payload() {
        let long = "x".repeat(200);
        let out = truncate(&long, 10);
        assert_eq!(out, format!("{}...", "x".repeat(10)));
        assert_eq!(truncate("short", 10), "short");
    }
}
