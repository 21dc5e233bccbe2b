//! # crewpress
//!
//! Client for a multi-agent article generation server.
//!
//! This library provides:
//! - Job submission and artifact download over HTTP
//! - A progress stream consumer (Server-Sent Events)
//! - A progress state machine and activity log driven by that stream
//! - A task session that drives any front end through the `ViewPort` trait
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────┐ submit  ┌─────────────────┐  POST /api/generate
//!   │ ViewPort  │◀────────│   TaskSession   │───────────────────▶ server
//!   └───────────┘ updates └────────┬────────┘
//!                                  │ next_event()
//!                         ┌────────▼────────┐  GET /api/status/{id}
//!                         │EventStreamClient│◀─────────────────── server
//!                         └─────────────────┘        (SSE)
//! ```
//!
//! ## Task Flow
//! 1. Submit a topic, receive a task id
//! 2. Open the progress stream for that task
//! 3. Apply progress events to the state machine and activity log
//! 4. On `completed` or `error`, close the stream and show the result

pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod progress;
pub mod session;
pub mod stage;
pub mod stream;
pub mod terminal;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpJobApi, JobApi, TaskId};
pub use config::Config;
pub use error::ClientError;
pub use session::{StartOutcome, TaskOutcome, TaskSession};
pub use view::{UiSection, ViewPort};
