//! Progress state machine for a single task.
//!
//! ```text
//!   Idle ──start──▶ Running(stage) ──complete──▶ Terminal(Completed)
//!                     │    ▲
//!                     └────┘ advance            ──fail──▶ Terminal(Failed)
//! ```
//!
//! Stages are advisory: any stage may follow any other, including repeats.
//! Terminal states absorb every further input until the next `start`.

use crate::stage::StageName;

/// Status text shown before the backend reports its first stage.
const STARTING_STATUS: &str = "Waiting for agents";

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Running(StageName),
    Terminal(TerminalKind),
}

/// What the progress panel should show after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDisplay {
    pub icon: &'static str,
    pub stage: String,
    /// Status text exactly as reported.
    pub status: String,
    pub percent: u8,
}

impl StageDisplay {
    fn for_stage(stage: &StageName, status: impl Into<String>) -> Self {
        Self {
            icon: stage.icon(),
            stage: stage.to_string(),
            status: status.into(),
            percent: stage.display_percent(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressMachine {
    state: ProgressState,
    percent: u8,
}

impl Default for ProgressMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMachine {
    pub fn new() -> Self {
        Self {
            state: ProgressState::Idle,
            percent: 0,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Current progress-bar percentage.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ProgressState::Running(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ProgressState::Terminal(_))
    }

    /// Enter `Running(Initializing)` for a new task, discarding any prior state.
    pub fn start(&mut self) -> StageDisplay {
        let stage = StageName::Initializing;
        let display = StageDisplay::for_stage(&stage, STARTING_STATUS);
        self.percent = display.percent;
        self.state = ProgressState::Running(stage);
        display
    }

    /// Return to `Idle` (a submission that never produced a task).
    pub fn reset(&mut self) {
        self.state = ProgressState::Idle;
        self.percent = 0;
    }

    /// Apply a progress report. Ignored unless running.
    pub fn advance(&mut self, stage: StageName, status: &str) -> Option<StageDisplay> {
        if !self.is_running() {
            tracing::debug!("Ignoring {} progress in state {:?}", stage, self.state);
            return None;
        }
        let display = StageDisplay::for_stage(&stage, status);
        self.percent = display.percent;
        self.state = ProgressState::Running(stage);
        Some(display)
    }

    /// Finish successfully. Ignored unless running.
    pub fn complete(&mut self) -> Option<StageDisplay> {
        if !self.is_running() {
            return None;
        }
        let display = StageDisplay::for_stage(&StageName::Completed, "Article ready");
        self.percent = display.percent;
        self.state = ProgressState::Terminal(TerminalKind::Completed);
        Some(display)
    }

    /// Finish with a failure. Ignored unless running. The bar keeps its last value.
    pub fn fail(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ProgressState::Terminal(TerminalKind::Failed);
        true
    }
}
