use serde::{Deserialize, Serialize};

use crate::protocol::StepCheck;

/// Which screen of the coaching flow is active.
///
/// `Coaching` carries a terminal sub-state: once the user advances past the
/// final step the session stays in `Coaching` with `SessionSnapshot::done`
/// set, rather than moving to a separate phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prompt,
    Loading,
    Allergens,
    Coaching,
}

/// Read-only view of a cooking session handed to rendering layers.
///
/// Invariants upheld by the controller:
/// - `display_step <= current_step <= steps.len()`
/// - `step_check`, when present, describes the step at `current_step` only
/// - `step_completed` is reset on every committed step transition
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub steps: Vec<String>,
    pub current_step: usize,
    pub display_step: usize,
    pub transitioning: bool,
    pub step_completed: bool,
    pub step_check: Option<StepCheck>,
    pub remy_speech: Option<String>,
    pub detected_allergens: Vec<String>,
    pub selected_allergens: Vec<String>,
    pub api_error: Option<String>,
    pub done: bool,
}

impl SessionSnapshot {
    /// Label of the step the backend vision pipeline is evaluating.
    pub fn current_label(&self) -> Option<&str> {
        self.steps.get(self.current_step).map(String::as_str)
    }

    /// Label of the step the UI currently renders.
    pub fn display_label(&self) -> Option<&str> {
        self.steps.get(self.display_step).map(String::as_str)
    }
}
