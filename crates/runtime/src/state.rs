//! Submission state machine.
//!
//! [`Status`] is a plain tagged enum; [`Status::can_transition_to`] is the
//! single source of truth for legal moves and has no side effects, so callers
//! (and tests) can reason about the lifecycle without any I/O.

use serde::Serialize;

use chain_core::TransactionId;

use crate::api::ErrorKind;

/// Lifecycle of a submission session.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Initializing,
    Ready,
    Broadcasting,
    Proving,
    Verifying,
    Success,
    Error,
}

impl Status {
    /// Whether the state machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;

        match (self, next) {
            // teardown
            (Idle, Idle) => false,
            (_, Idle) => true,

            (Idle, Initializing) => true,
            // retrying start after a failed initialization
            (Error, Initializing) => true,
            (Initializing, Ready) => true,

            (Ready, Broadcasting) => true,
            (Broadcasting, Proving) => true,
            (Proving, Verifying) => true,
            (Verifying, Success) => true,

            // explicit reset
            (Success | Error, Ready) => true,

            (Idle, Error) => false,
            (Error, Error) => false,
            (Success, Error) => false,
            (_, Error) => true,

            _ => false,
        }
    }

    /// A submission is running and may be cancelled.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Status::Broadcasting | Status::Proving | Status::Verifying)
    }

    /// A submission finished and waits for `reset`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Error)
    }

    /// Progress shown when entering this status.
    pub fn progress(self) -> u8 {
        match self {
            Status::Broadcasting => 10,
            Status::Proving => 30,
            Status::Verifying => 80,
            Status::Success => 100,
            _ => 0,
        }
    }
}

/// Machine-readable kind plus detail of the last failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Snapshot of one orchestrator's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionState {
    pub status: Status,

    /// Human-readable description of the current step
    pub message: String,

    /// 0-100
    pub progress: u8,

    pub last_error: Option<Failure>,

    /// Data transaction of the current submission
    pub data_tx: Option<TransactionId>,

    /// Transaction settled by the proof, set on success
    pub final_tx: Option<TransactionId>,

    /// Proof transaction hash acknowledged by the chain
    pub proof_tx: Option<TransactionId>,
}

impl SubmissionState {
    /// Move to `next`, returning the previous status.
    ///
    /// Returns `None` and leaves the state untouched when the move is illegal.
    pub(crate) fn transition(&mut self, next: Status, message: impl Into<String>) -> Option<Status> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return None;
        }

        self.status = next;
        self.message = message.into();
        if next != Status::Error {
            self.progress = next.progress();
        }
        Some(previous)
    }

    /// Enter `Error`, keeping the progress of the step that failed.
    pub(crate) fn fail(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Option<Status> {
        let previous = self.transition(Status::Error, message)?;
        self.last_error = Some(Failure {
            kind,
            message: detail.into(),
        });
        Some(previous)
    }

    /// Forget everything about the previous submission.
    pub(crate) fn clear_submission(&mut self) {
        self.last_error = None;
        self.data_tx = None;
        self.final_tx = None;
        self.proof_tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_legal() {
        let path = [
            Status::Idle,
            Status::Initializing,
            Status::Ready,
            Status::Broadcasting,
            Status::Proving,
            Status::Verifying,
            Status::Success,
            Status::Ready,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_error_reachable_from_everything_but_idle() {
        for status in [
            Status::Initializing,
            Status::Ready,
            Status::Broadcasting,
            Status::Proving,
            Status::Verifying,
        ] {
            assert!(status.can_transition_to(Status::Error), "{}", status);
        }
        assert!(!Status::Idle.can_transition_to(Status::Error));
    }

    #[test]
    fn test_terminal_states_need_reset_before_broadcasting() {
        assert!(!Status::Success.can_transition_to(Status::Broadcasting));
        assert!(!Status::Error.can_transition_to(Status::Broadcasting));
        assert!(!Status::Broadcasting.can_transition_to(Status::Broadcasting));
        assert!(!Status::Ready.can_transition_to(Status::Proving));
    }

    #[test]
    fn test_failure_keeps_progress() {
        let mut state = SubmissionState::default();
        state.transition(Status::Initializing, "starting").unwrap();
        state.transition(Status::Ready, "ready").unwrap();
        state.transition(Status::Broadcasting, "broadcasting").unwrap();
        state.transition(Status::Proving, "proving").unwrap();

        state
            .fail(ErrorKind::ProofGenerationFailed, "submission failed", "boom")
            .unwrap();

        assert_eq!(state.status, Status::Error);
        assert_eq!(state.progress, 30);
        assert_eq!(
            state.last_error.as_ref().map(|failure| failure.kind),
            Some(ErrorKind::ProofGenerationFailed)
        );
    }

    #[test]
    fn test_illegal_transition_leaves_state_untouched() {
        let mut state = SubmissionState::default();
        assert!(state.transition(Status::Ready, "nope").is_none());
        assert_eq!(state, SubmissionState::default());
    }
}
