//! Signup flow state machine.
//!
//! Three forward-only states, one per visible view. A state advances only as
//! a side effect of successfully completing the current step; failures leave
//! the state where it was. While a step's backend call is outstanding the
//! session is `pending` and a second submission for that step is rejected
//! rather than queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::signup::UtmParams;

/// The current visible step of the multi-step signup process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Credentials entry (initial).
    Credentials,
    /// Optional profile entry.
    Profile,
    /// Terminal success panel.
    Success,
}

impl FlowState {
    /// The only legal transitions. There is no back navigation.
    pub fn can_advance_to(self, target: FlowState) -> bool {
        use FlowState::*;

        matches!((self, target), (Credentials, Profile) | (Profile, Success))
    }

    pub fn next(self) -> Option<FlowState> {
        match self {
            Self::Credentials => Some(Self::Profile),
            Self::Profile => Some(Self::Success),
            Self::Success => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Credentials => "credentials",
            Self::Profile => "profile",
            Self::Success => "success",
        };
        write!(f, "{s}")
    }
}

/// Step-guard violations. All recoverable: the caller gets a message and the
/// session stays interactive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("this flow is on the {actual} step, not {expected}")]
    WrongState {
        expected: FlowState,
        actual: FlowState,
    },

    #[error("a submission for this step is already in progress")]
    SubmissionInFlight,
}

/// One signup flow, owned by the session store. Explicitly constructed and
/// addressed by id; there is no ambient controller instance.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSession {
    pub id: Uuid,
    pub state: FlowState,
    /// True while a backend call for the current step is outstanding.
    pub pending: bool,
    /// Opaque account identifier, set once the credentials step succeeds.
    pub account_id: Option<String>,
    pub utm: UtmParams,
    /// One-shot latch for the conversion event.
    converted: bool,
    pub created_at: DateTime<Utc>,
}

impl FlowSession {
    pub fn new(utm: UtmParams) -> Self {
        FlowSession {
            id: Uuid::new_v4(),
            state: FlowState::Credentials,
            pending: false,
            account_id: None,
            utm,
            converted: false,
            created_at: Utc::now(),
        }
    }

    /// Start a submission for `expected`. Rejects when the flow is on a
    /// different step or a submission is already in flight; otherwise marks
    /// the session pending.
    pub fn begin_step(&mut self, expected: FlowState) -> Result<(), FlowError> {
        if self.state != expected {
            return Err(FlowError::WrongState {
                expected,
                actual: self.state,
            });
        }
        if self.pending {
            return Err(FlowError::SubmissionInFlight);
        }
        self.pending = true;
        Ok(())
    }

    /// The outstanding submission succeeded: advance and re-enable.
    pub fn complete_step(&mut self) {
        debug_assert!(self.pending, "complete_step without begin_step");
        if let Some(next) = self.state.next() {
            debug_assert!(self.state.can_advance_to(next));
            self.state = next;
        }
        self.pending = false;
    }

    /// The outstanding submission failed: stay on the current step and
    /// re-enable the form for an explicit retry.
    pub fn fail_step(&mut self) {
        self.pending = false;
    }

    /// Skip the optional profile step. No backend call is involved, so this
    /// transitions immediately, but only from an idle `Profile` state.
    pub fn skip_profile(&mut self) -> Result<(), FlowError> {
        if self.state != FlowState::Profile {
            return Err(FlowError::WrongState {
                expected: FlowState::Profile,
                actual: self.state,
            });
        }
        if self.pending {
            return Err(FlowError::SubmissionInFlight);
        }
        self.state = FlowState::Success;
        Ok(())
    }

    /// Arms the one-time conversion event. Returns true exactly once, on the
    /// first call after the flow reaches `Success`.
    pub fn mark_converted(&mut self) -> bool {
        if self.state.is_terminal() && !self.converted {
            self.converted = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FlowSession {
        FlowSession::new(UtmParams::default())
    }

    #[test]
    fn test_flow_starts_at_credentials() {
        let s = session();
        assert_eq!(s.state, FlowState::Credentials);
        assert!(!s.pending);
        assert!(s.account_id.is_none());
    }

    #[test]
    fn test_transitions_are_forward_only() {
        use FlowState::*;

        assert!(Credentials.can_advance_to(Profile));
        assert!(Profile.can_advance_to(Success));
        assert!(!Profile.can_advance_to(Credentials));
        assert!(!Success.can_advance_to(Profile));
        assert!(!Success.can_advance_to(Credentials));
        assert!(!Credentials.can_advance_to(Success));
        assert!(Success.next().is_none());
    }

    #[test]
    fn test_successful_credentials_submission_advances_to_profile() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        assert!(s.pending);
        s.complete_step();
        assert_eq!(s.state, FlowState::Profile);
        assert!(!s.pending);
    }

    #[test]
    fn test_failed_submission_keeps_state_and_re_enables() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        s.fail_step();
        assert_eq!(s.state, FlowState::Credentials);
        assert!(!s.pending);
        // The user can retry.
        assert!(s.begin_step(FlowState::Credentials).is_ok());
    }

    #[test]
    fn test_second_submission_rejected_while_in_flight() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        assert_eq!(
            s.begin_step(FlowState::Credentials),
            Err(FlowError::SubmissionInFlight)
        );
    }

    #[test]
    fn test_step_guard_rejects_wrong_state() {
        let mut s = session();
        let err = s.begin_step(FlowState::Profile).unwrap_err();
        assert_eq!(
            err,
            FlowError::WrongState {
                expected: FlowState::Profile,
                actual: FlowState::Credentials,
            }
        );
        assert!(!s.pending, "a rejected begin must not mark pending");
    }

    #[test]
    fn test_flow_never_reverts_after_reaching_profile() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        s.complete_step();
        // A stale credentials submission is rejected and changes nothing.
        assert!(s.begin_step(FlowState::Credentials).is_err());
        assert_eq!(s.state, FlowState::Profile);
    }

    #[test]
    fn test_profile_submission_reaches_success() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        s.complete_step();
        s.begin_step(FlowState::Profile).unwrap();
        s.complete_step();
        assert_eq!(s.state, FlowState::Success);
        assert!(s.state.is_terminal());
    }

    #[test]
    fn test_skip_always_yields_success() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        s.complete_step();
        s.skip_profile().unwrap();
        assert_eq!(s.state, FlowState::Success);
    }

    #[test]
    fn test_skip_rejected_outside_profile() {
        let mut s = session();
        assert!(s.skip_profile().is_err());
        assert_eq!(s.state, FlowState::Credentials);
    }

    #[test]
    fn test_skip_rejected_while_profile_submission_in_flight() {
        let mut s = session();
        s.begin_step(FlowState::Credentials).unwrap();
        s.complete_step();
        s.begin_step(FlowState::Profile).unwrap();
        assert_eq!(s.skip_profile(), Err(FlowError::SubmissionInFlight));
    }

    #[test]
    fn test_conversion_fires_exactly_once() {
        let mut s = session();
        assert!(!s.mark_converted(), "not converted before success");
        s.begin_step(FlowState::Credentials).unwrap();
        s.complete_step();
        s.skip_profile().unwrap();
        assert!(s.mark_converted());
        assert!(!s.mark_converted(), "latch must only fire once");
    }

    #[test]
    fn test_flow_error_messages_are_user_facing() {
        let err = FlowError::WrongState {
            expected: FlowState::Profile,
            actual: FlowState::Success,
        };
        assert_eq!(err.to_string(), "this flow is on the success step, not profile");
        assert_eq!(
            FlowError::SubmissionInFlight.to_string(),
            "a submission for this step is already in progress"
        );
    }
}
