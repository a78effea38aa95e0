//! Dispatch lifecycle
//!
//! ```text
//! Unvalidated -> Validated -> Dispatched -> Completed
//!      |                          |
//!      +--------> Failed <--------+
//! ```
//!
//! `Failed` from `Unvalidated` means a guard rejected the request and the
//! engine was never contacted.

use crate::error::DispatchError;
use serde::Serialize;

/// Dispatch lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Inputs received, guards not yet evaluated
    Unvalidated,
    /// Guards passed
    Validated,
    /// Request handed to the engine
    Dispatched,
    /// Engine finished
    Completed,
    /// Guard or engine failure
    Failed,
}

impl DispatchState {
    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unvalidated => "unvalidated",
            Self::Validated => "validated",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validates a state transition.
///
/// # Errors
/// `DispatchError::IllegalTransition` for any edge not in the lifecycle
pub fn validate_transition(from: DispatchState, to: DispatchState) -> Result<(), DispatchError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(DispatchError::IllegalTransition { from, to })
    }
}

/// States reachable in one step
#[must_use]
pub fn allowed_transitions(from: DispatchState) -> Vec<DispatchState> {
    use DispatchState::*;
    match from {
        Unvalidated => vec![Validated, Failed],
        Validated => vec![Dispatched],
        Dispatched => vec![Completed, Failed],
        Completed | Failed => vec![],
    }
}

fn allowed(from: DispatchState, to: DispatchState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_state() -> impl Strategy<Value = DispatchState> {
        prop_oneof![
            Just(DispatchState::Unvalidated),
            Just(DispatchState::Validated),
            Just(DispatchState::Dispatched),
            Just(DispatchState::Completed),
            Just(DispatchState::Failed),
        ]
    }

    #[test]
    fn happy_path() {
        use DispatchState::*;
        for (from, to) in [(Unvalidated, Validated), (Validated, Dispatched), (Dispatched, Completed)] {
            assert!(validate_transition(from, to).is_ok());
        }
    }

    #[test]
    fn validated_cannot_fail_without_dispatch() {
        assert!(validate_transition(DispatchState::Validated, DispatchState::Failed).is_err());
    }

    #[test]
    fn cannot_skip_validation() {
        let err = validate_transition(DispatchState::Unvalidated, DispatchState::Dispatched)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::IllegalTransition {
                from: DispatchState::Unvalidated,
                to: DispatchState::Dispatched
            }
        ));
    }

    proptest! {
        #[test]
        fn terminal_states_have_no_exits(from in arb_state(), to in arb_state()) {
            if from.is_terminal() {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        #[test]
        fn no_self_loops(state in arb_state()) {
            prop_assert!(validate_transition(state, state).is_err());
        }
    }
}
