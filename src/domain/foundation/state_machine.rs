//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions, used by the order flow to make every legal edge
//! enumerable and testable in isolation.

use super::{DomainError, ErrorCode};

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for OrderFlowState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (ChooseCategory, ChooseItem) |
///             (ChooseItem, ConfirmItem) |
///             // ... etc
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             ChooseCategory => vec![ChooseItem, Idle],
///             // ... etc
///         }
///     }
/// }
///
/// // Usage:
/// let next = current.transition_to(OrderFlowState::ChooseItem)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Miniature flow exercising the trait's default methods
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PickStatus {
        Browsing,
        Picked,
        Submitted,
    }

    impl StateMachine for PickStatus {
        fn can_transition_to(&self, target: &Self) -> bool {
            use PickStatus::*;
            matches!(
                (self, target),
                (Browsing, Picked) | (Picked, Browsing) | (Picked, Submitted)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use PickStatus::*;
            match self {
                Browsing => vec![Picked],
                Picked => vec![Browsing, Submitted],
                Submitted => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        let next = PickStatus::Browsing.transition_to(PickStatus::Picked);
        assert!(matches!(next, Ok(PickStatus::Picked)));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let result = PickStatus::Browsing.transition_to(PickStatus::Submitted);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn back_edges_are_expressible() {
        assert!(PickStatus::Picked.can_transition_to(&PickStatus::Browsing));
    }

    #[test]
    fn is_terminal_only_for_submitted() {
        assert!(PickStatus::Submitted.is_terminal());
        assert!(!PickStatus::Browsing.is_terminal());
        assert!(!PickStatus::Picked.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for status in [PickStatus::Browsing, PickStatus::Picked, PickStatus::Submitted] {
            for target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&target),
                    "inconsistent edge {:?} -> {:?}",
                    status,
                    target
                );
            }
        }
    }
}
