//! Order flow states.
//!
//! The dialogue is linear with a return path: each step advances toward
//! the recorded order, every non-initial step except the category menu
//! can step back to its predecessor, and abort drops to `Idle` from
//! anywhere.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Per-chat conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderFlowState {
    /// No ordering conversation in progress.
    Idle,
    /// Category menu shown.
    ChooseCategory,
    /// Item menu for the chosen category shown.
    ChooseItem,
    /// Item details with confirm/back shown.
    ConfirmItem,
    /// Waiting for a quantity as free text.
    ChooseCount,
    /// Waiting for a deadline as free text.
    SetDeadline,
    /// Waiting for a destination search or quick-pick.
    SetDestination,
    /// Waiting for a comment or skip.
    SetComment,
}

impl OrderFlowState {
    /// The state `back` returns to, if this state has one.
    ///
    /// `ChooseCategory` is the first menu so it exposes no back option,
    /// and `Idle` has nothing to return to.
    pub fn predecessor(&self) -> Option<OrderFlowState> {
        use OrderFlowState::*;
        match self {
            Idle | ChooseCategory => None,
            ChooseItem => Some(ChooseCategory),
            ConfirmItem => Some(ChooseItem),
            ChooseCount => Some(ConfirmItem),
            SetDeadline => Some(ChooseCount),
            SetDestination => Some(SetDeadline),
            SetComment => Some(SetDestination),
        }
    }

    /// The state reached by completing this step.
    pub fn successor(&self) -> Option<OrderFlowState> {
        use OrderFlowState::*;
        match self {
            Idle => Some(ChooseCategory),
            ChooseCategory => Some(ChooseItem),
            ChooseItem => Some(ConfirmItem),
            ConfirmItem => Some(ChooseCount),
            ChooseCount => Some(SetDeadline),
            SetDeadline => Some(SetDestination),
            SetDestination => Some(SetComment),
            SetComment => Some(Idle),
        }
    }

    /// Whether an ordering conversation is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderFlowState::Idle)
    }
}

impl StateMachine for OrderFlowState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        let mut targets = Vec::with_capacity(3);
        if let Some(next) = self.successor() {
            targets.push(next);
        }
        if let Some(prev) = self.predecessor() {
            targets.push(prev);
        }
        // Abort is legal from any active state
        if self.is_active() && !targets.contains(&OrderFlowState::Idle) {
            targets.push(OrderFlowState::Idle);
        }
        targets
    }
}
