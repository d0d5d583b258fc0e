// error.rs — Error types for goal handle mutations.
//
// Only the owning client ever sees these: reader operations on a handle are
// total and return the last known state instead of failing.

use thiserror::Error;

use crate::goal_info::GoalId;

/// Errors returned by the owning client's mutators on a goal handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalHandleError {
    /// A write was attempted after the handle was invalidated, either by a
    /// terminal status or an explicit `invalidate()`. No state was changed.
    /// A terminal status alone still admits the one pending result.
    #[error("stale update rejected: {operation} on invalidated handle for goal {goal_id}")]
    StaleUpdate {
        goal_id: GoalId,
        operation: &'static str,
    },

    /// `set_result` was called a second time. The first value stands.
    #[error("result for goal {goal_id} was already fulfilled")]
    AlreadyFulfilled { goal_id: GoalId },

    /// A raw status code received from the transport has no `GoalStatus`.
    #[error("unknown goal status code: {0}")]
    UnknownStatusCode(i8),
}

impl GoalHandleError {
    /// True for the recoverable "handle already quarantined" case.
    pub fn is_stale(&self) -> bool {
        matches!(self, GoalHandleError::StaleUpdate { .. })
    }
}
