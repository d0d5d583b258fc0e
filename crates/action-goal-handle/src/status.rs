// status.rs — Lifecycle status of a goal as reported by the action server.
//
// The server drives an external state machine:
//   Accepted → Executing → Canceling → {Canceled, Aborted, Succeeded}
//   Accepted → Executing → {Succeeded, Aborted}
//
// The handle does not re-validate those edges; the owning client is trusted
// to relay them faithfully. The only rule enforced locally is that a terminal
// status ends all further writes except the pending result (see `handle.rs`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GoalHandleError;

/// The status of a goal.
///
/// Each variant has a fixed wire code (`code()`), matching the numbering
/// used by the transport's status messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Sentinel for "no update observed yet". Never the initial value of a handle.
    Unknown,

    /// The server accepted the goal but has not started executing it.
    #[default]
    Accepted,

    /// The goal is being executed.
    Executing,

    /// A cancel request was accepted; the server is winding the goal down.
    Canceling,

    /// Terminal: the goal completed successfully.
    Succeeded,

    /// Terminal: the goal was canceled on request.
    Canceled,

    /// Terminal: the server gave up on the goal.
    Aborted,
}

impl GoalStatus {
    /// True for `Succeeded`, `Canceled` and `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GoalStatus::Succeeded | GoalStatus::Canceled | GoalStatus::Aborted
        )
    }

    /// True while the server is still working on (or winding down) the goal.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            GoalStatus::Accepted | GoalStatus::Executing | GoalStatus::Canceling
        )
    }

    pub fn code(self) -> i8 {
        match self {
            GoalStatus::Unknown => 0,
            GoalStatus::Accepted => 1,
            GoalStatus::Executing => 2,
            GoalStatus::Canceling => 3,
            GoalStatus::Succeeded => 4,
            GoalStatus::Canceled => 5,
            GoalStatus::Aborted => 6,
        }
    }
}

impl TryFrom<i8> for GoalStatus {
    type Error = GoalHandleError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GoalStatus::Unknown),
            1 => Ok(GoalStatus::Accepted),
            2 => Ok(GoalStatus::Executing),
            3 => Ok(GoalStatus::Canceling),
            4 => Ok(GoalStatus::Succeeded),
            5 => Ok(GoalStatus::Canceled),
            6 => Ok(GoalStatus::Aborted),
            other => Err(GoalHandleError::UnknownStatusCode(other)),
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Unknown => write!(f, "unknown"),
            GoalStatus::Accepted => write!(f, "accepted"),
            GoalStatus::Executing => write!(f, "executing"),
            GoalStatus::Canceling => write!(f, "canceling"),
            GoalStatus::Succeeded => write!(f, "succeeded"),
            GoalStatus::Canceled => write!(f, "canceled"),
            GoalStatus::Aborted => write!(f, "aborted"),
        }
    }
}
