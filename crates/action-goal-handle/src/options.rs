// options.rs — Construction-time facts about a goal.
//
// Whether the server streams feedback and whether it reports a result for
// this goal are negotiated elsewhere; the handle only records the answers.

use serde::{Deserialize, Serialize};

/// Capability facts supplied by the owning client when it creates a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalHandleOptions {
    /// Feedback is delivered for this goal. Fixed for the handle's lifetime.
    pub feedback_aware: bool,

    /// The server reports a result for this goal. The client may set this
    /// once more shortly after construction.
    pub result_aware: bool,
}

impl GoalHandleOptions {
    pub fn new(feedback_aware: bool, result_aware: bool) -> Self {
        Self {
            feedback_aware,
            result_aware,
        }
    }
}
