// goal_info.rs — Immutable identity of a submitted goal.
//
// A goal is identified by a 16-byte id chosen at submission time and stamped
// with the time the server accepted it. Both are captured when the handle is
// created and never change afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed-size opaque identifier for one goal.
///
/// Wraps a UUID so it serializes as the familiar hyphenated string while
/// still exposing the raw 16 bytes that travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(Uuid);

impl GoalId {
    /// A fresh random (v4) goal id, as a client would pick before sending.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for GoalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and submission metadata for a goal, as acknowledged by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalInfo {
    /// Unique identifier for this goal.
    pub goal_id: GoalId,

    /// When the goal was accepted.
    pub stamp: DateTime<Utc>,
}

impl GoalInfo {
    pub fn new(goal_id: GoalId, stamp: DateTime<Utc>) -> Self {
        Self { goal_id, stamp }
    }

    /// Metadata for a goal accepted right now.
    pub fn accepted_now(goal_id: GoalId) -> Self {
        Self::new(goal_id, Utc::now())
    }
}
