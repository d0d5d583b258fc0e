//! # action-goal-handle
//!
//! Client-side handle for one in-flight action goal: an asynchronous,
//! cancellable remote operation that streams feedback and ends with a
//! single result.
//!
//! The owning client creates a [`ClientGoalHandle`] when the server accepts
//! a goal and relays status, feedback and the result into it. Everyone else
//! gets an `Arc<`[`GoalHandle`]`>` and can only read.
//!
//! ## Key components
//!
//! - [`GoalHandle`] — read-only view: status, result future, feedback callback,
//!   awareness flags
//! - [`ClientGoalHandle`] — the owning client's write capability
//! - [`GoalStatus`] — Accepted → Executing → (Canceling →) Succeeded / Canceled / Aborted
//! - [`ResultFuture`] — shared, single-assignment result delivery
//! - [`GoalHandleError`] — `StaleUpdate` and `AlreadyFulfilled`
//!
//! Once a terminal status is recorded (or the client calls
//! [`ClientGoalHandle::invalidate`]), the handle rejects all further writes
//! while readers keep seeing the last known state.

pub mod action;
pub mod error;
pub mod feedback;
pub mod goal_info;
pub mod handle;
pub mod options;
pub mod result;
pub mod status;

pub use action::Action;
pub use error::GoalHandleError;
pub use feedback::{feedback_callback, FeedbackCallback};
pub use goal_info::{GoalId, GoalInfo};
pub use handle::{ClientGoalHandle, GoalHandle};
pub use options::GoalHandleOptions;
pub use result::ResultFuture;
pub use status::GoalStatus;
