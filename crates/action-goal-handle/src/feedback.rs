// feedback.rs — Callback type for interim progress notifications.

use std::sync::Arc;

use crate::action::Action;
use crate::handle::GoalHandle;

/// Callback invoked by the owning client for every feedback message.
///
/// It receives a reader reference to the handle the feedback belongs to, so
/// it can inspect status or keep the handle around. Stored behind an `Arc` so
/// the handle can hand out a copy and invoke it without holding its lock.
pub type FeedbackCallback<A> =
    Arc<dyn Fn(Arc<GoalHandle<A>>, &<A as Action>::Feedback) + Send + Sync>;

/// Wrap a closure as a [`FeedbackCallback`].
pub fn feedback_callback<A, F>(f: F) -> FeedbackCallback<A>
where
    A: Action,
    F: Fn(Arc<GoalHandle<A>>, &A::Feedback) + Send + Sync + 'static,
{
    Arc::new(f)
}
