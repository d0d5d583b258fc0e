// handle.rs — The client-side goal handle and its quarantine rule.
//
// One goal handle exists per accepted goal. It is shared between two kinds
// of holders:
//
// - `GoalHandle<A>`: the read-only view, handed out as `Arc<GoalHandle<A>>`
//   to anyone interested in the goal (callers, feedback callbacks).
// - `ClientGoalHandle<A>`: the write capability, held only by the owning
//   client. It is the only way to reach the mutators, which are `pub(crate)`
//   on `GoalHandle`.
//
// All mutable state lives behind one mutex. Every write goes through
// `GoalHandle::update`, which checks validity once:
//
//   Valid ──(terminal status)──▶ Terminal ──(invalidate())──▶ Invalidated
//   Valid ──(invalidate())──────────────────────────────────▶ Invalidated
//
// Once the handle leaves `Valid`, writes fail with `StaleUpdate` and change
// nothing. The one exception is the result: the server reports status and
// result in separate messages, so a `Terminal` handle still accepts the
// single pending result. Reads keep returning the last known values.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::error::GoalHandleError;
use crate::feedback::FeedbackCallback;
use crate::goal_info::{GoalId, GoalInfo};
use crate::options::GoalHandleOptions;
use crate::result::{result_slot, ResultFuture, ResultSlot};
use crate::status::GoalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validity {
    Valid,
    // A terminal status was recorded; only the pending result may still land.
    Terminal,
    // Explicit invalidation by the client; nothing may land.
    Invalidated,
}

/// Which handle states a write is admitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admit {
    ValidOnly,
    UntilInvalidated,
}

impl Validity {
    fn admits(self, admit: Admit) -> bool {
        matches!(
            (self, admit),
            (Validity::Valid, _) | (Validity::Terminal, Admit::UntilInvalidated)
        )
    }
}

struct HandleState<A: Action> {
    validity: Validity,
    status: GoalStatus,
    result_aware: bool,
    result: ResultSlot<A::Result>,
    feedback_callback: Option<FeedbackCallback<A>>,
}

impl<A: Action> HandleState<A> {
    fn is_fulfilled(&self) -> bool {
        self.result.borrow().is_some()
    }

    fn publish_result(
        &mut self,
        goal_id: GoalId,
        result: Arc<A::Result>,
    ) -> Result<(), GoalHandleError> {
        if self.is_fulfilled() {
            warn!(goal_id = %goal_id, action = A::NAME, "result already fulfilled; ignoring second result");
            return Err(GoalHandleError::AlreadyFulfilled { goal_id });
        }
        // `send_replace` stores the value even when nobody is subscribed yet.
        self.result.send_replace(Some(result));
        debug!(goal_id = %goal_id, action = A::NAME, "result published");
        Ok(())
    }

    fn apply_status(&mut self, goal_id: GoalId, status: GoalStatus) {
        let previous = self.status;
        self.status = status;
        debug!(goal_id = %goal_id, action = A::NAME, from = %previous, to = %status, "goal status changed");
        if status.is_terminal() {
            self.validity = Validity::Terminal;
            debug!(goal_id = %goal_id, action = A::NAME, "goal handle invalidated by terminal status");
        }
    }
}

/// Read-only view of one in-flight goal.
///
/// Every accessor takes the handle's lock internally for the duration of the
/// read; callers never lock anything themselves. The handle is not `Clone`:
/// share it through `Arc` so that every holder observes the same state.
pub struct GoalHandle<A: Action> {
    info: GoalInfo,
    feedback_aware: bool,
    state: Mutex<HandleState<A>>,
    // Held while a feedback callback runs so callbacks never overlap.
    feedback_dispatch: Mutex<()>,
}

impl<A: Action> GoalHandle<A> {
    fn new(
        info: GoalInfo,
        callback: Option<FeedbackCallback<A>>,
        options: GoalHandleOptions,
    ) -> Self {
        Self {
            info,
            feedback_aware: options.feedback_aware,
            state: Mutex::new(HandleState {
                validity: Validity::Valid,
                status: GoalStatus::Accepted,
                result_aware: options.result_aware,
                result: result_slot(),
                feedback_callback: callback,
            }),
            feedback_dispatch: Mutex::new(()),
        }
    }

    // Recover from poisoning so readers stay total after a panic in another
    // holder of the lock.
    fn lock_state(&self) -> MutexGuard<'_, HandleState<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn goal_id(&self) -> GoalId {
        self.info.goal_id
    }

    /// When the server accepted the goal.
    pub fn goal_stamp(&self) -> DateTime<Utc> {
        self.info.stamp
    }

    pub fn info(&self) -> &GoalInfo {
        &self.info
    }

    /// The last status relayed by the owning client.
    pub fn status(&self) -> GoalStatus {
        self.lock_state().status
    }

    /// A future for the goal's final result.
    ///
    /// Every call returns a view of the same underlying outcome. Waiting does
    /// not hold the handle's lock.
    pub fn async_result(&self) -> ResultFuture<A::Result> {
        ResultFuture::new(self.lock_state().result.subscribe())
    }

    /// The currently installed feedback callback, if any.
    pub fn feedback_callback(&self) -> Option<FeedbackCallback<A>> {
        self.lock_state().feedback_callback.clone()
    }

    pub fn is_feedback_aware(&self) -> bool {
        self.feedback_aware
    }

    pub fn is_result_aware(&self) -> bool {
        self.lock_state().result_aware
    }

    /// False once a terminal status was seen or the client invalidated the
    /// handle. An invalid handle receives no further updates.
    pub fn is_valid(&self) -> bool {
        self.lock_state().validity == Validity::Valid
    }

    /// Single entry point for all writes.
    fn update<T>(
        &self,
        operation: &'static str,
        admit: Admit,
        apply: impl FnOnce(&mut HandleState<A>) -> Result<T, GoalHandleError>,
    ) -> Result<T, GoalHandleError> {
        let mut state = self.lock_state();
        if !state.validity.admits(admit) {
            debug!(
                goal_id = %self.info.goal_id,
                action = A::NAME,
                operation,
                "rejecting update on invalidated goal handle"
            );
            return Err(GoalHandleError::StaleUpdate {
                goal_id: self.info.goal_id,
                operation,
            });
        }
        apply(&mut *state)
    }

    pub(crate) fn set_status(&self, status: GoalStatus) -> Result<(), GoalHandleError> {
        let goal_id = self.info.goal_id;
        self.update("set_status", Admit::ValidOnly, |state| {
            state.apply_status(goal_id, status);
            Ok(())
        })
    }

    pub(crate) fn set_status_code(&self, code: i8) -> Result<GoalStatus, GoalHandleError> {
        let goal_id = self.info.goal_id;
        self.update("set_status_code", Admit::ValidOnly, |state| {
            let status = GoalStatus::try_from(code)?;
            state.apply_status(goal_id, status);
            Ok(status)
        })
    }

    pub(crate) fn set_result(&self, result: Arc<A::Result>) -> Result<(), GoalHandleError> {
        let goal_id = self.info.goal_id;
        self.update("set_result", Admit::UntilInvalidated, |state| {
            state.publish_result(goal_id, result)
        })
    }

    pub(crate) fn finish(
        &self,
        status: GoalStatus,
        result: Arc<A::Result>,
    ) -> Result<(), GoalHandleError> {
        let goal_id = self.info.goal_id;
        self.update("finish", Admit::ValidOnly, |state| {
            state.publish_result(goal_id, result)?;
            state.apply_status(goal_id, status);
            Ok(())
        })
    }

    pub(crate) fn set_feedback_callback(
        &self,
        callback: Option<FeedbackCallback<A>>,
    ) -> Result<(), GoalHandleError> {
        self.update("set_feedback_callback", Admit::ValidOnly, |state| {
            state.feedback_callback = callback;
            Ok(())
        })
    }

    pub(crate) fn set_result_awareness(&self, aware: bool) -> Result<(), GoalHandleError> {
        self.update("set_result_awareness", Admit::ValidOnly, |state| {
            state.result_aware = aware;
            Ok(())
        })
    }

    /// Returns true if this call moved the handle out of the valid state.
    ///
    /// Also closes a terminal handle to its pending result.
    pub(crate) fn invalidate(&self) -> bool {
        let mut state = self.lock_state();
        let previous = state.validity;
        if previous == Validity::Invalidated {
            return false;
        }
        state.validity = Validity::Invalidated;
        if previous == Validity::Terminal {
            debug!(goal_id = %self.info.goal_id, action = A::NAME, "terminal goal handle closed to late results");
            return false;
        }
        debug!(
            goal_id = %self.info.goal_id,
            action = A::NAME,
            status = %state.status,
            "goal handle invalidated"
        );
        true
    }

    /// Deliver one feedback message to the installed callback.
    ///
    /// The callback is copied out under the state lock and invoked after the
    /// lock is released, so it may freely read the handle. Must not be called
    /// from inside a feedback callback of the same handle.
    pub(crate) fn call_feedback(self: &Arc<Self>, feedback: &A::Feedback) -> bool {
        if !self.feedback_aware {
            trace!(goal_id = %self.info.goal_id, action = A::NAME, "goal is not feedback aware; dropping feedback");
            return false;
        }

        let _dispatch = self
            .feedback_dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let callback = {
            let state = self.lock_state();
            if state.validity != Validity::Valid {
                trace!(goal_id = %self.info.goal_id, action = A::NAME, "goal handle invalidated; dropping feedback");
                return false;
            }
            state.feedback_callback.clone()
        };

        match callback {
            Some(callback) => {
                callback(Arc::clone(self), feedback);
                true
            }
            None => false,
        }
    }
}

impl<A: Action> fmt::Debug for GoalHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("GoalHandle")
            .field("action", &A::NAME)
            .field("goal_id", &self.info.goal_id)
            .field("stamp", &self.info.stamp)
            .field("status", &state.status)
            .field("valid", &(state.validity == Validity::Valid))
            .field("feedback_aware", &self.feedback_aware)
            .field("result_aware", &state.result_aware)
            .field("fulfilled", &state.is_fulfilled())
            .finish()
    }
}

/// The owning client's write access to a goal handle.
///
/// Created by the client when the server acknowledges a goal. Hand out
/// [`ClientGoalHandle::handle`] to everyone else; they get read access only.
/// Dropping this value invalidates the handle, since no further updates can
/// arrive once the client lets go of it.
pub struct ClientGoalHandle<A: Action> {
    handle: Arc<GoalHandle<A>>,
}

impl<A: Action> ClientGoalHandle<A> {
    /// Create a handle for an accepted goal. The goal is feedback aware iff a
    /// callback is supplied; result awareness starts out false.
    pub fn new(info: GoalInfo, callback: Option<FeedbackCallback<A>>) -> Self {
        let options = GoalHandleOptions::new(callback.is_some(), false);
        Self::with_options(info, callback, options)
    }

    /// Create a handle with explicitly negotiated capability facts.
    pub fn with_options(
        info: GoalInfo,
        callback: Option<FeedbackCallback<A>>,
        options: GoalHandleOptions,
    ) -> Self {
        debug!(
            goal_id = %info.goal_id,
            action = A::NAME,
            feedback_aware = options.feedback_aware,
            result_aware = options.result_aware,
            "goal handle created"
        );
        Self {
            handle: Arc::new(GoalHandle::new(info, callback, options)),
        }
    }

    /// A read-only reference for callers.
    pub fn handle(&self) -> Arc<GoalHandle<A>> {
        Arc::clone(&self.handle)
    }

    /// Record a status update. A terminal status invalidates the handle.
    pub fn set_status(&self, status: GoalStatus) -> Result<(), GoalHandleError> {
        self.handle.set_status(status)
    }

    /// Record a status update received as a raw wire code.
    pub fn set_status_code(&self, code: i8) -> Result<GoalStatus, GoalHandleError> {
        self.handle.set_status_code(code)
    }

    /// Publish the final result to every current and future waiter.
    ///
    /// Does not change the status: the client relays status separately,
    /// usually first. Accepted once after a terminal status, but not after
    /// [`invalidate`](Self::invalidate).
    pub fn set_result(&self, result: A::Result) -> Result<(), GoalHandleError> {
        self.handle.set_result(Arc::new(result))
    }

    /// Like [`set_result`](Self::set_result) for a result that is already shared.
    pub fn set_shared_result(&self, result: Arc<A::Result>) -> Result<(), GoalHandleError> {
        self.handle.set_result(result)
    }

    /// Publish the result and the final status in one step.
    ///
    /// Use this when the result and the terminal status arrive together.
    pub fn finish(&self, status: GoalStatus, result: A::Result) -> Result<(), GoalHandleError> {
        self.handle.finish(status, Arc::new(result))
    }

    /// Replace (or clear) the feedback callback. A callback already running
    /// finishes with the instance it started with.
    pub fn set_feedback_callback(
        &self,
        callback: Option<FeedbackCallback<A>>,
    ) -> Result<(), GoalHandleError> {
        self.handle.set_feedback_callback(callback)
    }

    pub fn set_result_awareness(&self, aware: bool) -> Result<(), GoalHandleError> {
        self.handle.set_result_awareness(aware)
    }

    /// Permanently block further updates, e.g. on transport failure or when
    /// the goal stops being tracked. Idempotent; returns true on the first call.
    pub fn invalidate(&self) -> bool {
        self.handle.invalidate()
    }

    /// Deliver a feedback message. Returns false without invoking anything if
    /// the goal is not feedback aware, has no callback, or is invalidated.
    pub fn call_feedback(&self, feedback: &A::Feedback) -> bool {
        self.handle.call_feedback(feedback)
    }
}

impl<A: Action> Deref for ClientGoalHandle<A> {
    type Target = GoalHandle<A>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<A: Action> Drop for ClientGoalHandle<A> {
    fn drop(&mut self) {
        self.handle.invalidate();
    }
}

impl<A: Action> fmt::Debug for ClientGoalHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientGoalHandle").field(&self.handle).finish()
    }
}
