// action.rs — The goal-kind type parameter shared by every handle.

/// Describes one kind of action: what is sent, what streams back while it
/// runs, and what it finally produces.
///
/// The handle treats all three payloads as opaque. They are produced and
/// consumed by the transport layer, never inspected here.
pub trait Action: Send + Sync + 'static {
    /// Name used in log fields, e.g. `"navigate_to_pose"`.
    const NAME: &'static str;

    /// The request that started the goal.
    type Goal;

    /// Interim progress notification.
    type Feedback: Send + Sync + 'static;

    /// The single final payload.
    type Result: Send + Sync + 'static;
}
