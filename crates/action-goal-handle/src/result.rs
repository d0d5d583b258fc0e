// result.rs — Shared, single-assignment delivery of a goal's final result.
//
// The handle owns the sending half of a `tokio::sync::watch` channel holding
// `Option<Arc<R>>`. It starts as `None` and is written exactly once by the
// handle under its mutex. Every `async_result()` call subscribes a fresh
// receiver, so all holders wait on the same slot and all of them (including
// late arrivals) see the same `Arc`.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

/// Sending side of the result slot, kept inside the handle state.
pub(crate) type ResultSlot<R> = watch::Sender<Option<Arc<R>>>;

pub(crate) fn result_slot<R>() -> ResultSlot<R> {
    let (sender, _) = watch::channel(None);
    sender
}

/// A cloneable view of a goal's eventual result.
///
/// Clones observe the same outcome; nothing is duplicated. Await it directly
/// (`handle.async_result().await`), call [`ResultFuture::wait`], or use
/// [`ResultFuture::blocking_wait`] from a thread without an async runtime.
///
/// Cancelling a wait is done the usual way for futures: drop it, or wrap it
/// in `tokio::time::timeout`.
pub struct ResultFuture<R> {
    receiver: watch::Receiver<Option<Arc<R>>>,
}

impl<R> ResultFuture<R> {
    pub(crate) fn new(receiver: watch::Receiver<Option<Arc<R>>>) -> Self {
        Self { receiver }
    }

    /// The result if it has already been published. Never blocks.
    pub fn try_get(&self) -> Option<Arc<R>> {
        self.receiver.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.receiver.borrow().is_some()
    }
}

impl<R: Send + Sync + 'static> ResultFuture<R> {
    /// Suspend until the result is published, then return it.
    ///
    /// Never resolves if the owning client drops the goal without a result.
    pub async fn wait(mut self) -> Arc<R> {
        let published = match self.receiver.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        match published {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    /// Block the current thread until the result is published.
    pub fn blocking_wait(self) -> Arc<R> {
        futures::executor::block_on(self.wait())
    }
}

impl<R> Clone for ResultFuture<R> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<R: Send + Sync + 'static> IntoFuture for ResultFuture<R> {
    type Output = Arc<R>;
    type IntoFuture = BoxFuture<'static, Arc<R>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl<R> fmt::Debug for ResultFuture<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFuture")
            .field("ready", &self.is_ready())
            .finish()
    }
}
