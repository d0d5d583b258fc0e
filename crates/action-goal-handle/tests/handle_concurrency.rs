// handle_concurrency.rs — Cross-thread behavior of a goal handle.
//
// These tests play both roles at once: the owning client pushing updates
// from one context, and any number of callers reading from others.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use action_goal_handle::{
    feedback_callback, Action, ClientGoalHandle, FeedbackCallback, GoalHandle, GoalHandleError,
    GoalId, GoalInfo, GoalStatus,
};
use tracing_subscriber::EnvFilter;

struct Countdown;

impl Action for Countdown {
    const NAME: &'static str = "countdown";
    type Goal = u32;
    type Feedback = u32;
    type Result = String;
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn new_client(callback: Option<FeedbackCallback<Countdown>>) -> ClientGoalHandle<Countdown> {
    ClientGoalHandle::new(GoalInfo::accepted_now(GoalId::random()), callback)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn all_waiters_registered_before_fulfillment_see_the_result() {
    init_tracing();
    let client = new_client(None);

    let waiters: Vec<_> = (0..16)
        .map(|_| {
            let handle = client.handle();
            tokio::spawn(async move { handle.async_result().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    client.set_status(GoalStatus::Executing).unwrap();
    client.set_result("liftoff".to_string()).unwrap();

    let mut results = Vec::new();
    for waiter in waiters {
        results.push(waiter.await.unwrap());
    }
    assert_eq!(results.len(), 16);
    for result in &results {
        assert_eq!(result.as_str(), "liftoff");
        assert!(Arc::ptr_eq(result, &results[0]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn result_relayed_after_terminal_status_reaches_waiters() {
    init_tracing();
    let client = new_client(None);

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let handle = client.handle();
            tokio::spawn(async move { handle.async_result().await })
        })
        .collect();

    // Status and result arrive as separate transport messages, status first.
    client.set_status(GoalStatus::Executing).unwrap();
    client.set_status(GoalStatus::Succeeded).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.set_result("touchdown".to_string()).unwrap();

    for waiter in waiters {
        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.as_str(), "touchdown");
    }
    assert_eq!(client.status(), GoalStatus::Succeeded);
    assert!(!client.is_valid());
}

#[tokio::test]
async fn late_waiter_gets_the_first_result_only() {
    init_tracing();
    let client = new_client(None);
    client.set_result("first".to_string()).unwrap();
    let err = client.set_result("second".to_string()).unwrap_err();
    assert!(matches!(err, GoalHandleError::AlreadyFulfilled { .. }));

    let handle = client.handle();
    assert_eq!(handle.async_result().await.as_str(), "first");
}

#[tokio::test]
async fn result_wait_can_time_out_without_touching_the_handle() {
    init_tracing();
    let client = new_client(None);
    let handle = client.handle();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), handle.async_result().wait()).await;
    assert!(timed_out.is_err());

    // The handle is still fully usable after an abandoned wait.
    client.finish(GoalStatus::Succeeded, "done".to_string()).unwrap();
    assert_eq!(handle.async_result().await.as_str(), "done");
    assert_eq!(handle.status(), GoalStatus::Succeeded);
}

#[test]
fn blocking_readers_on_plain_threads_see_the_result() {
    init_tracing();
    let client = new_client(None);
    let start = Arc::new(Barrier::new(5));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = client.handle();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                let pending = handle.async_result();
                start.wait();
                pending.blocking_wait()
            })
        })
        .collect();

    start.wait();
    client.finish(GoalStatus::Succeeded, "42".to_string()).unwrap();

    for reader in readers {
        assert_eq!(reader.join().unwrap().as_str(), "42");
    }
}

#[test]
fn readers_only_ever_observe_relayed_statuses() {
    init_tracing();
    let client = new_client(None);
    let handle = client.handle();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seen = Vec::new();
            while !done.load(Ordering::SeqCst) {
                let status = handle.status();
                if seen.last() != Some(&status) {
                    seen.push(status);
                }
            }
            seen.push(handle.status());
            seen
        })
    };

    for status in [
        GoalStatus::Executing,
        GoalStatus::Canceling,
        GoalStatus::Canceled,
    ] {
        client.set_status(status).unwrap();
        thread::sleep(Duration::from_millis(2));
    }
    assert!(client.set_status(GoalStatus::Executing).is_err());
    done.store(true, Ordering::SeqCst);

    let seen = reader.join().unwrap();
    assert_eq!(seen.last(), Some(&GoalStatus::Canceled));
    for status in &seen {
        assert!(matches!(
            status,
            GoalStatus::Accepted
                | GoalStatus::Executing
                | GoalStatus::Canceling
                | GoalStatus::Canceled
        ));
    }
}

#[test]
fn callback_swap_during_delivery_never_tears() {
    init_tracing();
    let old_calls = Arc::new(AtomicUsize::new(0));
    let new_calls = Arc::new(AtomicUsize::new(0));
    let in_callback = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    let slow_old = {
        let old_calls = Arc::clone(&old_calls);
        let in_callback = Arc::clone(&in_callback);
        let release = Arc::clone(&release);
        feedback_callback(move |_handle: Arc<GoalHandle<Countdown>>, _remaining: &u32| {
            old_calls.fetch_add(1, Ordering::SeqCst);
            in_callback.wait();
            release.wait();
        })
    };
    let fresh = {
        let new_calls = Arc::clone(&new_calls);
        feedback_callback(move |_handle: Arc<GoalHandle<Countdown>>, _remaining: &u32| {
            new_calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    let client = Arc::new(new_client(Some(slow_old)));
    let dispatcher = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.call_feedback(&3))
    };

    // The old callback is mid-flight; swapping and reading must not block on it.
    in_callback.wait();
    client.set_feedback_callback(Some(Arc::clone(&fresh))).unwrap();
    let installed = client.handle().feedback_callback().unwrap();
    assert!(Arc::ptr_eq(&installed, &fresh));
    assert_eq!(client.handle().status(), GoalStatus::Accepted);
    release.wait();

    assert!(dispatcher.join().unwrap());
    assert!(client.call_feedback(&2));

    assert_eq!(old_calls.load(Ordering::SeqCst), 1);
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn feedback_callbacks_never_overlap() {
    init_tracing();
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let callback = {
        let active = Arc::clone(&active);
        let overlaps = Arc::clone(&overlaps);
        let total = Arc::clone(&total);
        feedback_callback(move |_handle: Arc<GoalHandle<Countdown>>, _remaining: &u32| {
            if active.fetch_add(1, Ordering::SeqCst) != 0 {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_micros(200));
            active.fetch_sub(1, Ordering::SeqCst);
            total.fetch_add(1, Ordering::SeqCst);
        })
    };

    let client = Arc::new(new_client(Some(callback)));
    let senders: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for remaining in 0..10 {
                    client.call_feedback(&remaining);
                }
            })
        })
        .collect();
    for sender in senders {
        sender.join().unwrap();
    }

    assert_eq!(total.load(Ordering::SeqCst), 40);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn callback_sees_the_handle_it_was_delivered_for() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let callback = {
        let seen = Arc::clone(&seen);
        feedback_callback(move |handle: Arc<GoalHandle<Countdown>>, remaining: &u32| {
            seen.lock().unwrap().push((handle.goal_id(), *remaining));
        })
    };

    let client = new_client(Some(callback));
    client.set_status(GoalStatus::Executing).unwrap();
    for remaining in (0..3).rev() {
        assert!(client.call_feedback(&remaining));
    }
    client.set_status(GoalStatus::Succeeded).unwrap();
    assert!(!client.call_feedback(&0));

    let goal_id = client.goal_id();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(goal_id, 2), (goal_id, 1), (goal_id, 0)]
    );
}

#[test]
fn client_teardown_mid_execution_keeps_history_readable() {
    init_tracing();
    let client = new_client(None);
    client.set_status(GoalStatus::Executing).unwrap();
    client.set_result_awareness(true).unwrap();
    let handle = client.handle();

    assert!(client.invalidate());
    assert!(client.set_status(GoalStatus::Succeeded).unwrap_err().is_stale());
    assert!(client.set_result("late".to_string()).unwrap_err().is_stale());
    assert!(client.set_result_awareness(false).unwrap_err().is_stale());

    drop(client);
    assert!(!handle.is_valid());
    assert_eq!(handle.status(), GoalStatus::Executing);
    assert!(handle.is_result_aware());
    assert!(handle.async_result().try_get().is_none());
}
