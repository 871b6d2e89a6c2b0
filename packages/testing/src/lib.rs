#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in event queue packages.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a test waits to convince itself that a thread is blocked rather than merely slow
/// to start running.
///
/// There is no way to observe "blocked on a condition variable" directly, so tests give the
/// thread this long to finish and treat it as blocked if it has not.
pub const SETTLE_TIME: Duration = Duration::from_millis(100);

/// Runs `test_fn` on its own thread and fails the test if it does not finish in time.
///
/// Event queue tests block on condition variables all the time: consumers wait for events,
/// producers wait in `join()`. A lost wakeup or a join that is never finalized shows up as a
/// hang, which this turns into a test failure naming the likely cause.
///
/// The limit is 10 seconds, or 60 seconds under Miri because its thread scheduling is slow.
///
/// Setting `MUTATION_TESTING=1` runs `test_fn` directly on the calling thread with no limit, so
/// that the mutation testing harness applies its own timeout to mutants that hang.
///
/// # Panics
///
/// Panics if `test_fn` runs past the limit, and resumes the panic if `test_fn` panics.
///
/// # Example
///
/// ```rust
/// use std::sync::mpsc;
/// use std::thread;
///
/// use testing::with_watchdog;
///
/// let received = with_watchdog(|| {
///     let (tx, rx) = mpsc::channel();
///     thread::spawn(move || tx.send(7).unwrap());
///     rx.recv().unwrap()
/// });
///
/// assert_eq!(received, 7);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let runner = thread::spawn(move || {
        // Fails only if we already gave up waiting below.
        drop(tx.send(test_fn()));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            runner.join().expect("test thread sent its result, so it cannot have panicked");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!(
                "test did not finish within {timeout:?} - a consumer or joiner was likely never woken up"
            );
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // The sender was dropped without sending, so the test panicked. Re-raise it here.
            match runner.join() {
                Ok(()) => panic!("test thread exited without reporting a result"),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
    }
}

/// Asserts that the thread behind `handle` is still running after `settle_time` has passed.
///
/// Used to verify that an operation blocks until some other party acts, e.g. that a consumer
/// waits for an event or that a producer waits for its event to be processed.
///
/// # Panics
///
/// Panics if the thread has already finished.
pub fn assert_still_running<T>(handle: &JoinHandle<T>, settle_time: Duration) {
    thread::sleep(settle_time);

    assert!(
        !handle.is_finished(),
        "thread finished within {settle_time:?} but was expected to be blocked"
    );
}
