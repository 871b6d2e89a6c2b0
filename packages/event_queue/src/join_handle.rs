//! Producer and consumer endpoints of a join state.

use std::sync::Arc;
#[cfg(test)]
use std::sync::Weak;

use tracing::trace;

use crate::metrics::JOIN_WAIT_MS;
use crate::{JoinState, Retirement};

/// Creates the two endpoints of a fresh join state.
pub(crate) fn pair() -> (JoinHandle, Completion) {
    let state = Arc::new(JoinState::new());

    (
        JoinHandle {
            state: Some(Arc::clone(&state)),
        },
        Completion { state },
    )
}

/// Lets a producer wait until an event it enqueued has been fully processed by a consumer.
///
/// Returned by [`EventQueue::enqueue_joinable()`][crate::EventQueue::enqueue_joinable]. The event
/// counts as processed once the consumer that received it asks for its next event, calls
/// [`Consumer::complete_current()`][crate::Consumer::complete_current] or is dropped.
///
/// Each handle can be used once: either [`join()`][Self::join] to wait for processing or
/// [`detach()`][Self::detach] to declare that you will never wait. Dropping the handle without
/// calling either is equivalent to detaching.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use event_queue::{Delivery, EventQueue};
///
/// let queue = EventQueue::<String>::new();
///
/// thread::scope(|s| {
///     s.spawn(|| {
///         let mut consumer = queue.consumer();
///
///         while let Delivery::Event(message) = consumer.consume() {
///             println!("processing {message}");
///         }
///     });
///
///     let handle = queue.enqueue_joinable("Hello".to_string());
///
///     // Returns once the consumer is done with the message.
///     handle.join();
///
///     queue.request_shutdown();
/// });
/// ```
#[derive(Debug)]
#[must_use = "dropping a join handle detaches it - call detach() to make this explicit"]
pub struct JoinHandle {
    // Only `None` after the handle has been consumed by `join()` or `detach()`,
    // which tells our `Drop` that there is nothing left to do.
    state: Option<Arc<JoinState>>,
}

impl JoinHandle {
    /// Blocks the current thread until the event has been processed by a consumer.
    ///
    /// Returns immediately if processing has already finished.
    ///
    /// There is no timeout. If no consumer ever receives the event, this returns once the event
    /// is released undelivered (when the queue is dropped or the event is enqueued after shutdown).
    pub fn join(mut self) {
        let state = self.take_state();

        let retirement = JOIN_WAIT_MS.with(|e| e.observe_duration_millis(|| state.join()));

        trace!(%retirement, "join finished");
    }

    /// Declares that the producer will never wait for the event to be processed.
    ///
    /// The consumer still finalizes the event as usual but nobody is waiting for it.
    pub fn detach(mut self) {
        let state = self.take_state();
        Self::detach_state(&state);
    }

    /// Whether the event has already been processed, in which case [`join()`][Self::join]
    /// would return without blocking.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.is_completed())
    }

    fn take_state(&mut self) -> Arc<JoinState> {
        self.state
            .take()
            .expect("join handle state is only taken by self-consuming methods")
    }

    fn detach_state(state: &JoinState) {
        let retirement = state.detach();

        trace!(%retirement, "join handle detached");
    }

    #[cfg(test)]
    pub(crate) fn downgrade_state(&self) -> Weak<JoinState> {
        Arc::downgrade(
            self.state
                .as_ref()
                .expect("only consumed handles lack state"),
        )
    }
}

impl Drop for JoinHandle {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            Self::detach_state(&state);
        }
    }
}

/// Consumer side of a join state. Dropping it marks the event as processed.
///
/// Travels with the queued event and then sits in the consumer that received the event until the
/// consumer finishes with it. Whoever holds it last completes the join state.
#[derive(Debug)]
pub(crate) struct Completion {
    state: Arc<JoinState>,
}

impl Drop for Completion {
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    fn drop(&mut self) {
        let retirement = self.state.complete();

        trace!(%retirement, "event completed");
    }
}
