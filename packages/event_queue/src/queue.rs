use std::collections::VecDeque;
use std::mem;
use std::sync::{Condvar, Mutex, PoisonError};

use tracing::{debug, trace, warn};

use crate::metrics::{CONSUME_WAIT_MS, EVENTS_ENQUEUED};
use crate::{
    Consumer, DEFAULT_QUEUE_NAME, ERR_POISONED_LOCK, Event, EventQueueBuilder, JoinHandle,
    join_handle,
};

/// An unbounded FIFO queue that hands events from any number of producer threads to any number
/// of consumer threads.
///
/// Producers call [`enqueue()`][Self::enqueue] or, if they want to wait until the event has been
/// processed, [`enqueue_joinable()`][Self::enqueue_joinable]. Consumers bind a [`Consumer`] to
/// the queue and call [`Consumer::consume()`] in a loop until it reports shutdown.
///
/// The queue never inspects payloads. Ownership of a payload moves into the queue on enqueue
/// and out to whichever consumer receives it.
///
/// # Shutdown
///
/// [`request_shutdown()`][Self::request_shutdown] wakes every blocked consumer. Shutdown is
/// observed at the next blocking point: once requested, `consume()` reports shutdown even if
/// events were still queued. Those events are never delivered, so shutdown releases them
/// right away and finalizes their join handles. No producer waits forever.
///
/// # Example
///
/// ```rust
/// use event_queue::{Delivery, EventQueue};
///
/// let queue = EventQueue::<u32>::new();
///
/// queue.enqueue(1);
/// queue.enqueue(2);
///
/// let mut consumer = queue.consumer();
/// assert_eq!(consumer.consume(), Delivery::Event(1));
/// assert_eq!(consumer.consume(), Delivery::Event(2));
///
/// queue.request_shutdown();
/// assert_eq!(consumer.consume(), Delivery::Shutdown);
/// ```
#[derive(Debug)]
pub struct EventQueue<T>
where
    T: Send,
{
    name: String,

    state: Mutex<QueueState<T>>,

    // Signaled (one waiter) whenever an event is appended and (all waiters) on shutdown.
    // Always signaled while holding the `state` lock, so a consumer that has checked the
    // predicate but not yet started waiting cannot miss the signal.
    not_empty_or_shutdown: Condvar,
}

#[derive(Debug)]
struct QueueState<T> {
    events: VecDeque<Event<T>>,

    // Monotonic: once set, never cleared.
    shutdown: bool,
}

impl<T> EventQueue<T>
where
    T: Send,
{
    /// Creates an empty queue with default settings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_queue::EventQueue;
    ///
    /// let queue = EventQueue::<String>::new();
    /// assert!(queue.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a queue with custom settings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_queue::EventQueue;
    ///
    /// let queue = EventQueue::<String>::builder()
    ///     .name("log_writer")
    ///     .initial_capacity(128)
    ///     .build();
    ///
    /// assert_eq!(queue.name(), "log_writer");
    /// ```
    pub fn builder() -> EventQueueBuilder<T> {
        EventQueueBuilder::new()
    }

    pub(crate) fn from_builder(name: Option<String>, initial_capacity: usize) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),
            state: Mutex::new(QueueState {
                events: VecDeque::with_capacity(initial_capacity),
                shutdown: false,
            }),
            not_empty_or_shutdown: Condvar::new(),
        }
    }

    /// The name of the queue, as used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends an event that nobody will wait for, waking one blocked consumer.
    ///
    /// After shutdown has been requested, the event is released immediately instead of being
    /// queued, as no consumer would ever receive it.
    pub fn enqueue(&self, payload: T) {
        self.append(Event::new(payload));
    }

    /// Appends an event and returns a [`JoinHandle`] that the caller can use to wait until the
    /// event has been processed by a consumer.
    ///
    /// After shutdown has been requested, the event is released immediately instead of being
    /// queued, so joining the returned handle does not block.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_queue::{Delivery, EventQueue};
    ///
    /// let queue = EventQueue::<u32>::new();
    /// let handle = queue.enqueue_joinable(42);
    ///
    /// let mut consumer = queue.consumer();
    /// assert_eq!(consumer.consume(), Delivery::Event(42));
    /// assert!(!handle.is_finished());
    ///
    /// // The consumer is done with the event once it lets go of it.
    /// consumer.complete_current();
    /// assert!(handle.is_finished());
    /// handle.join();
    /// ```
    pub fn enqueue_joinable(&self, payload: T) -> JoinHandle {
        let (handle, completion) = join_handle::pair();

        self.append(Event::joinable(payload, completion));

        handle
    }

    fn append(&self, event: Event<T>) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        if state.shutdown {
            drop(state);

            warn!(
                queue = %self.name,
                joinable = event.is_joinable(),
                "event enqueued after shutdown was requested - releasing it undelivered"
            );

            // Completing a join state takes its own lock, which we must never do while
            // holding the queue lock, so the event is only dropped after we let go above.
            drop(event);
            return;
        }

        let joinable = event.is_joinable();
        state.events.push_back(event);
        let pending = state.events.len();

        // Exactly one event became available, so one consumer is enough.
        self.not_empty_or_shutdown.notify_one();

        drop(state);

        EVENTS_ENQUEUED.with(|e| e.observe_once());
        trace!(queue = %self.name, joinable, pending, "event enqueued");
    }

    /// Shuts down the queue, waking every blocked consumer so it can observe the shutdown.
    ///
    /// Consumers that call [`Consumer::consume()`] afterwards get [`Delivery::Shutdown`]
    /// immediately. Events still queued at this point are released undelivered, which returns
    /// control to any producer joined on them.
    ///
    /// Shutdown is terminal. Calling this again has no further effect.
    ///
    /// [`Delivery::Shutdown`]: crate::Delivery::Shutdown
    #[cfg_attr(test, mutants::skip)] // Removing this causes timeouts (consumers never stop).
    pub fn request_shutdown(&self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        if state.shutdown {
            drop(state);
            debug!(queue = %self.name, "shutdown was already requested");
            return;
        }

        state.shutdown = true;
        let undelivered = mem::take(&mut state.events);

        // No new events will ever arrive to wake the remaining waiters one by one.
        self.not_empty_or_shutdown.notify_all();

        drop(state);

        debug!(
            queue = %self.name,
            undelivered = undelivered.len(),
            "shutdown requested"
        );

        // Completing a join state takes its own lock, so the events are only released
        // once the queue lock is no longer held.
        drop(undelivered);
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().expect(ERR_POISONED_LOCK).shutdown
    }

    /// The number of events waiting to be consumed.
    ///
    /// This is a snapshot; the value may be outdated by the time it is returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().expect(ERR_POISONED_LOCK).events.len()
    }

    /// Whether no events are waiting to be consumed.
    ///
    /// This is a snapshot; the value may be outdated by the time it is returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().expect(ERR_POISONED_LOCK).events.is_empty()
    }

    /// Binds a new [`Consumer`] to this queue.
    ///
    /// Shorthand for [`Consumer::bind()`].
    #[must_use]
    pub fn consumer(&self) -> Consumer<'_, T> {
        Consumer::bind(self)
    }

    /// Blocks until an event is available or shutdown has been requested.
    ///
    /// Returns `None` on shutdown. Shutdown takes precedence over queued events.
    pub(crate) fn wait_for_event(&self) -> Option<Event<T>> {
        let event = CONSUME_WAIT_MS.with(|e| {
            e.observe_duration_millis(|| {
                let state = self.state.lock().expect(ERR_POISONED_LOCK);

                // The predicate is re-checked after every wakeup, spurious or not.
                let mut state = self
                    .not_empty_or_shutdown
                    .wait_while(state, |state| !state.shutdown && state.events.is_empty())
                    .expect(ERR_POISONED_LOCK);

                if state.shutdown {
                    None
                } else {
                    state.events.pop_front()
                }
            })
        });

        if event.is_none() {
            trace!(queue = %self.name, "consumer observed shutdown");
        }

        event
    }
}

impl<T> Default for EventQueue<T>
where
    T: Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for EventQueue<T>
where
    T: Send,
{
    fn drop(&mut self) {
        // We are about to go away, so a poisoned lock no longer matters and we must not panic here.
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        let undelivered = state.events.len();

        if undelivered > 0 {
            debug!(
                queue = %self.name,
                undelivered,
                "queue dropped with undelivered events - releasing them"
            );
        }

        // The events themselves are released when the field is dropped,
        // which completes any join states they carry.
    }
}
