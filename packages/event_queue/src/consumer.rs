use tracing::{debug, trace};

use crate::{Completion, Delivery, EventQueue};

/// Receives events from an [`EventQueue`] on behalf of one thread.
///
/// A consumer finalizes a received event lazily: the event counts as processed once the consumer
/// asks for the next one, calls [`complete_current()`][Self::complete_current] or is dropped. Only
/// then is a producer waiting on the event's [`JoinHandle`][crate::JoinHandle] released. This
/// gives the caller a chance to finish using the payload before the producer continues.
///
/// Any number of consumers can be bound to the same queue. Each event is delivered to exactly one
/// of them.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use event_queue::{Consumer, Delivery, EventQueue};
///
/// let queue = EventQueue::<u64>::new();
///
/// let total = thread::scope(|s| {
///     let worker = s.spawn(|| {
///         let mut consumer = Consumer::bind(&queue);
///         let mut total = 0;
///
///         while let Delivery::Event(value) = consumer.consume() {
///             total += value;
///         }
///
///         total
///     });
///
///     for value in 1..=3 {
///         queue.enqueue_joinable(value).join();
///     }
///
///     queue.request_shutdown();
///     worker.join().unwrap()
/// });
///
/// assert_eq!(total, 6);
/// ```
#[derive(Debug)]
pub struct Consumer<'q, T>
where
    T: Send,
{
    queue: &'q EventQueue<T>,

    // The join obligation of the most recently delivered event, if it was joinable.
    // Only ever touched by the thread that owns the consumer, so it needs no lock.
    pending_join: Option<Completion>,
}

impl<'q, T> Consumer<'q, T>
where
    T: Send,
{
    /// Binds a new consumer to `queue`.
    #[must_use]
    pub fn bind(queue: &'q EventQueue<T>) -> Self {
        debug!(queue = queue.name(), "consumer bound");

        Self {
            queue,
            pending_join: None,
        }
    }

    /// Finalizes the previously received event (if any), then blocks until the next event is
    /// available or the queue is shut down.
    ///
    /// Events are delivered in the order they were enqueued. Once shutdown has been requested,
    /// this returns [`Delivery::Shutdown`] even if events are still queued.
    #[must_use]
    pub fn consume(&mut self) -> Delivery<T> {
        // Never keep a producer waiting on the previous event while we block for the next one.
        self.complete_current();

        let Some(event) = self.queue.wait_for_event() else {
            return Delivery::Shutdown;
        };

        let (payload, completion) = event.into_parts();
        self.pending_join = completion;

        trace!(
            queue = self.queue.name(),
            joinable = self.pending_join.is_some(),
            "event delivered"
        );

        Delivery::Event(payload)
    }

    /// Finalizes the previously received event right away instead of waiting for the next
    /// call to [`consume()`][Self::consume], releasing a producer that is joined on it.
    ///
    /// Does nothing if there is no event awaiting finalization.
    pub fn complete_current(&mut self) {
        if let Some(completion) = self.pending_join.take() {
            // Completion happens on drop. The queue lock is not held here.
            drop(completion);
        }
    }

    /// Whether a previously received joinable event is still awaiting finalization.
    #[must_use]
    pub fn has_pending_join(&self) -> bool {
        self.pending_join.is_some()
    }

    /// The queue this consumer is bound to.
    #[must_use]
    pub fn queue(&self) -> &'q EventQueue<T> {
        self.queue
    }

    /// Releases the consumer, finalizing the previously received event (if any).
    ///
    /// Equivalent to dropping the consumer.
    pub fn destroy(self) {
        drop(self);
    }
}

impl<T> Drop for Consumer<'_, T>
where
    T: Send,
{
    fn drop(&mut self) {
        // A producer joined on the last delivered event would otherwise wait forever.
        self.complete_current();

        debug!(queue = self.queue.name(), "consumer released");
    }
}
