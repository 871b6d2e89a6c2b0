//! Metrics for the event queue.
//!
//! The metrics use per-thread event instances to minimize contention.

use nm::{Event, Magnitude};

/// Histogram buckets for blocking time in milliseconds.
///
/// Consumers that keep up with producers barely wait, whereas idle consumers and joiners of
/// long-running work can wait a long time, so the buckets span a wide range.
const WAIT_MS_BUCKETS: &[Magnitude] = &[0, 1, 2, 5, 10, 20, 50, 100, 200, 500, 1000, 5000];

thread_local! {
    /// Event for observing events accepted into a queue.
    pub(crate) static EVENTS_ENQUEUED: Event = Event::builder()
        .name("event_queue_enqueued")
        .build();

    /// Event for observing the time a consumer spent waiting for the next event.
    ///
    /// The magnitude is the wait in milliseconds.
    pub(crate) static CONSUME_WAIT_MS: Event = Event::builder()
        .name("event_queue_consume_wait_ms")
        .histogram(WAIT_MS_BUCKETS)
        .build();

    /// Event for observing the time a producer spent in `join()`.
    ///
    /// The magnitude is the wait in milliseconds.
    pub(crate) static JOIN_WAIT_MS: Event = Event::builder()
        .name("event_queue_join_wait_ms")
        .histogram(WAIT_MS_BUCKETS)
        .build();
}
