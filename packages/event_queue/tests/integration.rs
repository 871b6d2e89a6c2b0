//! Integration tests for the event queue, exercising it with real producer and consumer threads.
//!
//! Tests that rely on real sleeps to observe blocking are ignored under Miri, which is too slow
//! for them to be meaningful.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use event_queue::{Consumer, Delivery, EventQueue};
use testing::{SETTLE_TIME, assert_still_running, with_watchdog};

#[test]
fn single_producer_single_consumer_preserves_order() {
    with_watchdog(|| {
        let queue = EventQueue::new();

        for i in 0..1000 {
            queue.enqueue(i);
        }

        let mut consumer = queue.consumer();

        for i in 0..1000 {
            assert_eq!(consumer.consume(), Delivery::Event(i));
        }

        assert!(queue.is_empty());
    });
}

#[test]
fn order_is_preserved_across_threads() {
    with_watchdog(|| {
        let queue = Arc::new(EventQueue::new());

        let consumer_thread = thread::spawn({
            let queue = Arc::clone(&queue);
            move || {
                let mut consumer = queue.consumer();
                let mut received = Vec::new();

                while let Delivery::Event(value) = consumer.consume() {
                    received.push(value);
                }

                received
            }
        });

        for i in 0..1000 {
            queue.enqueue(i);
        }

        // Joining the last event guarantees everything before it was delivered too.
        queue.enqueue_joinable(1000).join();
        queue.request_shutdown();

        let received = consumer_thread.join().unwrap();
        assert_eq!(received, (0..=1000).collect::<Vec<_>>());
    });
}

#[cfg_attr(miri, ignore)] // Real sleeps are too slow under Miri.
#[test]
fn join_started_before_consumption_waits_for_finalization() {
    with_watchdog(|| {
        let queue = Arc::new(EventQueue::new());
        let handle = queue.enqueue_joinable("work");

        let joiner = thread::spawn(move || handle.join());
        assert_still_running(&joiner, SETTLE_TIME);

        let mut consumer = queue.consumer();
        assert_eq!(consumer.consume(), Delivery::Event("work"));

        // The consumer holds the event until it asks for the next one or is dropped.
        assert_still_running(&joiner, SETTLE_TIME);

        consumer.destroy();
        joiner.join().unwrap();
    });
}

#[test]
fn join_after_finalization_returns_immediately() {
    with_watchdog(|| {
        let queue = EventQueue::new();
        let handle = queue.enqueue_joinable(5);
        queue.enqueue(6);

        let mut consumer = queue.consumer();
        assert_eq!(consumer.consume(), Delivery::Event(5));
        assert_eq!(consumer.consume(), Delivery::Event(6));

        // Consuming the second event finalized the first.
        assert!(handle.is_finished());
        handle.join();
    });
}

#[test]
fn detach_before_consumption_does_not_block_consumer() {
    with_watchdog(|| {
        let queue = EventQueue::new();
        queue.enqueue_joinable(1).detach();

        let mut consumer = queue.consumer();
        assert_eq!(consumer.consume(), Delivery::Event(1));

        queue.request_shutdown();
        assert_eq!(consumer.consume(), Delivery::Shutdown);
    });
}

#[test]
fn detach_after_consumption_does_not_block_anyone() {
    with_watchdog(|| {
        let queue = EventQueue::new();
        let handle = queue.enqueue_joinable(1);

        let mut consumer = queue.consumer();
        assert_eq!(consumer.consume(), Delivery::Event(1));

        handle.detach();
        consumer.complete_current();
    });
}

#[test]
fn detach_after_finalization_does_not_block_anyone() {
    with_watchdog(|| {
        let queue = EventQueue::new();
        let handle = queue.enqueue_joinable(1);

        let mut consumer = queue.consumer();
        assert_eq!(consumer.consume(), Delivery::Event(1));
        consumer.complete_current();

        handle.detach();
    });
}

#[cfg_attr(miri, ignore)] // Real sleeps are too slow under Miri.
#[test]
fn shutdown_wakes_every_blocked_consumer() {
    with_watchdog(|| {
        let queue = Arc::new(EventQueue::<u32>::new());

        let consumers = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.consumer().consume())
            })
            .collect::<Vec<_>>();

        for consumer in &consumers {
            assert_still_running(consumer, SETTLE_TIME);
        }

        queue.request_shutdown();

        for consumer in consumers {
            assert_eq!(consumer.join().unwrap(), Delivery::Shutdown);
        }
    });
}

#[test]
fn shutdown_is_observed_before_queued_events() {
    with_watchdog(|| {
        let drops = Arc::new(AtomicUsize::new(0));
        let queue = EventQueue::new();

        queue.enqueue(DropCounter::new(&drops));
        let handle = queue.enqueue_joinable(DropCounter::new(&drops));

        queue.request_shutdown();

        let mut consumer = queue.consumer();
        assert!(consumer.consume().is_shutdown());

        // Shutdown released the undelivered events, which also releases the joiner.
        assert!(queue.is_empty());
        assert_eq!(drops.load(Ordering::Relaxed), 2);
        handle.join();
    });
}

#[test]
fn producer_joined_on_undelivered_event_returns_while_queue_lives() {
    with_watchdog(|| {
        let queue = EventQueue::new();

        thread::scope(|s| {
            let handle = queue.enqueue_joinable(1);
            queue.request_shutdown();

            let consumer = s.spawn(|| queue.consumer().consume());
            assert_eq!(consumer.join().unwrap(), Delivery::Shutdown);

            let joiner = s.spawn(move || handle.join());
            joiner.join().unwrap();
        });

        // Still alive here; the join above did not depend on the queue being dropped.
        assert!(queue.is_shutdown());
    });
}

#[test]
fn every_tagged_event_from_many_producers_is_delivered_once() {
    const PRODUCERS: usize = 8;
    const EVENTS_PER_PRODUCER: usize = 500;

    with_watchdog(|| {
        let queue = EventQueue::new();

        let received = thread::scope(|s| {
            let consumer_thread = s.spawn(|| {
                let mut consumer = Consumer::bind(&queue);
                let mut received = Vec::new();

                while let Delivery::Event(tag) = consumer.consume() {
                    received.push(tag);
                }

                received
            });

            let producers = (0..PRODUCERS)
                .map(|producer| {
                    let queue = &queue;
                    s.spawn(move || {
                        for i in 0..EVENTS_PER_PRODUCER {
                            queue.enqueue((producer, i));
                        }

                        // Returns once the consumer has moved past our last event.
                        queue.enqueue_joinable((producer, EVENTS_PER_PRODUCER)).join();
                    })
                })
                .collect::<Vec<_>>();

            for producer in producers {
                producer.join().unwrap();
            }

            queue.request_shutdown();
            consumer_thread.join().unwrap()
        });

        let expected_count = PRODUCERS * (EVENTS_PER_PRODUCER + 1);
        assert_eq!(received.len(), expected_count);

        let unique = received.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique.len(), expected_count);

        // Each producer's own events arrive in the order that producer submitted them.
        for producer in 0..PRODUCERS {
            let sequence = received
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, i)| *i)
                .collect::<Vec<_>>();

            assert_eq!(sequence, (0..=EVENTS_PER_PRODUCER).collect::<Vec<_>>());
        }
    });
}

#[test]
fn events_are_shared_between_multiple_consumers() {
    const CONSUMERS: usize = 4;
    const EVENTS: usize = 2000;

    with_watchdog(|| {
        let queue = EventQueue::new();
        let delivered = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..CONSUMERS {
                s.spawn(|| {
                    let mut consumer = queue.consumer();

                    while let Delivery::Event(_) = consumer.consume() {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }

            let handles = (0..EVENTS)
                .map(|i| queue.enqueue_joinable(i))
                .collect::<Vec<_>>();

            for handle in handles {
                handle.join();
            }

            queue.request_shutdown();
        });

        assert_eq!(delivered.load(Ordering::Relaxed), EVENTS);
    });
}

/// Counts how many times payloads were dropped, to detect leaks and double drops.
#[derive(Debug)]
struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    fn new(drops: &Arc<AtomicUsize>) -> Self {
        Self(Arc::clone(drops))
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}
