//! Several worker threads share one event queue. Some work items are joined by the producer,
//! others are detached, and shutdown releases every idle worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use event_queue::{Delivery, EventQueue};

const WORKERS: usize = 4;
const ITEMS: u64 = 100;

fn main() {
    let queue = EventQueue::<u64>::new();
    let sum = AtomicU64::new(0);

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let queue = &queue;
            let sum = &sum;

            s.spawn(move || {
                let mut consumer = queue.consumer();
                let mut handled = 0_u64;

                while let Delivery::Event(value) = consumer.consume() {
                    sum.fetch_add(value, Ordering::Relaxed);
                    handled = handled.wrapping_add(1);
                }

                println!("Worker {worker} handled {handled} items");
            });
        }

        let mut joined = Vec::new();

        for value in 1..=ITEMS {
            let handle = queue.enqueue_joinable(value);

            if value % 10 == 0 {
                joined.push(handle);
            } else {
                handle.detach();
            }
        }

        for handle in joined {
            handle.join();
        }

        println!("All joined items have been processed");

        queue.request_shutdown();
    });

    // The last item was joined, so every item was received before shutdown.
    println!("Sum of handled items: {}", sum.load(Ordering::Relaxed));
}
