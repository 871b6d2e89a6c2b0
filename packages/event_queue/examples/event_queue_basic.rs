//! Basic usage of an event queue: a producer hands events to a consumer thread and waits
//! for one of them to be processed.

use std::thread;

use event_queue::{Delivery, EventQueue};

fn main() {
    let queue = EventQueue::<String>::builder().name("greetings").build();

    thread::scope(|s| {
        s.spawn(|| {
            let mut consumer = queue.consumer();

            while let Delivery::Event(message) = consumer.consume() {
                println!("Consumer received: {message}");
            }

            println!("Consumer observed shutdown");
        });

        queue.enqueue("Hello".to_string());
        queue.enqueue("World".to_string());

        let handle = queue.enqueue_joinable("Goodbye".to_string());
        handle.join();
        println!("Producer: the consumer is done with the last message");

        queue.request_shutdown();
    });
}
