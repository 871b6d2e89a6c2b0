#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Unbounded FIFO event queue for handing work from producer threads to consumer threads.
//!
//! Producers can optionally wait until a specific event they submitted has been fully processed
//! by whichever consumer received it, or explicitly disclaim interest in that.
//!
//! The core types are:
//!
//! - [`EventQueue`] - the shared queue; producers enqueue events into it.
//! - [`Consumer`] - a per-thread handle through which events are received.
//! - [`JoinHandle`] - returned by [`EventQueue::enqueue_joinable()`] to wait for processing.
//! - [`Delivery`] - what a consumer receives: an event or the shutdown signal.
//!
//! # Processing boundary
//!
//! A consumer does not need to acknowledge events explicitly. An event counts as processed once
//! the consumer that received it asks for the next event, calls
//! [`Consumer::complete_current()`] or is dropped.
//!
//! # Shutdown
//!
//! [`EventQueue::request_shutdown()`] wakes every blocked consumer, each of which then receives
//! [`Delivery::Shutdown`]. Shutdown is observed at the next blocking point; events still in the
//! queue at that time are not delivered.
//!
//! # Example
//!
//! ```rust
//! use std::thread;
//!
//! use event_queue::{Delivery, EventQueue};
//!
//! let queue = EventQueue::<String>::new();
//!
//! thread::scope(|s| {
//!     for _ in 0..2 {
//!         s.spawn(|| {
//!             let mut consumer = queue.consumer();
//!
//!             while let Delivery::Event(message) = consumer.consume() {
//!                 println!("handled {message}");
//!             }
//!         });
//!     }
//!
//!     // Fire and forget.
//!     queue.enqueue("first".to_string());
//!
//!     // Wait until a consumer is done with this one.
//!     queue.enqueue_joinable("second".to_string()).join();
//!
//!     // We do not care when this one is handled.
//!     queue.enqueue_joinable("third".to_string()).detach();
//!
//!     queue.request_shutdown();
//! });
//! ```

mod builder;
mod constants;
mod consumer;
mod delivery;
mod event;
mod join_handle;
mod join_state;
mod metrics;
mod queue;

pub use builder::*;
pub(crate) use constants::*;
pub use consumer::*;
pub use delivery::*;
pub(crate) use event::*;
pub use join_handle::JoinHandle;
pub(crate) use join_handle::Completion;
pub(crate) use join_state::*;
pub use queue::*;
