use std::marker::PhantomData;

use crate::EventQueue;

/// Creates an [`EventQueue`] with custom settings.
///
/// Obtained via [`EventQueue::builder()`].
#[derive(Debug)]
#[must_use]
pub struct EventQueueBuilder<T>
where
    T: Send,
{
    name: Option<String>,
    initial_capacity: usize,

    // The builder itself holds no `T`, so it should not inherit any auto traits from it.
    _payload: PhantomData<fn() -> T>,
}

impl<T> EventQueueBuilder<T>
where
    T: Send,
{
    pub(crate) fn new() -> Self {
        Self {
            name: None,
            initial_capacity: 0,
            _payload: PhantomData,
        }
    }

    /// Sets the name used to identify the queue in log output.
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets how many events the queue can hold before it needs to grow its storage.
    ///
    /// The queue is unbounded regardless of this value.
    pub fn initial_capacity(self, initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..self
        }
    }

    /// Creates the queue.
    #[must_use]
    pub fn build(self) -> EventQueue<T> {
        EventQueue::from_builder(self.name, self.initial_capacity)
    }
}
