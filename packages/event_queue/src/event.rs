use crate::Completion;

/// A queued payload, optionally carrying the consumer side of a join state.
///
/// Dropping an event without handing it to a consumer (e.g. when the queue itself is dropped)
/// completes its join state, so a producer blocked in `join()` is never stranded.
#[derive(Debug)]
pub(crate) struct Event<T> {
    payload: T,
    completion: Option<Completion>,
}

impl<T> Event<T> {
    pub(crate) fn new(payload: T) -> Self {
        Self {
            payload,
            completion: None,
        }
    }

    pub(crate) fn joinable(payload: T, completion: Completion) -> Self {
        Self {
            payload,
            completion: Some(completion),
        }
    }

    pub(crate) fn is_joinable(&self) -> bool {
        self.completion.is_some()
    }

    /// Splits the event into the payload and the completion obligation, if any.
    pub(crate) fn into_parts(self) -> (T, Option<Completion>) {
        (self.payload, self.completion)
    }
}
