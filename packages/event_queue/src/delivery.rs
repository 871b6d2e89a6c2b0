/// Result of [`Consumer::consume()`][crate::Consumer::consume].
#[derive(Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a consumer either gets an event or is told to stop - nothing else can happen"
)]
pub enum Delivery<T> {
    /// The next event in the queue, in submission order.
    Event(T),

    /// The queue has been shut down. The consumer should stop consuming.
    Shutdown,
}

impl<T> Delivery<T> {
    /// Returns the payload of the delivered event, or `None` on shutdown.
    #[must_use]
    pub fn into_event(self) -> Option<T> {
        match self {
            Self::Event(payload) => Some(payload),
            Self::Shutdown => None,
        }
    }

    /// Whether the queue has been shut down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
}
