// A poisoned lock means the process is in an unrecoverable/unsafe state and must exit (we panic).
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution \
    is not safe because we can no longer ensure that queued events are handed off correctly";

/// Name used in log fields for queues that were not given a name via the builder.
pub(crate) const DEFAULT_QUEUE_NAME: &str = "event_queue";
