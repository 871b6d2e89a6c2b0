//! Join state machine, shared between the producer that may wait for an event to be processed
//! and the consumer that finalizes the event once it has been processed.
//!
//! The following states exist:
//!
//! * pending - initial state; neither side has done anything yet.
//! * waiting - the producer is blocked in `join()` until the consumer finalizes the event.
//! * completed - the consumer has finalized the event but the producer has not yet observed it.
//! * detached - the producer has declared it will never join; the consumer is on its own.
//! * retired - terminal state; both sides are done and neither may touch the state again.
//!
//! Each side performs exactly one transition (the producer via `join()` or `detach()`, the consumer
//! via `complete()`). Whichever side observes that the other side has already finished is the one
//! that moves the state into `retired`. Transitions report this via [`Retirement`] so callers know
//! whether they performed the final release.
//!
//! | Current   | Operation    | Next      | Retired by |
//! |-----------|--------------|-----------|------------|
//! | pending   | `join()`     | waiting   | producer, after waking |
//! | pending   | `complete()` | completed | producer, on join/detach |
//! | pending   | `detach()`   | detached  | consumer, on complete |
//! | waiting   | `complete()` | completed | producer, after waking |
//! | completed | `join()`     | retired   | producer |
//! | completed | `detach()`   | retired   | producer |
//! | detached  | `complete()` | retired   | consumer |

use std::fmt;
use std::sync::{Condvar, Mutex};

use crate::ERR_POISONED_LOCK;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum JoinPhase {
    Pending,
    Waiting,
    Completed,
    Detached,
    Retired,
}

/// Outcome of a join state transition, from the point of view of the side that performed it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Retirement {
    /// The caller performed the final transition. The other side has already let go.
    Retired,

    /// The other side still has a transition to perform and will retire the state.
    HandedOff,
}

impl fmt::Display for Retirement {
    #[cfg_attr(test, mutants::skip)] // No API contract for log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retired => write!(f, "retired"),
            Self::HandedOff => write!(f, "handed off"),
        }
    }
}

/// Synchronizes one producer with one consumer around the processing of a single event.
#[derive(Debug)]
pub(crate) struct JoinState {
    phase: Mutex<JoinPhase>,

    // Signaled by the consumer when it completes while the producer is waiting.
    completed: Condvar,
}

impl JoinState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Mutex::new(JoinPhase::Pending),
            completed: Condvar::new(),
        }
    }

    /// Producer side. Blocks until the consumer has completed the event.
    ///
    /// The producer always retires the state when joining: either the consumer was already done,
    /// or the consumer handed the state over when it woke us up.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub(crate) fn join(&self) -> Retirement {
        let mut phase = self.phase.lock().expect(ERR_POISONED_LOCK);

        match *phase {
            JoinPhase::Pending => {
                *phase = JoinPhase::Waiting;

                // Spurious wakeups leave the phase at `Waiting`, so we simply go back to sleep.
                phase = self
                    .completed
                    .wait_while(phase, |phase| *phase == JoinPhase::Waiting)
                    .expect(ERR_POISONED_LOCK);

                assert_eq!(
                    *phase,
                    JoinPhase::Completed,
                    "joiner woke up to a join state that the consumer did not complete"
                );

                *phase = JoinPhase::Retired;
                Retirement::Retired
            }
            JoinPhase::Completed => {
                *phase = JoinPhase::Retired;
                Retirement::Retired
            }
            other => invalid_transition(other, "join"),
        }
    }

    /// Producer side. Disclaims interest in the completion of the event.
    pub(crate) fn detach(&self) -> Retirement {
        let mut phase = self.phase.lock().expect(ERR_POISONED_LOCK);

        match *phase {
            JoinPhase::Pending => {
                *phase = JoinPhase::Detached;
                Retirement::HandedOff
            }
            JoinPhase::Completed => {
                *phase = JoinPhase::Retired;
                Retirement::Retired
            }
            other => invalid_transition(other, "detach"),
        }
    }

    /// Consumer side. Marks the event as processed, releasing a waiting producer if there is one.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub(crate) fn complete(&self) -> Retirement {
        let mut phase = self.phase.lock().expect(ERR_POISONED_LOCK);

        match *phase {
            JoinPhase::Pending => {
                *phase = JoinPhase::Completed;
                Retirement::HandedOff
            }
            JoinPhase::Waiting => {
                *phase = JoinPhase::Completed;

                // We notify while still holding the lock. The producer cannot observe the new
                // phase until we release it, after which we never touch the state again.
                self.completed.notify_one();
                Retirement::HandedOff
            }
            JoinPhase::Detached => {
                *phase = JoinPhase::Retired;
                Retirement::Retired
            }
            other => invalid_transition(other, "complete"),
        }
    }

    /// Whether the consumer has completed the event and the producer has not yet retired it.
    pub(crate) fn is_completed(&self) -> bool {
        *self.phase.lock().expect(ERR_POISONED_LOCK) == JoinPhase::Completed
    }

    #[cfg(test)]
    fn is_retired(&self) -> bool {
        *self.phase.lock().expect(ERR_POISONED_LOCK) == JoinPhase::Retired
    }
}

#[cold]
fn invalid_transition(phase: JoinPhase, operation: &str) -> ! {
    panic!(
        "cannot {operation} a join state in the {phase:?} phase - each side of a join \
        may only perform one transition"
    );
}
