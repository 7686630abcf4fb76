//! Host capabilities the primitives are written against.
//!
//! Nothing in this crate reaches for an ambient event loop or a global timer.
//! Every promise carries the [`Host`] it was created with, and every
//! duration-based behavior goes through [`Host::schedule_after`]. Tests inject
//! a [`VirtualClock`](crate::VirtualClock); async programs inject a
//! [`TokioHost`](crate::TokioHost).

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// A unit of work posted to the host.
pub type Job = Box<dyn FnOnce() + 'static>;

/// Shared handle to the host a promise graph runs on.
pub type SharedHost = Rc<dyn Host>;

/// Identifies an armed timer for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Ready queue plus timer service of a single-threaded cooperative host.
pub trait Host {
    /// Queue `job` for a later turn. Never runs it inline.
    ///
    /// Jobs run in the order they were posted.
    fn post(&self, job: Job);

    /// Run `job` once `delay` has elapsed.
    fn schedule_after(&self, delay: Duration, job: Job) -> TimerHandle;

    /// Release an armed timer so its job never runs.
    ///
    /// Unknown or already-fired handles are ignored.
    fn cancel_timer(&self, handle: TimerHandle);
}
