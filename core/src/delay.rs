//! Timer-backed promises.
//!
//! [`Delay`] is the only cancelable primitive in the crate. Cancelling releases
//! the host timer and leaves the promise pending forever; nothing else can
//! settle it afterwards.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use crate::host::{SharedHost, TimerHandle};
use crate::promise::Promise;

/// A promise that fulfills with `()` once `duration` elapses, unless
/// cancelled first.
pub struct Delay {
    promise: Promise<(), Infallible>,
    timer: Rc<Cell<Option<TimerHandle>>>,
    host: SharedHost,
    duration: Duration,
}

impl Delay {
    pub fn new(host: &SharedHost, duration: Duration) -> Self {
        let (promise, resolver) = Promise::pending(host);
        let timer = Rc::new(Cell::new(None));
        let armed = Rc::clone(&timer);
        let handle = host.schedule_after(
            duration,
            Box::new(move || {
                armed.set(None);
                resolver.resolve(());
            }),
        );
        timer.set(Some(handle));
        Self {
            promise,
            timer,
            host: Rc::clone(host),
            duration,
        }
    }

    #[must_use]
    pub fn promise(&self) -> &Promise<(), Infallible> {
        &self.promise
    }

    #[must_use]
    pub fn into_promise(self) -> Promise<(), Infallible> {
        self.promise
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// True until the timer fires or is cancelled.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer.get().is_some()
    }

    /// Release the timer. Returns `false` after expiry or a previous cancel.
    pub fn cancel(&self) -> bool {
        let Some(handle) = self.timer.take() else {
            return false;
        };
        self.host.cancel_timer(handle);
        tracing::trace!(%handle, duration_ms = self.duration.as_millis(), "Delay cancelled");
        true
    }
}

/// Fulfill with `()` after `duration`. Not cancelable.
pub fn sleep(host: &SharedHost, duration: Duration) -> Promise<(), Infallible> {
    Delay::new(host, duration).into_promise()
}
