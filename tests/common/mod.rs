//! Shared test utilities and fixtures
//!
//! Every helper drives promises on a `VirtualClock`, so timings are exact.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use settle_core::{Promise, SharedHost, VirtualClock};

/// A fresh clock plus the same clock as an injectable host.
pub fn virtual_host() -> (Rc<VirtualClock>, SharedHost) {
    let clock = VirtualClock::shared();
    let host: SharedHost = clock.clone();
    (clock, host)
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A promise that settles with `outcome` once `delay_ms` elapses.
pub fn after<T: Clone + 'static>(
    host: &SharedHost,
    delay_ms: u64,
    outcome: Result<T, String>,
) -> Promise<T, String> {
    let (promise, resolver) = Promise::pending(host);
    host.schedule_after(
        ms(delay_ms),
        Box::new(move || {
            resolver.settle(outcome);
        }),
    );
    promise
}

/// Counts how many tasks run at once and in which order they started.
#[derive(Default)]
pub struct Concurrency {
    running: Cell<usize>,
    max: Cell<usize>,
    started: RefCell<Vec<&'static str>>,
}

impl Concurrency {
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn max(&self) -> usize {
        self.max.get()
    }

    pub fn running(&self) -> usize {
        self.running.get()
    }

    pub fn started(&self) -> Vec<&'static str> {
        self.started.borrow().clone()
    }

    fn enter(&self, name: &'static str) {
        self.started.borrow_mut().push(name);
        self.running.set(self.running.get() + 1);
        self.max.set(self.max.get().max(self.running.get()));
    }

    fn leave(&self) {
        self.running.set(self.running.get() - 1);
    }
}

/// A producer that records its start and fulfills with `name` after
/// `delay_ms`.
pub fn tracked_task(
    gauge: Rc<Concurrency>,
    host: SharedHost,
    name: &'static str,
    delay_ms: u64,
) -> impl FnOnce() -> Promise<&'static str, String> + 'static {
    move || {
        gauge.enter(name);
        let (promise, resolver) = Promise::pending(&host);
        host.schedule_after(
            ms(delay_ms),
            Box::new(move || {
                gauge.leave();
                resolver.resolve(name);
            }),
        );
        promise
    }
}
