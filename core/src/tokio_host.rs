//! [`Host`] backed by a tokio `LocalSet`.
//!
//! Posted jobs become local tasks, timers become local tasks that sleep first.
//! Every method must be called from inside [`LocalSet::run_until`] (or a task
//! the set is driving); tokio panics otherwise.
//!
//! [`LocalSet::run_until`]: tokio::task::LocalSet::run_until

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::{self, JoinHandle};

use crate::host::{Host, Job, TimerHandle};

#[derive(Default)]
pub struct TokioHost {
    timers: Rc<RefCell<HashMap<TimerHandle, JoinHandle<()>>>>,
    next_timer: Cell<u64>,
}

impl TokioHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Timers armed and neither fired nor cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Host for TokioHost {
    fn post(&self, job: Job) {
        task::spawn_local(async move { job() });
    }

    fn schedule_after(&self, delay: Duration, job: Job) -> TimerHandle {
        let handle = TimerHandle::new(self.next_timer.get());
        self.next_timer.set(handle.value() + 1);

        let timers = Rc::clone(&self.timers);
        let sleeper = task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            timers.borrow_mut().remove(&handle);
            job();
        });
        self.timers.borrow_mut().insert(handle, sleeper);
        handle
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        let sleeper = self.timers.borrow_mut().remove(&handle);
        if let Some(sleeper) = sleeper {
            sleeper.abort();
        }
    }
}
