//! Deterministic manual clock.
//!
//! [`VirtualClock`] is a [`Host`] whose time only moves when the caller says
//! so. Posted jobs wait in a FIFO ready queue; timers wait in a set ordered by
//! `(deadline, handle)`, so two timers due at the same instant fire in the
//! order they were armed. Ready jobs are always drained before the next timer
//! fires, which mirrors how a real event loop interleaves microtasks with
//! timer callbacks.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::host::{Host, Job, TimerHandle};

/// Upper bound on timers fired by a single [`VirtualClock::run_all`].
pub const RUN_ALL_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("aborted after {limit} timers; timers keep arming new timers")]
    TimerLoop { limit: usize },
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_timer: u64,
    ready: VecDeque<Job>,
    timers: BTreeMap<(Duration, TimerHandle), Job>,
    deadlines: HashMap<TimerHandle, Duration>,
}

#[derive(Default)]
pub struct VirtualClock {
    state: RefCell<ClockState>,
}

impl VirtualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the common case of handing the clock to promises while
    /// keeping a handle to drive it.
    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Virtual time elapsed since the clock was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    #[must_use]
    pub fn has_ready_jobs(&self) -> bool {
        !self.state.borrow().ready.is_empty()
    }

    /// Run posted jobs until the ready queue is empty, including jobs posted
    /// by the jobs being run. Time does not move.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.state.borrow_mut().ready.pop_front();
            let Some(job) = job else {
                return ran;
            };
            job();
            ran += 1;
        }
    }

    /// Move time forward by `by`, firing every timer that falls due on the
    /// way in deadline order and draining the ready queue after each one.
    pub fn advance(&self, by: Duration) {
        let target = self.now().saturating_add(by);
        self.run_until_idle();
        while let Some(job) = self.pop_timer(Some(target)) {
            job();
            self.run_until_idle();
        }
        self.state.borrow_mut().now = target;
    }

    /// Fire timers until none remain, jumping time to each deadline.
    ///
    /// Returns the number of timers fired. Stops with
    /// [`ClockError::TimerLoop`] after [`RUN_ALL_LIMIT`] timers so a timer that
    /// keeps re-arming itself cannot hang the caller.
    pub fn run_all(&self) -> Result<usize, ClockError> {
        self.run_until_idle();
        let mut fired = 0;
        while self.pending_timers() > 0 {
            if fired >= RUN_ALL_LIMIT {
                tracing::warn!(
                    limit = RUN_ALL_LIMIT,
                    pending = self.pending_timers(),
                    "Virtual clock stopped: timers keep arming new timers"
                );
                return Err(ClockError::TimerLoop {
                    limit: RUN_ALL_LIMIT,
                });
            }
            let Some(job) = self.pop_timer(None) else {
                break;
            };
            job();
            self.run_until_idle();
            fired += 1;
        }
        Ok(fired)
    }

    fn pop_timer(&self, until: Option<Duration>) -> Option<Job> {
        let mut state = self.state.borrow_mut();
        let key = *state.timers.first_key_value()?.0;
        let (deadline, handle) = key;
        if until.is_some_and(|limit| deadline > limit) {
            return None;
        }
        let job = state.timers.remove(&key)?;
        state.deadlines.remove(&handle);
        if deadline > state.now {
            state.now = deadline;
        }
        Some(job)
    }
}

impl Host for VirtualClock {
    fn post(&self, job: Job) {
        self.state.borrow_mut().ready.push_back(job);
    }

    fn schedule_after(&self, delay: Duration, job: Job) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = TimerHandle::new(state.next_timer);
        state.next_timer += 1;
        let deadline = state.now.saturating_add(delay);
        state.timers.insert((deadline, handle), job);
        state.deadlines.insert(handle, deadline);
        handle
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(deadline) = state.deadlines.remove(&handle) {
            state.timers.remove(&(deadline, handle));
        }
    }
}
