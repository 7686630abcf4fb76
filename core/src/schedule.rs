//! Concurrency-limited task scheduling.
//!
//! Producers are launched from the front of the sequence. Each launch runs the
//! producer on a later turn and tracks the resulting promise in an in-flight
//! set. When the set reaches `limit`, launching suspends until a tracked task
//! settles; the task's own completion reaction removes it and resumes the
//! launcher. Once everything is launched the output adopts [`all`] over the
//! task promises, so values come back in producer order and the first failure
//! becomes the overall failure. Failed tasks do not stop their siblings.

use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::num::NonZeroUsize;
use std::rc::Rc;

use crate::combinators::all;
use crate::host::SharedHost;
use crate::promise::{IntoPromise, Outcome, Promise, Resolver};

struct Pool<T, E, Tasks> {
    host: SharedHost,
    tasks: Tasks,
    launched: Vec<Promise<T, E>>,
    in_flight: HashSet<usize>,
    limit: usize,
    suspended: bool,
    output: Resolver<Vec<T>, E>,
}

/// Run `tasks` with at most `limit` of them in flight at once.
pub fn schedule<T, E, I, F, P>(host: &SharedHost, tasks: I, limit: NonZeroUsize) -> Promise<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = F>,
    I::IntoIter: 'static,
    F: FnOnce() -> P + 'static,
    P: IntoPromise<T, E>,
{
    let (output, resolver) = Promise::pending(host);
    let pool = Rc::new(RefCell::new(Pool {
        host: Rc::clone(host),
        tasks: tasks.into_iter(),
        launched: Vec::new(),
        in_flight: HashSet::new(),
        limit: limit.get(),
        suspended: false,
        output: resolver,
    }));
    pump(&pool);
    output
}

/// Launch tasks until the pool is full or the sequence is exhausted.
fn pump<T, E, Tasks, F, P>(pool: &Rc<RefCell<Pool<T, E, Tasks>>>)
where
    T: Clone + 'static,
    E: Clone + 'static,
    Tasks: Iterator<Item = F> + 'static,
    F: FnOnce() -> P + 'static,
    P: IntoPromise<T, E>,
{
    loop {
        let mut state = pool.borrow_mut();
        let Some(task) = state.tasks.next() else {
            let launched = mem::take(&mut state.launched);
            let host = Rc::clone(&state.host);
            let output = state.output.clone();
            drop(state);
            tracing::trace!(tasks = launched.len(), "All tasks launched");
            output.adopt(&all(&host, launched));
            return;
        };

        let index = state.launched.len();
        let host = Rc::clone(&state.host);
        let task_host = Rc::clone(&host);
        let running = Promise::<(), E>::fulfilled(&host, ())
            .then(move |()| Outcome::Adopt(task().into_promise(&task_host)));
        state.launched.push(running.clone());
        state.in_flight.insert(index);
        let full = state.in_flight.len() >= state.limit;
        state.suspended = full;
        let in_flight = state.in_flight.len();
        drop(state);

        let tracker = Rc::clone(pool);
        running.on_settle(move |_| release(&tracker, index));

        if full {
            tracing::trace!(in_flight, "Scheduler at capacity; waiting for a task to settle");
            return;
        }
    }
}

/// Completion reaction of task `index`: drop it from the in-flight set and
/// resume launching if the pool was waiting for room.
fn release<T, E, Tasks, F, P>(pool: &Rc<RefCell<Pool<T, E, Tasks>>>, index: usize)
where
    T: Clone + 'static,
    E: Clone + 'static,
    Tasks: Iterator<Item = F> + 'static,
    F: FnOnce() -> P + 'static,
    P: IntoPromise<T, E>,
{
    let resume = {
        let mut state = pool.borrow_mut();
        state.in_flight.remove(&index);
        mem::replace(&mut state.suspended, false)
    };
    if resume {
        tracing::trace!(released = index, "Scheduler resuming");
        pump(pool);
    }
}
