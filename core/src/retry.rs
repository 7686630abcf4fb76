//! Retry with a per-attempt timeout.
//!
//! # Attempt
//!
//! The operation is invoked on a later turn and raced against a [`Delay`]
//! armed for the policy's timeout:
//!
//! - operation fulfills first: the overall promise fulfills, the timer is
//!   cancelled.
//! - timer fires first: the attempt fails with [`RetryError::Timeout`]. The
//!   operation keeps running; its eventual outcome is ignored.
//! - operation rejects first: the attempt fails with
//!   [`RetryError::Operation`], the timer is cancelled.
//!
//! # Sequence
//!
//! After a failed attempt with retries remaining, wait the policy's delay and
//! try again. When no retries remain, reject with that last attempt's own
//! failure.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use settle_types::{RetryError, RetryPolicy, TimeoutError};

use crate::delay::{Delay, sleep};
use crate::host::SharedHost;
use crate::promise::{IntoPromise, Outcome, Promise, Resolver};

struct Retry<T, E, Op> {
    host: SharedHost,
    operation: RefCell<Op>,
    policy: RetryPolicy,
    attempts: Cell<u32>,
    output: Resolver<T, RetryError<E>>,
}

/// Run `operation` under `policy`, retrying failed or timed-out attempts.
///
/// `operation` is invoked exactly once per attempt.
pub fn retry_with_timeout<T, E, Op, P>(
    host: &SharedHost,
    operation: Op,
    policy: RetryPolicy,
) -> Promise<T, RetryError<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
    Op: FnMut() -> P + 'static,
    P: IntoPromise<T, E>,
{
    let (output, resolver) = Promise::pending(host);
    let retry = Rc::new(Retry {
        host: Rc::clone(host),
        operation: RefCell::new(operation),
        policy,
        attempts: Cell::new(0),
        output: resolver,
    });
    retry.attempt(policy.retries());
    output
}

impl<T, E, Op, P> Retry<T, E, Op>
where
    T: Clone + 'static,
    E: Clone + 'static,
    Op: FnMut() -> P + 'static,
    P: IntoPromise<T, E>,
{
    fn attempt(self: &Rc<Self>, remaining: u32) {
        let retry = Rc::clone(self);
        self.race_timeout().on_settle(move |result| match result {
            Ok(value) => {
                retry.output.resolve(value);
            }
            Err(err) => retry.after_failure(err, remaining),
        });
    }

    /// One attempt: the operation against a timer armed for the timeout.
    fn race_timeout(self: &Rc<Self>) -> Promise<T, RetryError<E>> {
        let timeout = self.policy.timeout();
        let (attempt, settle) = Promise::pending(&self.host);

        let timer = Delay::new(&self.host, timeout);
        let on_timeout = settle.clone();
        timer.promise().on_settle(move |_| {
            on_timeout.reject(RetryError::Timeout(TimeoutError::new(timeout)));
        });

        let retry = Rc::clone(self);
        Promise::<(), E>::fulfilled(&self.host, ())
            .then(move |()| Outcome::Adopt(retry.invoke()))
            .on_settle(move |result| {
                timer.cancel();
                settle.settle(result.map_err(RetryError::Operation));
            });

        attempt
    }

    fn invoke(&self) -> Promise<T, E> {
        self.attempts.set(self.attempts.get() + 1);
        let pending = {
            let mut operation = self.operation.borrow_mut();
            (*operation)()
        };
        pending.into_promise(&self.host)
    }

    fn after_failure(self: &Rc<Self>, err: RetryError<E>, remaining: u32) {
        let attempt = self.attempts.get();
        if remaining == 0 {
            tracing::debug!(
                attempts = attempt,
                timeout = err.is_timeout(),
                "Retries exhausted"
            );
            self.output.reject(err);
            return;
        }

        let delay = self.policy.delay();
        tracing::debug!(
            attempt,
            remaining,
            timeout = err.is_timeout(),
            delay_ms = delay.as_millis(),
            "Retrying operation after failed attempt"
        );
        let retry = Rc::clone(self);
        sleep(&self.host, delay).on_settle(move |_| retry.attempt(remaining - 1));
    }
}
