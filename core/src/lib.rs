//! One-shot promises and the async utilities built on them.
//!
//! Everything here runs on a single thread against an injected [`Host`]: a
//! ready queue for deferred reactions plus a timer service. Nothing blocks,
//! nothing spawns threads, and nothing outside the host decides when a
//! reaction runs.
//!
//! - [`Promise`] / [`Resolver`]: the state machine and chaining.
//! - [`all`], [`race`], [`all_settled`], [`any`]: collection combinators.
//! - [`Delay`] / [`sleep`]: timer-backed promises.
//! - [`schedule`]: run producers with bounded concurrency.
//! - [`retry_with_timeout`]: per-attempt timeout and fixed-delay retry.
//!
//! [`VirtualClock`] drives all of it deterministically in tests;
//! [`TokioHost`] plugs it into a tokio `LocalSet`.

#![allow(clippy::missing_errors_doc)]

mod clock;
mod combinators;
mod delay;
mod host;
mod promise;
mod retry;
mod schedule;
mod settled;
mod tokio_host;

pub use clock::{ClockError, RUN_ALL_LIMIT, VirtualClock};
pub use combinators::{all, all_settled, any, race};
pub use delay::{Delay, sleep};
pub use host::{Host, Job, SharedHost, TimerHandle};
pub use promise::{IntoPromise, Outcome, Promise, Resolver};
pub use retry::retry_with_timeout;
pub use schedule::schedule;
pub use settled::Settled;
pub use tokio_host::TokioHost;

pub use settle_types::{
    AggregateError, PromiseState, RetryError, RetryPolicy, Settlement, TimeoutError,
};
