//! One-shot promise with chaining.
//!
//! # State machine
//!
//! ```text
//! Pending(reactions) --resolve--> Fulfilled(T)
//!                    --reject---> Rejected(E)
//! ```
//!
//! Both settled states are terminal. Whichever of resolve/reject reaches a
//! pending promise first wins; every later call is a no-op.
//!
//! # Deferral
//!
//! Reactions never run inline. Settling a promise posts one job per
//! registered reaction to the host, in registration order. Registering on an
//! already-settled promise posts the job immediately. Either way the reaction
//! runs on a later turn than the code that triggered it.
//!
//! # Continuation results
//!
//! A continuation returns an [`Outcome`]: `Fulfill` a plain value, `Reject`
//! (the equivalent of throwing), or `Adopt` another promise whose eventual
//! outcome the derived promise takes over.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::mem;
use std::rc::Rc;

use settle_types::PromiseState;

use crate::host::SharedHost;

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

enum State<T, E> {
    Pending(Vec<Reaction<T, E>>),
    Fulfilled(T),
    Rejected(E),
}

struct Inner<T, E> {
    state: State<T, E>,
    host: SharedHost,
}

/// Shared handle to a one-shot asynchronous outcome.
///
/// Cloning the handle does not clone the outcome; every clone observes the
/// same state.
pub struct Promise<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

/// The resolve/reject capability handed to a promise's producer.
pub struct Resolver<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

/// What a continuation hands back to its derived promise.
pub enum Outcome<T, E> {
    Fulfill(T),
    Reject(E),
    /// Take over the eventual outcome of another promise.
    Adopt(Promise<T, E>),
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfill(value),
            Err(err) => Self::Reject(err),
        }
    }
}

impl<T, E> From<Promise<T, E>> for Outcome<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Self::Adopt(promise)
    }
}

/// Normalization applied by [`Promise::resolve`] and at every combinator
/// input: something that already is a promise passes through unchanged,
/// anything else becomes an already-settled promise.
pub trait IntoPromise<T, E> {
    fn into_promise(self, host: &SharedHost) -> Promise<T, E>;
}

impl<T, E> IntoPromise<T, E> for Promise<T, E> {
    fn into_promise(self, _host: &SharedHost) -> Promise<T, E> {
        self
    }
}

impl<T, E> IntoPromise<T, E> for Result<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn into_promise(self, host: &SharedHost) -> Promise<T, E> {
        match self {
            Ok(value) => Promise::fulfilled(host, value),
            Err(err) => Promise::reject(host, err),
        }
    }
}

impl<T, E> IntoPromise<T, E> for Outcome<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn into_promise(self, host: &SharedHost) -> Promise<T, E> {
        match self {
            Self::Fulfill(value) => Promise::fulfilled(host, value),
            Self::Reject(err) => Promise::reject(host, err),
            Self::Adopt(promise) => promise,
        }
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> State<T, E> {
    const fn snapshot(&self) -> PromiseState {
        match self {
            Self::Pending(_) => PromiseState::Pending,
            Self::Fulfilled(_) => PromiseState::Fulfilled,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.inner.borrow().state.snapshot())
            .finish_non_exhaustive()
    }
}

impl<T, E> Promise<T, E> {
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.snapshot()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// True when both handles observe the same promise.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn host(&self) -> SharedHost {
        Rc::clone(&self.inner.borrow().host)
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Run `producer` synchronously with the promise's resolver.
    ///
    /// A producer that returns `Err` rejects the promise with that error,
    /// unless it already settled it.
    pub fn new<P>(host: &SharedHost, producer: P) -> Self
    where
        P: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (promise, resolver) = Self::pending(host);
        if let Err(err) = producer(resolver.clone()) {
            resolver.reject(err);
        }
        promise
    }

    /// A pending promise together with its resolver.
    #[must_use]
    pub fn pending(host: &SharedHost) -> (Self, Resolver<T, E>) {
        let inner = Rc::new(RefCell::new(Inner {
            state: State::Pending(Vec::new()),
            host: Rc::clone(host),
        }));
        let resolver = Resolver {
            inner: Rc::clone(&inner),
        };
        (Self { inner }, resolver)
    }

    /// Normalize `value`: an existing promise is returned as-is, a `Result`
    /// or [`Outcome`] becomes an already-settled promise.
    pub fn resolve(host: &SharedHost, value: impl IntoPromise<T, E>) -> Self {
        value.into_promise(host)
    }

    #[must_use]
    pub fn fulfilled(host: &SharedHost, value: T) -> Self {
        Self::settled_with(host, State::Fulfilled(value))
    }

    #[must_use]
    pub fn reject(host: &SharedHost, err: E) -> Self {
        Self::settled_with(host, State::Rejected(err))
    }

    fn settled_with(host: &SharedHost, state: State<T, E>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state,
                host: Rc::clone(host),
            })),
        }
    }

    /// Copy of the settled outcome, `None` while pending.
    #[must_use]
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &self.inner.borrow().state {
            State::Pending(_) => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(err) => Some(Err(err.clone())),
        }
    }

    /// Register `reaction` to observe the outcome without deriving a new
    /// promise. Runs on a later turn, exactly once.
    pub fn on_settle<F>(&self, reaction: F)
    where
        F: FnOnce(Result<T, E>) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let outcome = match &mut inner.state {
            State::Pending(reactions) => {
                reactions.push(Box::new(reaction));
                return;
            }
            State::Fulfilled(value) => Ok(value.clone()),
            State::Rejected(err) => Err(err.clone()),
        };
        let host = Rc::clone(&inner.host);
        drop(inner);
        host.post(Box::new(move || reaction(outcome)));
    }

    /// Chain both branches. The derived promise settles with whatever the
    /// branch that ran returns.
    pub fn then_or_else<U, F, OnOk, OnErr>(
        &self,
        on_fulfilled: OnOk,
        on_rejected: OnErr,
    ) -> Promise<U, F>
    where
        U: Clone + 'static,
        F: Clone + 'static,
        OnOk: FnOnce(T) -> Outcome<U, F> + 'static,
        OnErr: FnOnce(E) -> Outcome<U, F> + 'static,
    {
        let (derived, resolver) = Promise::pending(&self.host());
        self.on_settle(move |result| {
            let outcome = match result {
                Ok(value) => on_fulfilled(value),
                Err(err) => on_rejected(err),
            };
            resolver.settle_with(outcome);
        });
        derived
    }

    /// Chain the fulfilled branch; a rejection passes through unchanged.
    pub fn then<U, OnOk>(&self, on_fulfilled: OnOk) -> Promise<U, E>
    where
        U: Clone + 'static,
        OnOk: FnOnce(T) -> Outcome<U, E> + 'static,
    {
        self.then_or_else(on_fulfilled, Outcome::Reject)
    }

    /// Chain the rejected branch; a value passes through unchanged.
    pub fn catch<F, OnErr>(&self, on_rejected: OnErr) -> Promise<T, F>
    where
        F: Clone + 'static,
        OnErr: FnOnce(E) -> Outcome<T, F> + 'static,
    {
        self.then_or_else(Outcome::Fulfill, on_rejected)
    }

    /// A derived promise that mirrors this one a turn later.
    #[must_use]
    pub fn relay(&self) -> Self {
        self.then_or_else(Outcome::Fulfill, Outcome::Reject)
    }

    pub fn map<U, M>(&self, f: M) -> Promise<U, E>
    where
        U: Clone + 'static,
        M: FnOnce(T) -> U + 'static,
    {
        self.then(move |value| Outcome::Fulfill(f(value)))
    }

    pub fn map_err<F, M>(&self, f: M) -> Promise<T, F>
    where
        F: Clone + 'static,
        M: FnOnce(E) -> F + 'static,
    {
        self.catch(move |err| Outcome::Reject(f(err)))
    }

    /// Run `f` after settlement either way, then mirror the original outcome.
    pub fn finally<F>(&self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let (derived, resolver) = Self::pending(&self.host());
        self.on_settle(move |result| {
            f();
            resolver.settle(result);
        });
        derived
    }
}

impl<T> Promise<T, Infallible>
where
    T: Clone + 'static,
{
    /// Give a promise that cannot reject the error type of the chain it joins.
    pub fn widen_err<F>(&self) -> Promise<T, F>
    where
        F: Clone + 'static,
    {
        self.map_err(|never| match never {})
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Returns `false` when the promise had already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Returns `false` when the promise had already settled.
    pub fn reject(&self, err: E) -> bool {
        self.settle(Err(err))
    }

    /// Settle with `result` and post every registered reaction, in
    /// registration order. No-op once settled.
    pub fn settle(&self, result: Result<T, E>) -> bool {
        let (reactions, host) = {
            let mut inner = self.inner.borrow_mut();
            let reactions = match &mut inner.state {
                State::Pending(reactions) => mem::take(reactions),
                State::Fulfilled(_) | State::Rejected(_) => return false,
            };
            inner.state = match &result {
                Ok(value) => State::Fulfilled(value.clone()),
                Err(err) => State::Rejected(err.clone()),
            };
            (reactions, Rc::clone(&inner.host))
        };
        for reaction in reactions {
            let outcome = result.clone();
            host.post(Box::new(move || reaction(outcome)));
        }
        true
    }

    /// Settle with whatever `source` eventually settles with.
    pub fn adopt(&self, source: &Promise<T, E>) {
        let resolver = self.clone();
        source.on_settle(move |result| {
            resolver.settle(result);
        });
    }

    pub fn settle_with(&self, outcome: Outcome<T, E>) {
        match outcome {
            Outcome::Fulfill(value) => {
                self.resolve(value);
            }
            Outcome::Reject(err) => {
                self.reject(err);
            }
            Outcome::Adopt(source) => self.adopt(&source),
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().state.snapshot().is_settled()
    }
}
