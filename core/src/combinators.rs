//! Static combinators over collections of promises.
//!
//! Every input is normalized through [`IntoPromise`] first, so plain
//! `Result`s and [`Outcome`](crate::Outcome)s can be mixed with promises.
//! Results that carry one entry per input are aligned to input position, not
//! to completion order.

use std::cell::RefCell;
use std::convert::Infallible;
use std::mem;
use std::rc::Rc;

use settle_types::{AggregateError, Settlement};

use crate::host::SharedHost;
use crate::promise::{IntoPromise, Promise};

/// Position-aligned slots filled as inputs settle.
struct Slots<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Slots<T> {
    fn new(len: usize) -> Self {
        Self {
            values: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Returns every value, in position order, once the last slot is filled.
    fn fill(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        if self.values[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining > 0 {
            return None;
        }
        Some(mem::take(&mut self.values).into_iter().flatten().collect())
    }
}

fn normalize<T, E, I, P>(host: &SharedHost, inputs: I) -> Vec<Promise<T, E>>
where
    I: IntoIterator<Item = P>,
    P: IntoPromise<T, E>,
{
    inputs
        .into_iter()
        .map(|input| input.into_promise(host))
        .collect()
}

/// Fulfill with every value in input order once all inputs fulfill; reject
/// with the first rejection to arrive.
pub fn all<T, E, I, P>(host: &SharedHost, inputs: I) -> Promise<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = P>,
    P: IntoPromise<T, E>,
{
    let promises = normalize(host, inputs);
    if promises.is_empty() {
        return Promise::fulfilled(host, Vec::new());
    }

    let (output, resolver) = Promise::pending(host);
    let slots = Rc::new(RefCell::new(Slots::new(promises.len())));
    for (index, promise) in promises.iter().enumerate() {
        let slots = Rc::clone(&slots);
        let resolver = resolver.clone();
        promise.on_settle(move |result| match result {
            Ok(value) => {
                let complete = slots.borrow_mut().fill(index, value);
                if let Some(values) = complete {
                    resolver.resolve(values);
                }
            }
            Err(err) => {
                resolver.reject(err);
            }
        });
    }
    output
}

/// Adopt the outcome of whichever input settles first.
///
/// An empty input never settles.
pub fn race<T, E, I, P>(host: &SharedHost, inputs: I) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = P>,
    P: IntoPromise<T, E>,
{
    let promises = normalize(host, inputs);
    let (output, resolver) = Promise::pending(host);
    if promises.is_empty() {
        tracing::debug!("race over an empty input stays pending");
    }
    for promise in &promises {
        resolver.adopt(promise);
    }
    output
}

/// Wait for every input and report each outcome in input order. Never
/// rejects.
pub fn all_settled<T, E, I, P>(
    host: &SharedHost,
    inputs: I,
) -> Promise<Vec<Settlement<T, E>>, Infallible>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = P>,
    P: IntoPromise<T, E>,
{
    let promises = normalize(host, inputs);
    if promises.is_empty() {
        return Promise::fulfilled(host, Vec::new());
    }

    let (output, resolver) = Promise::pending(host);
    let slots = Rc::new(RefCell::new(Slots::new(promises.len())));
    for (index, promise) in promises.iter().enumerate() {
        let slots = Rc::clone(&slots);
        let resolver = resolver.clone();
        promise.on_settle(move |result| {
            let complete = slots.borrow_mut().fill(index, Settlement::from(result));
            if let Some(records) = complete {
                resolver.resolve(records);
            }
        });
    }
    output
}

/// Fulfill with the first value to arrive; reject with every reason, in
/// input order, once all inputs reject.
///
/// An empty input rejects immediately with an empty aggregate.
pub fn any<T, E, I, P>(host: &SharedHost, inputs: I) -> Promise<T, AggregateError<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = P>,
    P: IntoPromise<T, E>,
{
    let promises = normalize(host, inputs);
    if promises.is_empty() {
        return Promise::reject(host, AggregateError::new(Vec::new()));
    }

    let (output, resolver) = Promise::pending(host);
    let slots = Rc::new(RefCell::new(Slots::new(promises.len())));
    for (index, promise) in promises.iter().enumerate() {
        let slots = Rc::clone(&slots);
        let resolver = resolver.clone();
        promise.on_settle(move |result| match result {
            Ok(value) => {
                resolver.resolve(value);
            }
            Err(err) => {
                let complete = slots.borrow_mut().fill(index, err);
                if let Some(errors) = complete {
                    resolver.reject(AggregateError::new(errors));
                }
            }
        });
    }
    output
}
