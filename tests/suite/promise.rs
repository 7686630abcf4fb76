//! Promise state machine and chaining, observed through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use settle_core::{Outcome, Promise, PromiseState};

use crate::common::{after, virtual_host};

#[test]
fn resolve_wraps_plain_results_and_passes_promises_through() {
    let (clock, host) = virtual_host();
    let wrapped = Promise::<i32, String>::resolve(&host, Ok(7));
    assert_eq!(wrapped.peek(), Some(Ok(7)));

    let existing = after(&host, 10, Ok(1));
    let same = Promise::resolve(&host, existing.clone());
    assert!(same.ptr_eq(&existing));

    clock.run_all().unwrap();
    assert_eq!(same.peek(), Some(Ok(1)));
}

#[test]
fn continuation_on_settled_promise_runs_once_and_later() {
    let (clock, host) = virtual_host();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let derived = Promise::<i32, String>::fulfilled(&host, 5).then(move |v| {
        counter.set(counter.get() + 1);
        Outcome::Fulfill(v * 2)
    });

    assert_eq!(calls.get(), 0);
    assert!(derived.is_pending());

    clock.run_until_idle();
    assert_eq!(calls.get(), 1);
    assert_eq!(derived.peek(), Some(Ok(10)));

    clock.run_all().unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn continuation_results_follow_their_kind() {
    let (clock, host) = virtual_host();
    let source = Promise::<i32, String>::fulfilled(&host, 1);

    let plain = source.then(|v| Outcome::Fulfill(v + 1));
    let thrown = source.then(|_| Outcome::<i32, String>::Reject("thrown".to_string()));
    let flattened = {
        let inner_host = Rc::clone(&host);
        source.then(move |v| Outcome::Adopt(after(&inner_host, 20, Ok(v + 100))))
    };

    clock.run_until_idle();
    assert_eq!(plain.peek(), Some(Ok(2)));
    assert_eq!(thrown.peek(), Some(Err("thrown".to_string())));
    assert!(flattened.is_pending());

    clock.run_all().unwrap();
    assert_eq!(flattened.peek(), Some(Ok(101)));
}

#[test]
fn first_settle_wins() {
    let (clock, host) = virtual_host();
    let promise = Promise::<&str, String>::new(&host, |resolver| {
        assert!(resolver.resolve("first"));
        assert!(!resolver.reject("late".to_string()));
        assert!(!resolver.resolve("second"));
        Ok(())
    });
    clock.run_until_idle();
    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.peek(), Some(Ok("first")));
}

#[test]
fn failing_producer_rejects() {
    let (_clock, host) = virtual_host();
    let promise = Promise::<i32, String>::new(&host, |_| Err("producer failed".to_string()));
    assert_eq!(promise.state(), PromiseState::Rejected);
    assert_eq!(promise.peek(), Some(Err("producer failed".to_string())));
}

#[test]
fn rejection_skips_then_until_catch() {
    let (clock, host) = virtual_host();
    let skipped = Rc::new(Cell::new(false));
    let flag = Rc::clone(&skipped);
    let recovered = Promise::<i32, String>::reject(&host, "bad".to_string())
        .then(move |v| {
            flag.set(true);
            Outcome::Fulfill(v)
        })
        .catch(|err| Outcome::<i32, String>::Fulfill(i32::try_from(err.len()).unwrap_or(0)));

    clock.run_until_idle();
    assert!(!skipped.get());
    assert_eq!(recovered.peek(), Some(Ok(3)));
}

#[test]
fn finally_runs_either_way_and_mirrors_outcome() {
    let (clock, host) = virtual_host();
    let runs = Rc::new(Cell::new(0));

    let ok_runs = Rc::clone(&runs);
    let ok = Promise::<i32, String>::fulfilled(&host, 1)
        .finally(move || ok_runs.set(ok_runs.get() + 1));
    let err_runs = Rc::clone(&runs);
    let err = Promise::<i32, String>::reject(&host, "no".to_string())
        .finally(move || err_runs.set(err_runs.get() + 1));

    clock.run_until_idle();
    assert_eq!(runs.get(), 2);
    assert_eq!(ok.peek(), Some(Ok(1)));
    assert_eq!(err.peek(), Some(Err("no".to_string())));
}

#[test]
fn reactions_run_in_registration_order() {
    let (clock, host) = virtual_host();
    let (promise, resolver) = Promise::<i32, String>::pending(&host);
    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let order = Rc::clone(&order);
        promise.on_settle(move |_| order.borrow_mut().push(tag));
    }
    resolver.resolve(0);
    assert!(order.borrow().is_empty());
    clock.run_until_idle();
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}
