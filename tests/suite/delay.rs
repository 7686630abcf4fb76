//! Cancelable delay and sleep.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use settle_core::{Delay, Outcome, sleep};

use crate::common::{ms, virtual_host};

#[test]
fn cancelled_delay_stays_pending_past_its_deadline() {
    let (clock, host) = virtual_host();
    let delay = Delay::new(&host, ms(1000));
    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let _chained = delay.promise().then(move |()| {
        flag.set(true);
        Outcome::Fulfill(())
    });

    clock.advance(ms(500));
    assert!(delay.cancel());

    clock.advance(ms(5000));
    assert!(delay.promise().is_pending());
    assert!(!fired.get());
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn uncancelled_delay_fulfills_on_time() {
    let (clock, host) = virtual_host();
    let delay = Delay::new(&host, ms(1000));
    assert!(delay.is_armed());
    clock.advance(ms(999));
    assert!(delay.promise().is_pending());
    clock.advance(ms(1));
    assert_eq!(delay.promise().peek(), Some(Ok(())));
    assert!(!delay.is_armed());
}

#[test]
fn sleeps_fire_in_deadline_order() {
    let (clock, host) = virtual_host();
    let order = Rc::new(RefCell::new(Vec::new()));
    for (tag, wait) in [("late", 30), ("early", 10), ("middle", 20)] {
        let order = Rc::clone(&order);
        sleep(&host, ms(wait)).on_settle(move |_| order.borrow_mut().push(tag));
    }
    clock.run_all().unwrap();
    assert_eq!(*order.borrow(), vec!["early", "middle", "late"]);
    assert_eq!(clock.now(), ms(30));
}
