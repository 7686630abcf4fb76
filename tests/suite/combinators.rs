//! `all`, `race`, `all_settled`, `any`.

use settle_core::{Outcome, Promise, Settlement, all, all_settled, any, race};

use crate::common::{after, ms, virtual_host};

#[test]
fn all_rejects_with_first_rejection_and_ignores_later_settlements() {
    let (clock, host) = virtual_host();
    let result = all(
        &host,
        vec![
            after(&host, 30, Ok(1)),
            after(&host, 10, Err("f2".to_string())),
            after(&host, 20, Ok(3)),
        ],
    );
    clock.advance(ms(10));
    assert_eq!(result.peek(), Some(Err("f2".to_string())));
    clock.run_all().unwrap();
    assert_eq!(result.peek(), Some(Err("f2".to_string())));
}

#[test]
fn all_keeps_input_order_for_mixed_inputs() {
    let (clock, host) = virtual_host();
    let result = all(
        &host,
        vec![
            Outcome::Adopt(after(&host, 30, Ok("slow"))),
            Outcome::Fulfill("plain"),
            Outcome::Adopt(after(&host, 5, Ok("fast"))),
        ],
    );
    clock.run_all().unwrap();
    assert_eq!(result.peek(), Some(Ok(vec!["slow", "plain", "fast"])));
}

#[test]
fn all_settled_records_have_status_shape() {
    let (clock, host) = virtual_host();
    let result = all_settled(
        &host,
        vec![
            Promise::fulfilled(&host, 1),
            Promise::reject(&host, "e".to_string()),
        ],
    );
    clock.run_until_idle();

    let records = result.peek().unwrap().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        serde_json::json!([
            {"status": "fulfilled", "value": 1},
            {"status": "rejected", "reason": "e"},
        ])
    );
}

#[test]
fn all_settled_never_rejects() {
    let (clock, host) = virtual_host();
    let result = all_settled(
        &host,
        vec![after::<i32>(&host, 5, Err("a".to_string())), after(&host, 1, Err("b".to_string()))],
    );
    clock.run_all().unwrap();
    let records = result.peek().unwrap().unwrap();
    assert!(records.iter().all(Settlement::is_rejected));
}

#[test]
fn race_resolves_to_fastest() {
    let (clock, host) = virtual_host();
    let result = race(&host, vec![after(&host, 20, Ok("S")), after(&host, 10, Ok("F"))]);
    clock.run_all().unwrap();
    assert_eq!(result.peek(), Some(Ok("F")));
}

#[test]
fn any_skips_rejections() {
    let (clock, host) = virtual_host();
    let result = any(
        &host,
        vec![
            after(&host, 5, Err("err1".to_string())),
            after(&host, 10, Ok("success")),
            after(&host, 1, Err("err2".to_string())),
        ],
    );
    clock.run_all().unwrap();
    assert_eq!(result.peek(), Some(Ok("success")));
}

#[test]
fn any_collects_every_reason_when_all_reject() {
    let (clock, host) = virtual_host();
    let result = any(
        &host,
        vec![
            after::<i32>(&host, 30, Err("a".to_string())),
            after(&host, 10, Err("b".to_string())),
            after(&host, 20, Err("c".to_string())),
        ],
    );
    clock.advance(ms(20));
    assert!(result.is_pending());
    clock.advance(ms(10));
    let err = result.peek().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "All promises were rejected");
    assert_eq!(err.into_errors(), vec!["a", "b", "c"]);
}
