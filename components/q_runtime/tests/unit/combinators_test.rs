//! Unit tests for all, reject and resolved

use super::{entries, new_log, record, sym};
use core_types::Value;
use q_runtime::{all, reject, resolved, PromiseState, QError, Reactor};

#[test]
fn all_of_nothing_resolves_empty() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            all(reactor, Vec::new()).then(move |result| {
                record(&l, result);
                Ok(Value::Nil)
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::List(vec![])]);
}

#[test]
fn all_of_nothing_runs_continuation_next_turn() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let inside = l.clone();
            all(reactor, Vec::new()).then(move |_| {
                record(&inside, sym("resolved"));
                Ok(Value::Nil)
            });
            record(&l, sym("marker"));
        })
        .unwrap();

    assert_eq!(entries(&log), vec![sym("marker"), sym("resolved")]);
}

#[test]
fn all_keeps_input_order_when_settled_by_background_work() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let first = reactor.defer();
            let second = reactor.defer();
            let third = reactor.defer();

            let stopper = reactor.clone();
            all(
                reactor,
                [first.promise(), second.promise(), third.promise()],
            )
            .then(move |result| {
                record(&l, result);
                stopper.stop();
                Ok(Value::Nil)
            });

            for (deferred, value) in [(first, "foo"), (third, "baz"), (second, "bar")] {
                reactor.work(|| Ok(())).promise().then(move |_| {
                    deferred.resolve(sym(value));
                    Ok(Value::Nil)
                });
            }
        })
        .unwrap();

    assert_eq!(
        entries(&log),
        vec![Value::List(vec![sym("foo"), sym("bar"), sym("baz")])]
    );
}

#[test]
fn all_rejects_with_first_reason() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let first = reactor.defer();
            let second = reactor.defer();
            let third = reactor.defer();

            all(
                reactor,
                [first.promise(), second.promise(), third.promise()],
            )
            .then_or(
                |_| Ok(sym("unexpected")),
                move |reason| {
                    record(&l, reason);
                    Ok(Value::Nil)
                },
            );

            let resolving = first.clone();
            reactor.work(|| Ok(())).promise().then(move |_| {
                resolving.resolve(sym("foo"));
                Ok(Value::Nil)
            });
            reactor.work(|| Ok(())).promise().then(move |_| {
                third.reject(sym("baz")).unwrap();
                Ok(Value::Nil)
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![sym("baz")]);
}

#[test]
fn all_ignores_settlements_after_rejection() {
    let reactor = Reactor::new();
    let first = reactor.defer();
    let second = reactor.defer();
    let combined = all(&reactor, [first.promise(), second.promise()]);

    reactor
        .run(|_| {
            first.reject(sym("no")).unwrap();
            second.resolve(sym("late"));
        })
        .unwrap();

    assert_eq!(combined.state(), PromiseState::Rejected(sym("no")));
}

#[test]
fn reject_packages_reason_into_rejected_promise() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let rejected = reject(reactor, "not gonna happen").unwrap();
            let deferred = reactor.defer();
            deferred.promise().then_or(
                |_| Ok(sym("unexpected")),
                move |reason| {
                    record(&l, reason);
                    Ok(Value::Nil)
                },
            );
            deferred.resolve(rejected);
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::from("not gonna happen")]);
}

#[test]
fn rejected_promise_forwards_through_empty_then() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let rejected = reject(reactor, "not gonna happen").unwrap();
            let deferred = reactor.defer();
            deferred.promise().catch(move |reason| {
                record(&l, reason);
                Ok(Value::Nil)
            });
            deferred.resolve(rejected.chain(Default::default()));
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::from("not gonna happen")]);
}

#[test]
fn reject_refuses_promise() {
    let reactor = Reactor::new();
    let pending = reactor.defer().promise();
    assert!(matches!(reject(&reactor, pending), Err(QError::ThenableReason)));
}

#[test]
fn resolved_wraps_plain_value() {
    let reactor = Reactor::new();
    let promise = resolved(&reactor, 5);
    assert_eq!(promise.state(), PromiseState::Resolved(Value::Integer(5)));
}
