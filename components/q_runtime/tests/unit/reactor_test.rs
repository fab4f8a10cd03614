//! Unit tests for Reactor

use super::{entries, new_log, record, sym};
use core_types::{Failure, FailureKind, Value};
use q_runtime::{PromiseState, QError, Reactor, ReactorBuilder, ReactorConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn run_returns_when_idle() {
    let reactor = Reactor::new();
    reactor.run(|_| {}).unwrap();
    assert_eq!(reactor.turn(), 0);
    assert!(!reactor.is_running());
}

#[test]
fn next_tick_is_fifo() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            for n in 0..5 {
                let l = l.clone();
                reactor.next_tick(move || record(&l, n));
            }
        })
        .unwrap();

    assert_eq!(
        entries(&log),
        (0..5).map(Value::from).collect::<Vec<_>>()
    );
}

#[test]
fn stop_finishes_current_turn() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            reactor.stop();
            let same_turn = l.clone();
            reactor.next_tick(move || record(&same_turn, sym("same turn")));
            let later = reactor.clone();
            reactor.next_tick(move || {
                later.next_tick(move || record(&l, sym("next turn")));
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![sym("same turn")]);
    assert_eq!(reactor.turn(), 1);
}

#[test]
fn ticks_left_after_stop_run_on_next_run() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            reactor.stop();
            let later = reactor.clone();
            reactor.next_tick(move || {
                later.next_tick(move || record(&l, sym("resumed")));
            });
        })
        .unwrap();
    assert!(entries(&log).is_empty());

    reactor.run(|_| {}).unwrap();
    assert_eq!(entries(&log), vec![sym("resumed")]);
}

#[test]
fn nested_run_fails() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let nested = reactor.run(|_| {});
            record(&l, matches!(nested, Err(QError::AlreadyRunning)));
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::Boolean(true)]);
}

#[test]
fn panicking_body_is_logged() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor.on_log(move |entry| record(&l, sym(&entry.context)));
    reactor.run(|_| panic!("body failed")).unwrap();

    assert_eq!(entries(&log), vec![sym("running reactor")]);
}

#[test]
fn work_resolves_with_job_value() {
    let reactor = Reactor::new();
    let mut promise = None;
    reactor
        .run(|reactor| promise = Some(reactor.work(|| Ok("done")).promise()))
        .unwrap();

    assert_eq!(
        promise.map(|p| p.state()),
        Some(PromiseState::Resolved(Value::from("done")))
    );
}

#[test]
fn work_failure_rejects() {
    let reactor = Reactor::new();
    let mut promise = None;
    reactor
        .run(|reactor| {
            promise = Some(
                reactor
                    .work(|| -> Result<i64, Failure> { Err(Failure::work("disk full")) })
                    .promise(),
            )
        })
        .unwrap();

    assert_eq!(
        promise.map(|p| p.state()),
        Some(PromiseState::Rejected(Value::Error(Failure::work("disk full"))))
    );
}

#[test]
fn work_panic_rejects_with_panic_failure() {
    let reactor = Reactor::new();
    let mut promise = None;
    reactor
        .run(|reactor| {
            promise = Some(
                reactor
                    .work(|| -> Result<i64, Failure> { panic!("worker exploded") })
                    .promise(),
            )
        })
        .unwrap();

    match promise.map(|p| p.state()) {
        Some(PromiseState::Rejected(Value::Error(failure))) => {
            assert_eq!(failure.kind, FailureKind::Panic);
            assert_eq!(failure.message, "worker exploded");
        }
        state => panic!("unexpected state {:?}", state),
    }
}

#[test]
fn work_continuations_run_on_loop_thread() {
    let reactor = Reactor::new();
    let log = new_log();
    let loop_thread = thread::current().id();

    let l = log.clone();
    reactor
        .run(move |reactor| {
            reactor.work(|| Ok(1)).promise().then(move |_| {
                record(&l, thread::current().id() == loop_thread);
                Ok(Value::Nil)
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::Boolean(true)]);
}

#[test]
fn remote_keeps_loop_alive_until_dropped() {
    let reactor = Reactor::builder()
        .poll_interval(Duration::from_millis(1))
        .build()
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    reactor
        .run(move |reactor| {
            let remote = reactor.remote();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                remote
                    .schedule(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            });
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn remote_can_stop_loop() {
    let reactor = Reactor::new();
    let keep_alive = reactor.remote();
    let stopper = Arc::new(Mutex::new(None));

    let slot = stopper.clone();
    reactor
        .run(move |reactor| {
            let remote = reactor.remote();
            *slot.lock().unwrap() = Some(thread::spawn(move || remote.stop()));
        })
        .unwrap();

    let handle = stopper.lock().unwrap().take().unwrap();
    assert!(handle.join().unwrap().is_ok());
    assert!(!reactor.is_running());
    drop(keep_alive);
}

#[test]
fn stop_posted_while_idle_is_ignored() {
    let reactor = Reactor::new();
    let log = new_log();

    let remote = reactor.remote();
    assert!(remote.stop().is_ok());
    drop(remote);

    let l = log.clone();
    reactor
        .run(move |reactor| {
            let later = reactor.clone();
            reactor.next_tick(move || {
                record(&l, 1);
                later.next_tick(move || record(&l, 2));
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![Value::from(1), Value::from(2)]);
    assert_eq!(reactor.turn(), 2);
}

#[test]
fn panicking_remote_call_is_logged() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor.on_log(move |entry| record(&l, sym(&entry.context)));
    reactor
        .run(|reactor| {
            let remote = reactor.remote();
            thread::spawn(move || {
                remote.schedule(|_| panic!("remote failed")).unwrap();
            });
        })
        .unwrap();

    assert_eq!(entries(&log), vec![sym("performing async callback")]);
}

#[test]
fn log_records_error_and_context() {
    let reactor = Reactor::new();
    let log = new_log();

    let l = log.clone();
    reactor.on_log(move |entry| {
        record(&l, Value::List(vec![entry.error.clone(), entry.context.as_str().into()]))
    });
    reactor.log(&Value::error("boom"), "custom");

    assert_eq!(
        entries(&log),
        vec![Value::List(vec![Value::error("boom"), Value::from("custom")])]
    );
}

#[test]
fn panicking_log_listener_does_not_block_others() {
    let reactor = Reactor::new();
    let log = new_log();

    reactor.on_log(|_| panic!("listener failed"));
    let l = log.clone();
    reactor.on_log(move |entry| record(&l, sym(&entry.context)));
    reactor.log(&Value::error("boom"), "q_progress_cb");

    assert_eq!(entries(&log), vec![sym("q_progress_cb")]);
}

#[test]
fn builder_rejects_invalid_config() {
    let result = ReactorBuilder::new().work_threads(0).build();
    assert!(matches!(result, Err(QError::InvalidConfig(_))));
}

#[test]
fn config_from_json_drives_reactor() {
    let config =
        ReactorConfig::from_json(r#"{ "work_threads": 1, "thread_name": "disk" }"#).unwrap();
    let reactor = Reactor::with_config(config).unwrap();
    assert_eq!(reactor.config().work_threads, 1);
    assert_eq!(reactor.config().thread_name, "disk");
    assert_eq!(reactor.config().poll_interval_ms, 10);
}

#[test]
fn config_parse_error_is_reported() {
    let result = ReactorConfig::from_json("{ not json");
    assert!(matches!(result, Err(QError::Parse(_))));
}
