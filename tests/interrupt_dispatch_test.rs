//! Integration tests for interrupt registration and observer dispatch,
//! including the teardown race the trampoline has to survive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ctr700::driver::MockDriver;
use ctr700::{Ctr700, DigitalInputEvent, InterruptTrigger};
use serial_test::serial;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
#[serial]
fn events_fan_out_to_every_observer() {
    init_logging();
    let mock = Arc::new(MockDriver::new());
    let mut session = Ctr700::open(mock.clone()).unwrap();
    session
        .set_digital_input_events(5, InterruptTrigger::BothEdges)
        .unwrap();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let (a, b) = (Arc::clone(&first), Arc::clone(&second));
    session.subscribe_digital_inputs(move |_| {
        a.fetch_add(1, Ordering::SeqCst);
    });
    session.subscribe_digital_inputs(move |_| {
        b.fetch_add(1, Ordering::SeqCst);
    });

    mock.fire_input(5, true);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn events_carry_channel_and_state() {
    init_logging();
    let mock = Arc::new(MockDriver::new());
    let mut session = Ctr700::open(mock.clone()).unwrap();
    for channel in [1, 6] {
        session
            .set_digital_input_events(channel, InterruptTrigger::BothEdges)
            .unwrap();
    }

    let seen: Arc<Mutex<Vec<DigitalInputEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.subscribe_digital_inputs(move |event| {
        sink.lock().unwrap().push(event);
    });

    mock.fire_input(1, true);
    mock.fire_input(6, false);
    mock.fire_input(1, false);

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].channel, 1);
    assert!(events[0].state);
    assert_eq!(events[1].channel, 6);
    assert!(!events[1].state);
    assert!(!events[2].state);
}

#[test]
#[serial]
fn observers_may_issue_reads_from_the_callback() {
    init_logging();
    // An observer reading back device state exercises the lock ordering
    // between dispatch and the driver; this must not deadlock.
    let mock = Arc::new(MockDriver::new());
    let session = Arc::new(Mutex::new(Ctr700::open(mock.clone()).unwrap()));
    session
        .lock()
        .unwrap()
        .set_digital_input_events(0, InterruptTrigger::RisingEdge)
        .unwrap();

    let readback = Arc::new(Mutex::new(None));
    let (handle, sink) = (Arc::clone(&session), Arc::clone(&readback));
    session.lock().unwrap().subscribe_digital_inputs(move |event| {
        let state = handle.lock().unwrap().digital_input(event.channel);
        *sink.lock().unwrap() = Some(state);
    });

    // fire_input is called from the test thread while no session lock is
    // held, mirroring a driver thread interleaving with an idle owner.
    mock.fire_input(0, true);
    assert_eq!(*readback.lock().unwrap(), Some(Ok(true)));

    // The observer keeps an Arc to the session alive, so close explicitly
    // to release the process-wide guard for the next test.
    session.lock().unwrap().close();
}

#[test]
#[serial]
fn late_interrupt_after_close_is_ignored() {
    init_logging();
    let mock = Arc::new(MockDriver::new());
    let mut session = Ctr700::open(mock.clone()).unwrap();
    session
        .set_digital_input_events(2, InterruptTrigger::BothEdges)
        .unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    session.subscribe_digital_inputs(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // The driver thread may still hold the entry point while the owner
    // tears the session down; a delivery arriving afterwards has to be
    // swallowed without touching freed state.
    let raw = mock.registered_callback(2).unwrap();
    session.close();
    unsafe { raw(2, 1) };
    unsafe { raw(2, 0) };
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn dispatch_state_does_not_leak_into_the_next_session() {
    init_logging();
    let mock = Arc::new(MockDriver::new());
    let mut session = Ctr700::open(mock.clone()).unwrap();
    session
        .set_digital_input_events(0, InterruptTrigger::BothEdges)
        .unwrap();
    let stale = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&stale);
    session.subscribe_digital_inputs(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let raw = mock.registered_callback(0).unwrap();
    session.close();

    // A fresh session with its own observer list.
    let next_mock = Arc::new(MockDriver::new());
    let mut next = Ctr700::open(next_mock.clone()).unwrap();
    next.set_digital_input_events(0, InterruptTrigger::BothEdges)
        .unwrap();
    let fresh = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fresh);
    next.subscribe_digital_inputs(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // The entry point is process-global, so a late delivery lands in the
    // live session's dispatch. What must not survive teardown is the old
    // observer list: the closed session's subscribers stay silent.
    unsafe { raw(0, 1) };
    next_mock.fire_input(0, true);
    assert_eq!(stale.load(Ordering::SeqCst), 0);
    assert_eq!(fresh.load(Ordering::SeqCst), 2);
}
