use evsim::{EventId, SchedulerKind, Simulator, Time};
use std::{cell::RefCell, rc::Rc};

type Log = Rc<RefCell<Vec<(&'static str, Time)>>>;

fn record(log: &Log, name: &'static str) -> impl FnOnce() + 'static {
    let log = Rc::clone(log);
    move || log.borrow_mut().push((name, Simulator::now()))
}

fn names(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(|(name, _)| *name).collect()
}

#[test]
fn events_run_in_time_then_insertion_order() {
    let log: Log = Rc::default();

    Simulator::schedule(Time::from_secs(5), record(&log, "t5"));
    Simulator::schedule(Time::from_secs(3), record(&log, "t3 first"));
    Simulator::schedule(Time::from_secs(3), record(&log, "t3 second"));
    Simulator::schedule(Time::from_secs(7), record(&log, "t7"));

    Simulator::run();

    assert_eq!(
        *log.borrow(),
        [
            ("t3 first", Time::from_secs(3)),
            ("t3 second", Time::from_secs(3)),
            ("t5", Time::from_secs(5)),
            ("t7", Time::from_secs(7)),
        ]
    );
    assert!(Simulator::is_finished());

    Simulator::destroy();
}

#[test]
fn cancelled_event_does_not_run() {
    let log: Log = Rc::default();

    let t5 = Simulator::schedule(Time::from_secs(5), record(&log, "t5"));
    Simulator::schedule(Time::from_secs(3), record(&log, "t3 first"));
    Simulator::schedule(Time::from_secs(3), record(&log, "t3 second"));
    Simulator::schedule(Time::from_secs(7), record(&log, "t7"));

    Simulator::cancel(&t5);
    Simulator::run();

    assert_eq!(names(&log), ["t3 first", "t3 second", "t7"]);
    assert!(Simulator::is_expired(&t5));

    Simulator::destroy();
}

#[test]
fn cancel_is_idempotent() {
    for kind in [SchedulerKind::Map, SchedulerKind::Heap] {
        Simulator::set_scheduler(kind);
        let log: Log = Rc::default();

        let a = Simulator::schedule(Time::from_nanos(10), record(&log, "A"));
        let b = Simulator::schedule(Time::from_nanos(11), record(&log, "B"));
        Simulator::schedule(Time::from_nanos(10), record(&log, "C"));

        Simulator::cancel(&b);
        Simulator::cancel(&b);
        Simulator::run();

        // after natural expiry
        Simulator::cancel(&a);
        Simulator::cancel(&EventId::null());

        assert_eq!(names(&log), ["A", "C"], "{kind:?}");
        assert_eq!(Simulator::now(), Time::from_nanos(10));

        Simulator::destroy();
    }
}

#[test]
fn handlers_schedule_and_cancel_reentrantly() {
    let log: Log = Rc::default();
    let victim = Rc::new(RefCell::new(EventId::null()));

    {
        let log = Rc::clone(&log);
        let victim = Rc::clone(&victim);
        Simulator::schedule(Time::from_secs(1), move || {
            log.borrow_mut().push(("first", Simulator::now()));

            // same time, after everything already queued at 1s
            Simulator::schedule_now(record(&log, "now"));
            Simulator::schedule(Time::ZERO, record(&log, "zero delay"));
            Simulator::schedule(Time::from_secs(1), record(&log, "later"));

            Simulator::cancel(&victim.borrow());
        });
    }
    Simulator::schedule(Time::from_secs(1), record(&log, "second"));
    *victim.borrow_mut() = Simulator::schedule(Time::from_secs(1), record(&log, "victim"));
    let removed = Simulator::schedule(Time::from_secs(3), record(&log, "removed"));
    Simulator::schedule(Time::from_secs(2), move || Simulator::remove(&removed));

    Simulator::run();

    assert_eq!(
        *log.borrow(),
        [
            ("first", Time::from_secs(1)),
            ("second", Time::from_secs(1)),
            ("now", Time::from_secs(1)),
            ("zero delay", Time::from_secs(1)),
            ("later", Time::from_secs(2)),
        ]
    );

    Simulator::destroy();
}

#[test]
fn time_never_moves_backward() {
    let times = Rc::new(RefCell::new(Vec::new()));

    for delay in [9, 2, 7, 2, 0, 4, 11, 7] {
        let times = Rc::clone(&times);
        Simulator::schedule(Time::from_millis(delay), move || {
            let now = Simulator::now();
            times.borrow_mut().push(now);
            if now < Time::from_millis(10) {
                let times = Rc::clone(&times);
                Simulator::schedule(Time::from_millis(3), move || {
                    times.borrow_mut().push(Simulator::now())
                });
            }
        });
    }
    Simulator::run();

    let times = times.borrow();
    assert_eq!(times.len(), 15);
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));

    Simulator::destroy();
}

#[test]
#[should_panic(expected = "cannot schedule an event in the past")]
fn scheduling_in_the_past() {
    Simulator::schedule(Time::from_secs(2), || ());
    Simulator::run();

    Simulator::schedule_at(Time::from_secs(1), || ());
}

#[test]
fn stop_from_a_handler() {
    let log: Log = Rc::default();

    Simulator::schedule(Time::from_secs(1), record(&log, "1s"));
    Simulator::schedule(Time::from_secs(1), Simulator::stop);
    Simulator::schedule(Time::from_secs(1), record(&log, "1s after stop"));
    Simulator::schedule(Time::from_secs(2), record(&log, "2s"));

    Simulator::run();
    assert_eq!(names(&log), ["1s"]);
    assert_eq!(Simulator::next(), Some(Time::from_secs(1)));

    // the stop request does not outlive the run
    Simulator::run();
    assert_eq!(names(&log), ["1s", "1s after stop", "2s"]);

    Simulator::destroy();
}

#[test]
fn stop_at_runs_events_up_to_the_limit() {
    let log: Log = Rc::default();

    Simulator::schedule(Time::from_secs(1), record(&log, "1s"));
    Simulator::schedule(Time::from_secs(2), record(&log, "2s"));
    Simulator::schedule(Time::from_secs(3), record(&log, "3s"));
    Simulator::stop_at(Time::from_secs(2));

    Simulator::run();

    assert_eq!(names(&log), ["1s", "2s"]);
    assert_eq!(Simulator::now(), Time::from_secs(2));
    assert!(!Simulator::is_finished());
    assert_eq!(Simulator::next(), Some(Time::from_secs(3)));

    // the limit only holds for the run it stopped
    Simulator::run();
    assert_eq!(names(&log), ["1s", "2s", "3s"]);

    Simulator::destroy();
}

#[test]
fn delay_left_and_status() {
    let a = Simulator::schedule(Time::from_millis(5), || ());
    let b = Simulator::schedule(Time::from_millis(8), || ());

    assert!(Simulator::is_running(&a));
    assert_eq!(Simulator::get_delay_left(&b), Time::from_millis(8));

    Simulator::stop_at(Time::from_millis(5));
    Simulator::run();

    assert!(Simulator::is_expired(&a));
    assert_eq!(Simulator::get_delay_left(&a), Time::ZERO);
    assert_eq!(Simulator::get_delay_left(&b), Time::from_millis(3));

    Simulator::destroy();
}

#[test]
fn destroy_runs_destroy_events_only() {
    let log: Log = Rc::default();

    Simulator::schedule_destroy(record(&log, "d1"));
    let d2 = Simulator::schedule_destroy(record(&log, "d2"));
    Simulator::schedule_destroy(record(&log, "d3"));
    let pending = Simulator::schedule(Time::from_secs(10), record(&log, "never"));

    Simulator::stop_at(Time::from_secs(1));
    Simulator::run();
    assert!(log.borrow().is_empty());

    Simulator::remove(&d2);
    Simulator::destroy();

    assert_eq!(names(&log), ["d1", "d3"]);
    assert!(Simulator::is_expired(&pending));

    // a fresh simulator, and destroying it again is harmless
    Simulator::destroy();
    assert_eq!(Simulator::now(), Time::ZERO);
    assert!(Simulator::is_finished());
    Simulator::destroy();
    assert_eq!(names(&log), ["d1", "d3"]);
}

#[test]
fn dropping_an_event_may_use_the_simulator() {
    struct CancelOnDrop(EventId);

    impl Drop for CancelOnDrop {
        fn drop(&mut self) {
            Simulator::cancel(&self.0);
            let _ = Simulator::now();
        }
    }

    let log: Log = Rc::default();
    let other = Simulator::schedule(Time::from_secs(2), record(&log, "other"));
    let guard = CancelOnDrop(other);

    let removed = Simulator::schedule(Time::from_secs(1), move || drop(guard));
    Simulator::remove(&removed);

    Simulator::run();
    assert!(log.borrow().is_empty());

    Simulator::destroy();
}

#[test]
fn set_scheduler_keeps_pending_events() {
    let log: Log = Rc::default();

    Simulator::schedule(Time::from_secs(2), record(&log, "b"));
    Simulator::schedule(Time::from_secs(1), record(&log, "a"));
    Simulator::set_scheduler(SchedulerKind::Heap);
    Simulator::schedule(Time::from_secs(2), record(&log, "c"));

    Simulator::run();
    assert_eq!(names(&log), ["a", "b", "c"]);

    Simulator::destroy();
}
