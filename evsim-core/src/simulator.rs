use crate::{
    Time,
    defaults::DEFAULT_SCHEDULER,
    event::{Event, EventId, EventKey, EventKind},
    scheduler::{Scheduler, SchedulerKind},
};
use std::collections::VecDeque;

/// The discrete event simulator state
///
/// This owns the virtual clock, the event queue and the list of events to
/// run when the simulation is torn down. It does not run the events
/// itself: [`SimulatorCore::next_event`] hands the next due event to the
/// caller, who invokes it without holding on to the core. This way event
/// bodies are free to schedule or cancel other events.
///
/// ```
/// # use evsim_core::{SimulatorCore, Time};
/// # use std::{cell::RefCell, rc::Rc};
/// let mut core = SimulatorCore::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let l = Rc::clone(&log);
/// core.schedule(Time::from_millis(10), move || l.borrow_mut().push("b"));
/// let l = Rc::clone(&log);
/// core.schedule(Time::from_millis(5), move || l.borrow_mut().push("a"));
///
/// while let Some(event) = core.next_event() {
///     event.invoke();
/// }
/// assert_eq!(*log.borrow(), ["a", "b"]);
/// assert_eq!(core.now(), Time::from_millis(10));
/// ```
pub struct SimulatorCore {
    scheduler: Box<dyn Scheduler>,
    destroy_events: VecDeque<(EventId, Event)>,

    current_ts: Time,
    current_uid: u64,
    next_uid: u64,

    stop: bool,
    stop_at: Option<Time>,
}

impl SimulatorCore {
    pub fn new() -> Self {
        Self::with_kind(DEFAULT_SCHEDULER)
    }

    pub fn with_kind(kind: SchedulerKind) -> Self {
        Self::with_scheduler(kind.build())
    }

    /// create a simulator core using the given event queue
    ///
    /// # Panics
    ///
    /// the given scheduler must be empty
    pub fn with_scheduler(scheduler: Box<dyn Scheduler>) -> Self {
        assert!(
            scheduler.is_empty(),
            "the simulator needs an empty scheduler to start with"
        );

        Self {
            scheduler,
            destroy_events: VecDeque::new(),
            current_ts: Time::ZERO,
            current_uid: 0,
            // 0 is the uid of the null event id
            next_uid: 1,
            stop: false,
            stop_at: None,
        }
    }

    /// replace the event queue, the pending events are moved over to the
    /// new scheduler
    pub fn set_scheduler(&mut self, mut scheduler: Box<dyn Scheduler>) {
        while let Some((key, event)) = self.scheduler.remove_next() {
            scheduler.insert(key, event);
        }
        self.scheduler = scheduler;
    }

    /// current virtual time
    #[inline]
    pub fn now(&self) -> Time {
        self.current_ts
    }

    /// uid of the event currently (or last) executed
    #[inline]
    pub fn current_uid(&self) -> u64 {
        self.current_uid
    }

    /// number of events in the queue, including the cancelled ones
    /// not yet reached
    #[inline]
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// true when there is no more event to run
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// time of the next queued event
    pub fn next(&self) -> Option<Time> {
        self.scheduler.peek_next_key().map(|key| key.ts)
    }

    fn next_key(&mut self, ts: Time) -> EventKey {
        let key = EventKey::new(ts, self.next_uid);
        self.next_uid += 1;
        key
    }

    /// schedule `f` to run after `delay` has elapsed from now
    pub fn schedule(&mut self, delay: Time, f: impl FnOnce() + 'static) -> EventId {
        let time = self
            .current_ts
            .checked_add(delay)
            .expect("scheduled time overflows the virtual clock");
        self.schedule_at(time, f)
    }

    /// schedule `f` to run at the absolute virtual `time`
    ///
    /// # Panics
    ///
    /// if `time` is earlier than [`SimulatorCore::now`]
    pub fn schedule_at(&mut self, time: Time, f: impl FnOnce() + 'static) -> EventId {
        self.insert_at(time, Box::new(f))
    }

    pub(crate) fn insert_at(&mut self, time: Time, f: Box<dyn FnOnce()>) -> EventId {
        assert!(
            time >= self.current_ts,
            "cannot schedule an event in the past (now: {now}, requested: {time})",
            now = self.current_ts,
        );

        let key = self.next_key(time);
        let event = Event::new(f);
        let id = event.id(key, EventKind::Regular);

        log::trace!(
            "i {} {} {} {}",
            self.current_uid,
            self.current_ts.as_nanos(),
            key.uid,
            key.ts.as_nanos()
        );
        self.scheduler.insert(key, event);

        id
    }

    /// schedule `f` to run at the current time, after every event
    /// already queued for the current time
    pub fn schedule_now(&mut self, f: impl FnOnce() + 'static) -> EventId {
        self.insert_at(self.current_ts, Box::new(f))
    }

    /// boxed flavour of [`SimulatorCore::schedule_now`]
    pub fn schedule_now_boxed(&mut self, f: Box<dyn FnOnce()>) -> EventId {
        self.insert_at(self.current_ts, f)
    }

    /// register `f` to run when the simulation is destroyed
    pub fn schedule_destroy(&mut self, f: impl FnOnce() + 'static) -> EventId {
        let key = self.next_key(self.current_ts);
        let event = Event::new(Box::new(f));
        let id = event.id(key, EventKind::Destroy);
        self.destroy_events.push_back((id.clone(), event));
        id
    }

    /// cancel a pending event
    ///
    /// the event stays in its queue but its body will not run. This is a
    /// no-op for an event that has already run, is running, was already
    /// cancelled or removed.
    pub fn cancel(&mut self, id: &EventId) {
        id.cancel()
    }

    /// remove a pending event from its queue
    ///
    /// The removed event is returned so the caller controls where the
    /// captured state is dropped. Removing an expired event is a no-op.
    pub fn remove(&mut self, id: &EventId) -> Option<Event> {
        if !id.is_pending() {
            return None;
        }

        let event = match id.kind() {
            EventKind::Regular => self.scheduler.remove(id.key()),
            EventKind::Destroy => {
                let index = self
                    .destroy_events
                    .iter()
                    .position(|(destroy_id, _)| destroy_id == id)?;
                self.destroy_events.remove(index).map(|(_, event)| event)
            }
        }?;

        log::trace!(
            "r {} {} {} {}",
            self.current_uid,
            self.current_ts.as_nanos(),
            id.uid(),
            id.ts().as_nanos()
        );
        event.mark_cancelled();
        Some(event)
    }

    pub fn is_expired(&self, id: &EventId) -> bool {
        id.is_expired()
    }

    pub fn is_running(&self, id: &EventId) -> bool {
        id.is_running()
    }

    /// time left before the event runs, zero if it is expired
    pub fn get_delay_left(&self, id: &EventId) -> Time {
        if id.is_expired() {
            Time::ZERO
        } else {
            id.ts().saturating_sub(self.current_ts)
        }
    }

    /// stop the run loop before the next event
    pub fn stop(&mut self) {
        self.stop = true;
    }

    /// let the run loop execute events up to and including `time`
    ///
    /// the limit is dropped once it has stopped a run.
    pub fn stop_at(&mut self, time: Time) {
        self.stop_at = Some(time);
    }

    /// clear the stop request, called when a new run starts
    pub fn begin_run(&mut self) {
        self.stop = false;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stop
    }

    /// pop the next event that is due
    ///
    /// Returns `None` when the queue is empty, when a stop was requested or
    /// when the next event lies beyond the `stop_at` time. The virtual
    /// clock advances to the event's timestamp, except for cancelled
    /// events which are returned (so the caller drops them) without moving
    /// the clock.
    pub fn next_event(&mut self) -> Option<Event> {
        if self.stop {
            return None;
        }

        let key = self.scheduler.peek_next_key()?;
        if self.stop_at.is_some_and(|stop_at| key.ts > stop_at) {
            log::debug!("stop time reached at {}", self.current_ts);
            self.stop_at = None;
            return None;
        }

        let (key, event) = self
            .scheduler
            .remove_next()
            .expect("We just peeked the scheduler, so a remove should always work");

        if event.is_cancelled() {
            return Some(event);
        }

        debug_assert!(key.ts >= self.current_ts, "virtual time moved backward");
        self.current_ts = key.ts;
        self.current_uid = key.uid;
        log::trace!("e {} {}", key.uid, key.ts.as_nanos());

        Some(event)
    }

    /// take all the destroy events, in insertion order
    pub fn take_destroy_events(&mut self) -> Vec<Event> {
        self.destroy_events
            .drain(..)
            .map(|(_, event)| event)
            .collect()
    }

    /// drain the queue of regular events without running them
    pub fn take_pending_events(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.scheduler.len());
        while let Some((_, event)) = self.scheduler.remove_next() {
            event.mark_cancelled();
            events.push(event);
        }
        events
    }
}

impl Default for SimulatorCore {
    fn default() -> Self {
        Self::new()
    }
}
