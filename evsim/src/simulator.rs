use crate::realtime::{Inbox, RealtimeHandle};
use evsim_core::{EventId, SchedulerKind, SimulatorCore, Time};
use std::cell::RefCell;

const TARGET: &str = "evsim::simulator";

struct Context {
    core: SimulatorCore,
    inbox: Inbox,
}

impl Context {
    fn new() -> Self {
        log::debug!(target: TARGET, "create simulator");
        Self {
            core: SimulatorCore::new(),
            inbox: Inbox::new(),
        }
    }
}

thread_local! {
    static CONTEXT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// run `f` on this thread's simulator, creating it if needed
///
/// # Panics
///
/// `f` must not call back into the simulator. None of the closures passed
/// here run user code.
fn with_context<R>(f: impl FnOnce(&mut Context) -> R) -> R {
    CONTEXT.with(|context| {
        let mut context = context.borrow_mut();
        f(context.get_or_insert_with(Context::new))
    })
}

/// like [`with_context`] but never creates the simulator and gives up
/// if the thread local storage is being torn down
pub(crate) fn try_with_core<R>(f: impl FnOnce(&mut SimulatorCore) -> R) -> Option<R> {
    CONTEXT
        .try_with(|context| {
            let mut context = context.try_borrow_mut().ok()?;
            context.as_mut().map(|context| f(&mut context.core))
        })
        .ok()
        .flatten()
}

/// The simulator of the current thread
///
/// Every thread has its own simulator, created lazily on first use and
/// torn down with [`Simulator::destroy`]. Events are closures run on the
/// simulation thread; they are free to call any of the functions below,
/// including scheduling or cancelling other events. Other threads can
/// only insert events through a [`RealtimeHandle`].
///
/// ```
/// use evsim::{Simulator, Time};
/// use std::{cell::RefCell, rc::Rc};
///
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let l = Rc::clone(&log);
/// Simulator::schedule(Time::from_secs(1), move || {
///     l.borrow_mut().push(Simulator::now());
///
///     let l = Rc::clone(&l);
///     Simulator::schedule(Time::from_millis(500), move || {
///         l.borrow_mut().push(Simulator::now())
///     });
/// });
///
/// Simulator::run();
/// assert_eq!(*log.borrow(), [Time::from_secs(1), Time::from_millis(1_500)]);
/// Simulator::destroy();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Simulator;

impl Simulator {
    /// select the event queue implementation
    ///
    /// pending events are moved into the new queue
    pub fn set_scheduler(kind: SchedulerKind) {
        log::debug!(target: TARGET, "set scheduler {kind:?}");
        with_context(|context| context.core.set_scheduler(kind.build()))
    }

    /// schedule `f` to run after `delay`
    ///
    /// # Panics
    ///
    /// if `now + delay` does not fit in the virtual clock
    pub fn schedule<F>(delay: Time, f: F) -> EventId
    where
        F: FnOnce() + 'static,
    {
        with_context(|context| context.core.schedule(delay, f))
    }

    /// schedule `f` to run at the absolute virtual `time`
    ///
    /// # Panics
    ///
    /// if `time` is before [`Simulator::now`]
    pub fn schedule_at<F>(time: Time, f: F) -> EventId
    where
        F: FnOnce() + 'static,
    {
        with_context(|context| context.core.schedule_at(time, f))
    }

    /// schedule `f` to run now, after the events already queued for the
    /// current time
    pub fn schedule_now<F>(f: F) -> EventId
    where
        F: FnOnce() + 'static,
    {
        with_context(|context| context.core.schedule_now(f))
    }

    /// schedule `f` to run when the simulator is destroyed
    pub fn schedule_destroy<F>(f: F) -> EventId
    where
        F: FnOnce() + 'static,
    {
        with_context(|context| context.core.schedule_destroy(f))
    }

    /// prevent a pending event from running
    ///
    /// the event is left in the queue and skipped when it is reached
    pub fn cancel(id: &EventId) {
        id.cancel()
    }

    /// remove a pending event from the queue
    ///
    /// the event's closure is dropped before this function returns
    pub fn remove(id: &EventId) {
        let event = with_context(|context| context.core.remove(id));
        drop(event);
    }

    /// true if the event ran, is running, was cancelled or removed
    pub fn is_expired(id: &EventId) -> bool {
        id.is_expired()
    }

    pub fn is_running(id: &EventId) -> bool {
        id.is_running()
    }

    /// time left before the event runs, zero if it is expired
    pub fn get_delay_left(id: &EventId) -> Time {
        with_context(|context| context.core.get_delay_left(id))
    }

    /// current virtual time
    pub fn now() -> Time {
        with_context(|context| context.core.now())
    }

    /// time of the next event in the queue
    pub fn next() -> Option<Time> {
        with_context(|context| context.core.next())
    }

    /// true when there is no more event to run
    pub fn is_finished() -> bool {
        with_context(|context| context.core.is_finished())
    }

    /// run the events in order until the queue is empty or a stop
    /// condition is reached
    ///
    /// Jobs inserted through a [`RealtimeHandle`] are moved into the
    /// queue before every event.
    pub fn run() {
        log::debug!(target: TARGET, "run from {now}", now = Self::now());
        with_context(|context| context.core.begin_run());

        loop {
            let event = with_context(|context| {
                if context.inbox.drain(&mut context.core) {
                    context.core.stop();
                }
                context.core.next_event()
            });

            let Some(event) = event else {
                break;
            };
            event.invoke();
        }

        log::debug!(target: TARGET, "run stopped at {now}", now = Self::now());
    }

    /// stop the current run before the next event
    pub fn stop() {
        with_context(|context| context.core.stop())
    }

    /// let the run loop execute the events up to and including `time`
    pub fn stop_at(time: Time) {
        with_context(|context| context.core.stop_at(time))
    }

    /// run the destroy events then release the simulator
    ///
    /// pending events are dropped without running. Calling this again is
    /// a no-op; the next use of the simulator starts a new one at time
    /// zero.
    pub fn destroy() {
        loop {
            let events = try_with_core(|core| core.take_destroy_events()).unwrap_or_default();
            if events.is_empty() {
                break;
            }
            for event in events {
                event.invoke();
            }
        }

        let context = CONTEXT.with(|context| context.borrow_mut().take());
        if let Some(mut context) = context {
            log::debug!(target: TARGET, "destroy simulator at {now}", now = context.core.now());
            let pending = context.core.take_pending_events();
            drop(pending);
            drop(context);
        }
    }

    /// get a handle to insert events from other threads
    pub fn realtime_handle() -> RealtimeHandle {
        with_context(|context| context.inbox.handle())
    }
}
