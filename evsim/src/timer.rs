use crate::{Simulator, simulator::try_with_core};
use evsim_core::{EventId, Time};
use std::{fmt, rc::Rc};

const TARGET: &str = "evsim::timer";

/// What to do with a pending event when its [`Timer`] is dropped
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestroyPolicy {
    /// cancel the event, it stays in the queue until it is reached
    #[default]
    CancelOnDestroy,
    /// remove the event from the queue
    RemoveOnDestroy,
    /// panic if the event is still pending
    CheckOnDestroy,
}

/// A restartable event
///
/// The timer owns a function and the id of its last scheduled event. It
/// can be scheduled again once the previous event expired, and it can be
/// suspended and resumed with the remaining delay.
///
/// ```
/// use evsim::{Simulator, Time, Timer};
/// use std::{cell::Cell, rc::Rc};
///
/// let fired = Rc::new(Cell::new(0));
/// let mut timer = Timer::new();
/// let f = Rc::clone(&fired);
/// timer.set_function(move || f.set(f.get() + 1));
/// timer.set_delay(Time::from_millis(10));
///
/// timer.schedule();
/// Simulator::run();
/// timer.schedule();
/// Simulator::run();
///
/// assert_eq!(fired.get(), 2);
/// assert_eq!(Simulator::now(), Time::from_millis(20));
/// # Simulator::destroy();
/// ```
pub struct Timer {
    policy: DestroyPolicy,
    function: Option<Rc<dyn Fn()>>,
    delay: Time,
    event: EventId,
    suspended: Option<Time>,
}

impl Timer {
    /// timer with the [`DestroyPolicy::CancelOnDestroy`] policy
    pub fn new() -> Self {
        Self::with_policy(DestroyPolicy::default())
    }

    pub fn with_policy(policy: DestroyPolicy) -> Self {
        Self {
            policy,
            function: None,
            delay: Time::ZERO,
            event: EventId::null(),
            suspended: None,
        }
    }

    pub fn policy(&self) -> DestroyPolicy {
        self.policy
    }

    /// set the function to run when the timer expires
    ///
    /// an already scheduled event keeps the previous function
    pub fn set_function<F>(&mut self, f: F)
    where
        F: Fn() + 'static,
    {
        self.function = Some(Rc::new(f));
    }

    /// default delay used by [`Timer::schedule`]
    pub fn set_delay(&mut self, delay: Time) {
        self.delay = delay;
    }

    pub fn delay(&self) -> Time {
        self.delay
    }

    /// schedule the function after the default delay
    ///
    /// # Panics
    ///
    /// if the timer is still running or has no function
    pub fn schedule(&mut self) {
        self.schedule_with_delay(self.delay)
    }

    /// schedule the function after `delay`
    ///
    /// # Panics
    ///
    /// if the timer is still running or has no function
    pub fn schedule_with_delay(&mut self, delay: Time) {
        assert!(
            self.event.is_expired(),
            "the timer's event is still pending, cancel it before scheduling again"
        );
        let Some(function) = self.function.as_ref().map(Rc::clone) else {
            panic!("the timer has no function to schedule");
        };

        self.event = Simulator::schedule(delay, move || function());
        self.suspended = None;
        log::trace!(target: TARGET, "scheduled in {delay} (uid {})", self.event.uid());
    }

    /// cancel the pending event, if any
    pub fn cancel(&mut self) {
        Simulator::cancel(&self.event);
    }

    /// remove the pending event from the queue, if any
    pub fn remove(&mut self) {
        Simulator::remove(&self.event);
    }

    /// the timer is not scheduled, or its event already ran or was cancelled
    pub fn is_expired(&self) -> bool {
        !self.is_suspended() && self.event.is_expired()
    }

    /// the timer's event is pending
    pub fn is_running(&self) -> bool {
        !self.is_suspended() && self.event.is_running()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    /// remove the pending event and remember the time it had left
    ///
    /// # Panics
    ///
    /// if the timer is not running
    pub fn suspend(&mut self) {
        assert!(self.is_running(), "only a running timer can be suspended");

        let left = Simulator::get_delay_left(&self.event);
        Simulator::remove(&self.event);
        self.suspended = Some(left);
        log::trace!(target: TARGET, "suspended with {left} left");
    }

    /// schedule the function again with the delay left when suspended
    ///
    /// # Panics
    ///
    /// if the timer is not suspended
    pub fn resume(&mut self) {
        let Some(left) = self.suspended else {
            panic!("only a suspended timer can be resumed");
        };
        self.schedule_with_delay(left);
    }

    /// time left before the timer expires
    ///
    /// this is the remaining delay of a suspended timer and zero for an
    /// expired one
    pub fn delay_left(&self) -> Time {
        match self.suspended {
            Some(left) => left,
            None => Simulator::get_delay_left(&self.event),
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        match self.policy {
            DestroyPolicy::CancelOnDestroy => self.event.cancel(),
            DestroyPolicy::RemoveOnDestroy => {
                // the removed event (and its closure) is dropped outside
                // of the simulator's borrow
                let event = try_with_core(|core| core.remove(&self.event)).flatten();
                if event.is_none() {
                    self.event.cancel();
                }
                drop(event);
            }
            DestroyPolicy::CheckOnDestroy => {
                if self.event.is_running() && !std::thread::panicking() {
                    panic!("a timer was dropped while its event was still pending");
                }
            }
        }
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("policy", &self.policy)
            .field("delay", &self.delay)
            .field("event", &self.event)
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}
