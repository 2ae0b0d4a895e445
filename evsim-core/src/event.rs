use crate::Time;
use std::{cell::Cell, fmt, rc::Rc};

/// Ordering key of an event in the scheduler
///
/// Events are ordered by their timestamp first and then by their unique
/// id. Ids are handed out in insertion order, which makes events scheduled
/// for the same instant run in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventKey {
    pub ts: Time,
    pub uid: u64,
}

impl EventKey {
    pub const fn new(ts: Time, uid: u64) -> Self {
        Self { ts, uid }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.uid, self.ts)
    }
}

/// Lifecycle of a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// waiting in the scheduler (or in the destroy list)
    Pending,
    /// currently being invoked
    Running,
    /// invoked and returned
    Done,
    /// cancelled or removed before it could run
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EventKind {
    #[default]
    Regular,
    Destroy,
}

/// A scheduled callback
///
/// The callback is run at most once: [`Event::invoke`] consumes the event
/// and skips the body if the event was cancelled in the meantime.
pub struct Event {
    status: Rc<Cell<EventStatus>>,
    callback: Box<dyn FnOnce()>,
}

impl Event {
    pub(crate) fn new(callback: Box<dyn FnOnce()>) -> Self {
        Self {
            status: Rc::new(Cell::new(EventStatus::Pending)),
            callback,
        }
    }

    pub(crate) fn id(&self, key: EventKey, kind: EventKind) -> EventId {
        EventId {
            key,
            kind,
            status: Some(Rc::clone(&self.status)),
        }
    }

    #[inline]
    pub fn status(&self) -> EventStatus {
        self.status.get()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status() == EventStatus::Cancelled
    }

    pub(crate) fn mark_cancelled(&self) {
        self.status.set(EventStatus::Cancelled);
    }

    /// run the event body, unless it was cancelled
    pub fn invoke(self) {
        if self.is_cancelled() {
            return;
        }

        self.status.set(EventStatus::Running);
        (self.callback)();
        self.status.set(EventStatus::Done);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Handle to a scheduled event
///
/// Copies of the handle refer to the same event. The default handle
/// refers to no event at all and is always expired.
#[derive(Clone, Default)]
pub struct EventId {
    key: EventKey,
    kind: EventKind,
    status: Option<Rc<Cell<EventStatus>>>,
}

impl EventId {
    /// the null handle, referring to no event
    pub fn null() -> Self {
        Self::default()
    }

    #[inline]
    pub fn ts(&self) -> Time {
        self.key.ts
    }

    #[inline]
    pub fn uid(&self) -> u64 {
        self.key.uid
    }

    #[inline]
    pub fn key(&self) -> EventKey {
        self.key
    }

    pub(crate) fn kind(&self) -> EventKind {
        self.kind
    }

    /// `None` for the null handle
    pub fn status(&self) -> Option<EventStatus> {
        self.status.as_ref().map(|status| status.get())
    }

    /// true if the event ran, is running, was cancelled or removed,
    /// or if this is the null handle
    pub fn is_expired(&self) -> bool {
        self.status() != Some(EventStatus::Pending)
    }

    /// the event is still waiting to run
    pub fn is_running(&self) -> bool {
        !self.is_expired()
    }

    /// flip a pending event to cancelled
    ///
    /// the event stays queued but will not run. This is a no-op on an
    /// expired event.
    pub fn cancel(&self) {
        if let Some(status) = self.status.as_ref() {
            if status.get() == EventStatus::Pending {
                status.set(EventStatus::Cancelled);
            }
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.status() == Some(EventStatus::Pending)
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.status, &other.status) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for EventId {}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventId")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("status", &self.status())
            .finish()
    }
}
