/*!
Event queues

A [`Scheduler`] keeps the pending events ordered by [`EventKey`]: the
earliest timestamp first and, for equal timestamps, the lowest uid first.
The simulator only ever talks to the queue through this trait so any
ordering structure can be plugged in with [`SchedulerKind`] or by handing
a boxed implementation to the simulator.
*/

mod heap;
mod map;

pub use self::{heap::HeapScheduler, map::MapScheduler};
use crate::event::{Event, EventKey};

pub trait Scheduler {
    /// insert a new event. Keys are unique.
    fn insert(&mut self, key: EventKey, event: Event);

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;

    /// key of the earliest event, without removing it
    fn peek_next_key(&self) -> Option<EventKey>;

    /// remove and return the earliest event
    fn remove_next(&mut self) -> Option<(EventKey, Event)>;

    /// remove the event with the given key, if it is still queued
    fn remove(&mut self, key: EventKey) -> Option<Event>;
}

/// The built-in [`Scheduler`] implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchedulerKind {
    /// ordered map, logarithmic removal of arbitrary events
    #[default]
    Map,
    /// binary heap, cheap insertion, linear removal of arbitrary events
    Heap,
}

impl SchedulerKind {
    pub fn build(self) -> Box<dyn Scheduler> {
        match self {
            Self::Map => Box::new(MapScheduler::new()),
            Self::Heap => Box::new(HeapScheduler::new()),
        }
    }
}
