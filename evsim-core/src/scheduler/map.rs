use crate::{
    event::{Event, EventKey},
    scheduler::Scheduler,
};
use std::collections::BTreeMap;

/// [`Scheduler`] backed by an ordered map
///
/// All the operations are logarithmic in the number of pending events,
/// including the removal of an arbitrary event.
#[derive(Default)]
pub struct MapScheduler {
    events: BTreeMap<EventKey, Event>,
}

impl MapScheduler {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }
}

impl Scheduler for MapScheduler {
    fn insert(&mut self, key: EventKey, event: Event) {
        let previous = self.events.insert(key, event);
        debug_assert!(previous.is_none(), "event key {key} inserted twice");
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    fn len(&self) -> usize {
        self.events.len()
    }

    fn peek_next_key(&self) -> Option<EventKey> {
        self.events.first_key_value().map(|(key, _)| *key)
    }

    fn remove_next(&mut self) -> Option<(EventKey, Event)> {
        self.events.pop_first()
    }

    fn remove(&mut self, key: EventKey) -> Option<Event> {
        self.events.remove(&key)
    }
}
