use crate::{
    event::{Event, EventKey},
    scheduler::Scheduler,
};
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// [`Scheduler`] backed by a binary heap
///
/// Insertion and removal of the next event are logarithmic. Removing an
/// arbitrary event rebuilds the heap.
#[derive(Default)]
pub struct HeapScheduler {
    heap: BinaryHeap<Reverse<OrderedByKey>>,
}

struct OrderedByKey {
    key: EventKey,
    event: Event,
}

impl PartialEq for OrderedByKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for OrderedByKey {}

impl PartialOrd for OrderedByKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedByKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl HeapScheduler {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }
}

impl Scheduler for HeapScheduler {
    fn insert(&mut self, key: EventKey, event: Event) {
        self.heap.push(Reverse(OrderedByKey { key, event }))
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    fn len(&self) -> usize {
        self.heap.len()
    }

    fn peek_next_key(&self) -> Option<EventKey> {
        self.heap.peek().map(|entry| entry.0.key)
    }

    fn remove_next(&mut self) -> Option<(EventKey, Event)> {
        self.heap
            .pop()
            .map(|Reverse(OrderedByKey { key, event })| (key, event))
    }

    fn remove(&mut self, key: EventKey) -> Option<Event> {
        if !self.heap.iter().any(|entry| entry.0.key == key) {
            return None;
        }

        let mut removed = None;
        let entries = std::mem::take(&mut self.heap).into_vec();
        self.heap = entries
            .into_iter()
            .filter_map(|entry| {
                if entry.0.key == key {
                    removed = Some(entry.0.event);
                    None
                } else {
                    Some(entry)
                }
            })
            .collect();
        removed
    }
}
