use evsim_core::{
    EventId,
    defaults::{EVENT_COLLECTOR_CHUNK_MAX, EVENT_COLLECTOR_CHUNK_MIN},
};

/// Keeps track of scheduled events and cancels the pending ones when
/// dropped
///
/// Expired ids are discarded every time the number of tracked ids reaches
/// a threshold. The threshold doubles when a cleanup frees too little and
/// halves otherwise, staying between [`EVENT_COLLECTOR_CHUNK_MIN`] and
/// [`EVENT_COLLECTOR_CHUNK_MAX`].
///
/// ```
/// use evsim::{EventCollector, Simulator, Time};
///
/// let id = Simulator::schedule(Time::from_secs(1), || unreachable!());
/// {
///     let mut collector = EventCollector::new();
///     collector.track(id.clone());
/// }
/// assert!(Simulator::is_expired(&id));
///
/// Simulator::run();
/// # Simulator::destroy();
/// ```
#[derive(Debug)]
pub struct EventCollector {
    events: Vec<EventId>,
    next_cleanup: usize,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_cleanup: EVENT_COLLECTOR_CHUNK_MIN,
        }
    }

    /// start tracking `id`
    pub fn track(&mut self, id: EventId) {
        self.events.push(id);
        if self.events.len() >= self.next_cleanup {
            self.cleanup();
        }
    }

    /// number of ids currently tracked, some may have expired since the
    /// last cleanup
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn cleanup(&mut self) {
        self.events.retain(|id| !id.is_expired());

        self.next_cleanup = if self.events.len() >= self.next_cleanup {
            (self.next_cleanup << 1).min(EVENT_COLLECTOR_CHUNK_MAX)
        } else {
            (self.next_cleanup >> 1).max(EVENT_COLLECTOR_CHUNK_MIN)
        };
        log::trace!(
            target: "evsim::event_collector",
            "{} pending event(s), next cleanup at {}",
            self.events.len(),
            self.next_cleanup
        );
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventCollector {
    fn drop(&mut self) {
        for id in self.events.drain(..) {
            id.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Simulator;
    use evsim_core::Time;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn expired_events_are_discarded() {
        let mut collector = EventCollector::new();

        for _ in 0..EVENT_COLLECTOR_CHUNK_MIN - 1 {
            collector.track(Simulator::schedule(Time::ZERO, || ()));
        }
        Simulator::run();
        assert_eq!(collector.len(), EVENT_COLLECTOR_CHUNK_MIN - 1);

        collector.track(Simulator::schedule(Time::from_secs(1), || ()));
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.next_cleanup, EVENT_COLLECTOR_CHUNK_MIN);

        Simulator::destroy();
    }

    #[test]
    fn threshold_grows_and_shrinks() {
        let mut collector = EventCollector::new();

        for _ in 0..EVENT_COLLECTOR_CHUNK_MIN {
            collector.track(Simulator::schedule(Time::from_secs(1), || ()));
        }
        assert_eq!(collector.next_cleanup, EVENT_COLLECTOR_CHUNK_MIN * 2);

        for _ in 0..2_000 {
            collector.track(Simulator::schedule(Time::from_secs(1), || ()));
        }
        assert_eq!(collector.next_cleanup, EVENT_COLLECTOR_CHUNK_MAX);

        Simulator::run();
        collector.track(EventId::null());
        assert!(collector.is_empty());
        assert_eq!(collector.next_cleanup, EVENT_COLLECTOR_CHUNK_MAX / 2);

        Simulator::destroy();
    }

    #[test]
    fn pending_events_are_cancelled_on_drop() {
        let runs = Rc::new(Cell::new(0));
        let mut collector = EventCollector::new();

        for i in 0..20 {
            let runs = Rc::clone(&runs);
            let id = Simulator::schedule(Time::from_secs(i), move || runs.set(runs.get() + 1));
            if i % 2 == 0 {
                collector.track(id);
            }
        }
        drop(collector);

        Simulator::run();
        assert_eq!(runs.get(), 10);

        Simulator::destroy();
    }
}
