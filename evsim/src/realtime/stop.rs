use std::sync::atomic::{AtomicBool, Ordering};

/// stop request raised from any thread and consumed by the dispatch loop
#[derive(Debug, Default)]
pub(crate) struct Stop(AtomicBool);

/// total ordering: a request made before a job is sent must be seen by
/// the simulation thread no later than the job itself
const ORDERING: Ordering = Ordering::SeqCst;

impl Stop {
    pub(crate) fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    pub(crate) fn is_requested(&self) -> bool {
        self.0.load(ORDERING)
    }

    #[inline]
    pub(crate) fn request(&self) {
        self.0.store(true, ORDERING)
    }

    /// read the request and clear it
    #[inline]
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, ORDERING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn not_requested_initially() {
        assert!(!Stop::new().is_requested());
        assert!(!Stop::default().is_requested());
    }

    #[test]
    fn request_is_consumed_once() {
        let stop = Stop::new();

        stop.request();
        stop.request();
        assert!(stop.is_requested());

        assert!(stop.take());
        assert!(!stop.is_requested());
        assert!(!stop.take());
    }

    #[test]
    fn request_from_another_thread() {
        let stop = Arc::new(Stop::new());

        let remote = Arc::clone(&stop);
        thread::spawn(move || remote.request()).join().unwrap();

        assert!(stop.take());
    }
}
