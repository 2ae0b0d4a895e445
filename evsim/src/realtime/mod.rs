/*!
Thread-safe insertion of events

The simulator itself is single threaded. Other threads hold a
[`RealtimeHandle`] to hand jobs over to it: the jobs go through a bounded
channel and the dispatch loop moves them into the event queue, at the
current virtual time, before it runs the next event.
*/

mod command;
mod stop;

use self::{
    command::{Command, CommandReceiver, CommandSender, command_channel},
    stop::Stop,
};
use anyhow::Result;
use evsim_core::SimulatorCore;
use std::{fmt, sync::Arc};

/// Handle to insert events into a simulator from any thread
///
/// ```
/// use evsim::Simulator;
/// use std::sync::mpsc::channel;
///
/// let handle = Simulator::realtime_handle();
/// let (sender, receiver) = channel();
///
/// std::thread::spawn(move || {
///     handle
///         .schedule_now(move || sender.send("hello").unwrap())
///         .unwrap();
/// })
/// .join()
/// .unwrap();
///
/// Simulator::run();
/// assert_eq!(receiver.try_recv(), Ok("hello"));
/// # Simulator::destroy();
/// ```
#[derive(Clone)]
pub struct RealtimeHandle {
    commands: CommandSender,
    stop: Arc<Stop>,
}

impl RealtimeHandle {
    /// schedule `f` to run at the simulator's current time
    ///
    /// Jobs sent from the same thread run in the order they were sent.
    /// This fails if the simulator the handle belongs to was destroyed.
    pub fn schedule_now<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.commands.send_job(Box::new(f))
    }

    /// ask the simulator to stop before its next event
    pub fn stop(&self) {
        self.stop.request()
    }
}

impl fmt::Debug for RealtimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeHandle")
            .field("stop_requested", &self.stop.is_requested())
            .finish_non_exhaustive()
    }
}

/// receiving side, owned by the simulation thread
pub(crate) struct Inbox {
    commands: CommandSender,
    receiver: CommandReceiver,
    stop: Arc<Stop>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        let (commands, receiver) = command_channel();
        Self {
            commands,
            receiver,
            stop: Arc::new(Stop::new()),
        }
    }

    pub(crate) fn handle(&self) -> RealtimeHandle {
        RealtimeHandle {
            commands: self.commands.clone(),
            stop: Arc::clone(&self.stop),
        }
    }

    /// move every received job into the event queue
    ///
    /// returns `true` if a stop was requested since the last call
    pub(crate) fn drain(&self, core: &mut SimulatorCore) -> bool {
        let mut received = 0;
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                Command::Schedule(job) => {
                    core.schedule_now_boxed(job);
                    received += 1;
                }
            }
        }
        if received > 0 {
            log::debug!(
                target: "evsim::realtime",
                "inserted {received} job(s) at {now}",
                now = core.now()
            );
        }

        self.stop.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evsim_core::Time;
    use std::sync::{Arc, Mutex};

    fn run(core: &mut SimulatorCore) {
        core.begin_run();
        while let Some(event) = core.next_event() {
            event.invoke();
        }
    }

    #[test]
    fn jobs_are_inserted_at_current_time() {
        let inbox = Inbox::new();
        let handle = inbox.handle();
        let mut core = SimulatorCore::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        core.schedule(Time::from_secs(2), || ());
        run(&mut core);

        let l = Arc::clone(&log);
        std::thread::spawn(move || {
            for i in 0..4 {
                let l = Arc::clone(&l);
                handle.schedule_now(move || l.lock().unwrap().push(i)).unwrap();
            }
        })
        .join()
        .unwrap();

        assert!(!inbox.drain(&mut core));
        assert_eq!(core.pending_events(), 4);
        assert_eq!(core.next(), Some(Time::from_secs(2)));

        run(&mut core);
        assert_eq!(*log.lock().unwrap(), [0, 1, 2, 3]);
        assert_eq!(core.now(), Time::from_secs(2));
    }

    #[test]
    fn stop_request() {
        let inbox = Inbox::new();
        let mut core = SimulatorCore::new();

        inbox.handle().stop();
        assert!(inbox.drain(&mut core));
        assert!(!inbox.drain(&mut core));
    }

    #[test]
    fn handle_outlives_inbox() {
        let inbox = Inbox::new();
        let handle = inbox.handle();
        drop(inbox);

        assert!(handle.schedule_now(|| ()).is_err());
    }
}
