use anyhow::{Result, anyhow};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError, sync_channel};

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) enum Command {
    /// run the job at the current virtual time
    Schedule(Job),
}

pub(crate) struct CommandSender(SyncSender<Command>);

pub(crate) struct CommandReceiver(Receiver<Command>);

pub(crate) fn command_channel() -> (CommandSender, CommandReceiver) {
    let (sender, receiver) = sync_channel(1_024 * 1_024);

    (CommandSender(sender), CommandReceiver(receiver))
}

impl CommandSender {
    pub(crate) fn send(&self, command: Command) -> Result<(), TrySendError<Command>> {
        self.0.try_send(command)
    }

    pub(crate) fn send_job(&self, job: Job) -> Result<()> {
        self.send(Command::Schedule(job)).map_err(|error| match error {
            TrySendError::Full(_) => anyhow!("Failed to send job: the real-time queue is full"),
            TrySendError::Disconnected(_) => {
                anyhow!("Failed to send job: the simulator was destroyed")
            }
        })
    }
}

impl Clone for CommandSender {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl CommandReceiver {
    pub(crate) fn try_recv(&self) -> Result<Command, TryRecvError> {
        self.0.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn jobs_arrive_in_order() {
        let (sender, receiver) = command_channel();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            sender
                .send_job(Box::new(move || log.lock().unwrap().push(i)))
                .unwrap();
        }

        while let Ok(Command::Schedule(job)) = receiver.try_recv() {
            job();
        }
        assert_eq!(*log.lock().unwrap(), [0, 1, 2]);
    }

    #[test]
    fn disconnected() {
        let (sender, receiver) = command_channel();
        drop(receiver);

        let error = sender.send_job(Box::new(|| ())).unwrap_err();
        assert!(error.to_string().contains("destroyed"));
    }
}
