use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use evsim::{LogConfig, Simulator, Time};
use std::{
    cell::Cell,
    rc::Rc,
    sync::mpsc::{Receiver, channel},
    thread,
    time::{Duration, Instant},
};

/// Worker threads feeding jobs into the simulation while it runs
#[derive(Parser)]
struct Command {
    #[arg(long, default_value = "4")]
    workers: u32,

    /// jobs sent by every worker
    #[arg(long, default_value = "1000")]
    jobs: u32,

    /// virtual time simulated between two checks of the inbox
    #[arg(long, default_value = "1ms")]
    tick: Time,
}

fn main() -> Result<()> {
    LogConfig::from_env()?.try_init()?;
    let cmd = Command::parse();

    let handle = Simulator::realtime_handle();
    let expected = u64::from(cmd.workers) * u64::from(cmd.jobs);
    let (report, reports) = channel::<(u32, Time)>();

    let workers: Vec<_> = (0..cmd.workers)
        .map(|worker| {
            let handle = handle.clone();
            let report = report.clone();
            thread::spawn(move || -> Result<()> {
                for _ in 0..cmd.jobs {
                    let report = report.clone();
                    handle.schedule_now(move || {
                        let _ = report.send((worker, Simulator::now()));
                    })?;
                }
                Ok(())
            })
        })
        .collect();
    drop(report);

    // keep the simulation busy with a periodic event until every job ran
    let done = Rc::new(Cell::new(0u64));
    let started = Instant::now();
    tick(cmd.tick, Rc::clone(&done), expected, reports);
    Simulator::run();

    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))?
            .context("worker failed to send its jobs")?;
    }

    println!(
        "{} jobs ran over {} of virtual time ({:?} of wall clock time)",
        done.get(),
        Simulator::now(),
        started.elapsed()
    );

    Simulator::destroy();
    Ok(())
}

fn tick(
    period: Time,
    done: Rc<Cell<u64>>,
    expected: u64,
    reports: Receiver<(u32, Time)>,
) {
    while let Ok((worker, at)) = reports.try_recv() {
        log::debug!("job of worker {worker} ran at {at}");
        done.set(done.get() + 1);
    }

    if done.get() < expected {
        thread::sleep(Duration::from_micros(100));
        Simulator::schedule(period, move || tick(period, done, expected, reports));
    }
}
