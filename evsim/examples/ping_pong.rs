use anyhow::{Result, bail};
use clap::Parser;
use evsim::{LogConfig, SchedulerKind, Simulator, Time, Timer};
use rand_chacha::ChaChaRng;
use rand_core::{Rng as _, SeedableRng as _};
use std::{cell::RefCell, rc::Rc};

/// Two peers exchanging pings over a lossy link, with a retransmission
/// timer on the sender side
#[derive(Parser)]
struct Command {
    /// number of pings to deliver
    #[arg(long, default_value = "10")]
    count: u32,

    /// one way delay of the link
    #[arg(long, default_value = "20ms")]
    delay: Time,

    /// retransmission timeout
    #[arg(long, default_value = "100ms")]
    timeout: Time,

    /// percentage of the pings lost on the way
    #[arg(long, default_value = "20")]
    loss: u64,

    /// event queue implementation: `map` or `heap`
    #[arg(long, default_value = "map")]
    scheduler: String,

    #[arg(long, default_value = "42")]
    seed: u64,
}

struct Pinger {
    link_delay: Time,
    loss: u64,
    rng: ChaChaRng,
    sequence: u32,
    remaining: u32,
    sent: u32,
    rtts: Vec<Time>,
    sent_at: Time,
    retransmit: Timer,
}

type Shared = Rc<RefCell<Pinger>>;

fn send(pinger: &Shared) {
    let mut this = pinger.borrow_mut();
    this.sent += 1;
    this.sent_at = Simulator::now();
    let sequence = this.sequence;

    let lost = this.rng.next_u64() % 100 < this.loss;
    if lost {
        log::info!("ping {sequence} lost");
    } else {
        let pinger = Rc::clone(pinger);
        Simulator::schedule(this.link_delay, move || pong(&pinger, sequence));
    }
    this.retransmit.schedule();
}

fn pong(pinger: &Shared, sequence: u32) {
    let delay = pinger.borrow().link_delay;
    let pinger = Rc::clone(pinger);
    Simulator::schedule(delay, move || receive(&pinger, sequence));
}

fn receive(pinger: &Shared, sequence: u32) {
    {
        let mut this = pinger.borrow_mut();
        if sequence != this.sequence {
            log::debug!("late pong {sequence}");
            return;
        }

        this.retransmit.cancel();
        let rtt = Simulator::now() - this.sent_at;
        this.rtts.push(rtt);
        this.sequence += 1;
        this.remaining -= 1;
        if this.remaining == 0 {
            return;
        }
    }
    send(pinger);
}

fn main() -> Result<()> {
    LogConfig::from_env()?.try_init()?;
    let cmd = Command::parse();

    let kind = match cmd.scheduler.as_str() {
        "map" => SchedulerKind::Map,
        "heap" => SchedulerKind::Heap,
        other => bail!("unknown scheduler `{other}', expecting `map' or `heap'"),
    };
    Simulator::set_scheduler(kind);

    let pinger: Shared = Rc::new(RefCell::new(Pinger {
        link_delay: cmd.delay,
        loss: cmd.loss,
        rng: ChaChaRng::seed_from_u64(cmd.seed),
        sequence: 0,
        remaining: cmd.count,
        sent: 0,
        rtts: Vec::with_capacity(cmd.count as usize),
        sent_at: Time::ZERO,
        retransmit: Timer::new(),
    }));

    {
        let mut this = pinger.borrow_mut();
        this.retransmit.set_delay(cmd.timeout);
        let weak = Rc::downgrade(&pinger);
        this.retransmit.set_function(move || {
            if let Some(pinger) = weak.upgrade() {
                log::info!("timeout at {}", Simulator::now());
                send(&pinger);
            }
        });
    }

    if cmd.count > 0 {
        send(&pinger);
    }
    Simulator::run();

    let this = pinger.borrow();
    println!(
        "delivered {} pings with {} transmissions in {}",
        this.rtts.len(),
        this.sent,
        Simulator::now()
    );
    for (sequence, rtt) in this.rtts.iter().enumerate() {
        println!("[{sequence}]: rtt {rtt}");
    }
    drop(this);

    Simulator::destroy();
    Ok(())
}
