use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use evsim_core::{SchedulerKind, SimulatorCore, Time};
use rand_chacha::ChaChaRng;
use rand_core::{Rng as _, SeedableRng as _};

const EVENTS: usize = 10_000;
const KINDS: [(SchedulerKind, &str); 2] = [(SchedulerKind::Map, "map"), (SchedulerKind::Heap, "heap")];

fn delays() -> Vec<Time> {
    let mut rng = ChaChaRng::seed_from_u64(42);
    (0..EVENTS)
        .map(|_| Time::from_micros(rng.next_u64() % 1_000_000))
        .collect()
}

fn drain(core: &mut SimulatorCore) {
    core.begin_run();
    while let Some(event) = core.next_event() {
        event.invoke();
    }
}

fn schedule_and_run(c: &mut Criterion) {
    let delays = delays();
    let mut group = c.benchmark_group("schedule_and_run");

    for (kind, name) in KINDS {
        group.bench_with_input(BenchmarkId::from_parameter(name), &delays, |b, delays| {
            b.iter(|| {
                let mut core = SimulatorCore::with_kind(kind);
                for delay in delays {
                    core.schedule(*delay, || {});
                }
                drain(&mut core);
                black_box(core.now())
            })
        });
    }
    group.finish();
}

fn cancel_half(c: &mut Criterion) {
    let delays = delays();
    let mut group = c.benchmark_group("cancel_half");

    for (kind, name) in KINDS {
        group.bench_with_input(BenchmarkId::from_parameter(name), &delays, |b, delays| {
            b.iter(|| {
                let mut core = SimulatorCore::with_kind(kind);
                let ids: Vec<_> = delays.iter().map(|delay| core.schedule(*delay, || {})).collect();
                for id in ids.iter().step_by(2) {
                    core.cancel(id);
                }
                drain(&mut core);
                black_box(core.now())
            })
        });
    }
    group.finish();
}

fn remove_tenth(c: &mut Criterion) {
    let delays = delays();
    let mut group = c.benchmark_group("remove_tenth");

    for (kind, name) in KINDS {
        group.bench_with_input(BenchmarkId::from_parameter(name), &delays, |b, delays| {
            b.iter(|| {
                let mut core = SimulatorCore::with_kind(kind);
                let ids: Vec<_> = delays.iter().map(|delay| core.schedule(*delay, || {})).collect();
                for id in ids.iter().step_by(10) {
                    black_box(core.remove(id));
                }
                drain(&mut core);
                black_box(core.now())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, schedule_and_run, cancel_half, remove_tenth);
criterion_main!(benches);
