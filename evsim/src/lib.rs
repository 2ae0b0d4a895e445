/*!
# evsim

A deterministic discrete-event simulator. Events are closures scheduled
on a virtual clock; they run one after the other, in time order and, for
events at the same time, in the order they were scheduled.

This crate wraps [`evsim_core`] into a per-thread [`Simulator`]
singleton and adds:

* [`RealtimeHandle`]: insert events from other threads;
* [`Timer`] and [`EventCollector`]: manage the lifetime of events;
* [`LogConfig`]: configure the logging with the `NS_LOG` variable.

```
use evsim::{Simulator, Time};
use std::{cell::RefCell, rc::Rc};

let log = Rc::new(RefCell::new(Vec::new()));
for (delay, name) in [(5, "a"), (3, "b"), (3, "c"), (7, "d")] {
    let log = Rc::clone(&log);
    Simulator::schedule(Time::from_secs(delay), move || log.borrow_mut().push(name));
}

Simulator::run();
assert_eq!(*log.borrow(), ["b", "c", "a", "d"]);
assert_eq!(Simulator::now(), Time::from_secs(7));
Simulator::destroy();
```
*/

mod event_collector;
pub mod log_config;
pub mod realtime;
mod simulator;
mod timer;

pub use evsim_core::{
    self, AttributeList, AttributeValue, EventId, EventStatus, Object, ObjectFactory, ObjectType,
    Ptr, SchedulerKind, Time, TimeParseError, TypeId, TypeRegistry, attribute, create_object,
    create_object_with, downcast_object, downcast_object_mut, trace,
};

pub use self::{
    event_collector::EventCollector,
    log_config::{LevelFilter, LogConfig, LogConfigError},
    realtime::RealtimeHandle,
    simulator::Simulator,
    timer::{DestroyPolicy, Timer},
};
