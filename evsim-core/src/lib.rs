/*!
# Discrete Event Simulation Kernel

The building blocks of a deterministic discrete-event simulator:

* [`Time`]: the virtual clock, in nanoseconds;
* [`SimulatorCore`]: the queue of pending events and the virtual clock,
  events at the same time run in the order they were scheduled;
* [`TypeRegistry`]: run-time type information, constructors and the
  declaration of attributes and trace sources;
* [`attribute`]: typed values settable by name, from Rust values or
  from strings;
* [`Ptr`]: counted handles to [`Object`]s that can be aggregated
  together;
* [`trace`]: trace sources connected through `/`-separated paths.

Everything in this crate is single threaded. The `evsim` crate wraps the
simulator into a per-thread singleton and adds the thread-safe real-time
insertion path, timers and the logging configuration.
*/

pub mod attribute;
pub mod defaults;
mod event;
mod object;
pub mod registry;
mod scheduler;
mod simulator;
mod time;
pub mod trace;

pub use self::{
    attribute::{AttributeList, AttributeValue},
    event::{Event, EventId, EventKey, EventStatus},
    object::{
        Object, ObjectFactory, ObjectType, Ptr, create_object, create_object_with, downcast_object,
        downcast_object_mut,
    },
    registry::{Constructor, TypeBuilder, TypeId, TypeRegistry},
    scheduler::{HeapScheduler, MapScheduler, Scheduler, SchedulerKind},
    simulator::SimulatorCore,
    time::{Time, TimeParseError},
};
