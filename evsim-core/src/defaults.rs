use crate::scheduler::SchedulerKind;

/// Default [`SchedulerKind`]
///
/// This is the event queue used by a [`SimulatorCore`] unless another
/// one is selected.
///
/// ```
/// # use evsim_core::{defaults::*, SchedulerKind};
/// assert_eq!(DEFAULT_SCHEDULER, SchedulerKind::Map);
/// ```
///
/// [`SimulatorCore`]: crate::SimulatorCore
pub const DEFAULT_SCHEDULER: SchedulerKind = SchedulerKind::Map;

/// Smallest number of event ids an event collector inspects
/// in one cleanup pass.
pub const EVENT_COLLECTOR_CHUNK_MIN: usize = 8;

/// Largest number of event ids an event collector inspects
/// in one cleanup pass.
pub const EVENT_COLLECTOR_CHUNK_MAX: usize = 1_024;

/// Name of the root of the type hierarchy
///
/// Every type registry starts with this type registered as
/// [`TypeId::OBJECT`], its own parent.
///
/// [`TypeId::OBJECT`]: crate::TypeId::OBJECT
pub const ROOT_TYPE_NAME: &str = "Object";
