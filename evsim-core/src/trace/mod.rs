//! Trace sources and trace paths
//!
//! Objects expose named trace sources ([`TracedCallback`], [`TracedValue`]).
//! Observers connect [`Callback`]s to them, either directly or through a
//! path such as `/nodes/*/$Ipv4/(tx|rx)` resolved by the objects'
//! [`TraceResolver`]s. Every event carries a [`TraceContext`] telling which
//! of the matching sources emitted it.

mod callback;
mod composite;
mod context;
pub mod path;
mod resolver;
mod source;

pub use self::{
    callback::{Callback, CallbackBase},
    composite::CompositeTraceResolver,
    context::{TraceContext, TraceContextElement},
    resolver::{SourceCollection, SourceInfo, TraceResolver},
    source::{
        TracePrinter, TraceSource, TraceSourceAccessor, TraceSourceInfo, TracedCallback,
        TracedValue, make_trace_source_accessor,
    },
};

#[cfg(test)]
pub(crate) use self::context::tests::{DeviceIndex, NodeIndex};
