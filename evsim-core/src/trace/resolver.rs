use crate::trace::{CallbackBase, TraceContext, TracePrinter};
use std::fmt;

/// Maps trace paths to trace sources
///
/// Every operation walks the path one element at a time. A path naming
/// nothing silently resolves to no source at all.
pub trait TraceResolver {
    /// connect `callback` to every source matching `path`
    fn connect(&self, path: &str, callback: &CallbackBase, context: &TraceContext);

    /// disconnect `callback` from every source matching `path`
    fn disconnect(&self, path: &str, callback: &CallbackBase);

    /// list every source reachable from this resolver; `path` is the
    /// path leading to this resolver
    fn collect_sources(&self, path: &str, context: &TraceContext, collection: &mut SourceCollection);

    /// connect `printer` to every source reachable from this resolver
    fn trace_all(&self, printer: &TracePrinter, context: &TraceContext);
}

/// A trace source found by [`TraceResolver::collect_sources`]
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub path: String,
    pub context: TraceContext,
    pub help: String,
}

/// The trace sources of an object graph
#[derive(Debug, Clone, Default)]
pub struct SourceCollection {
    sources: Vec<SourceInfo>,
}

impl SourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// record a source, unless a source with the same path, the same help
    /// and a similar context is already known
    pub fn add_unique(&mut self, path: String, context: TraceContext, help: &str) {
        let known = self.sources.iter().any(|source| {
            source.path == path && source.help == help && source.context.is_similar(&context)
        });
        if !known {
            self.sources.push(SourceInfo {
                path,
                context,
                help: help.to_owned(),
            });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceInfo> {
        self.sources.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Display for SourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for source in &self.sources {
            writeln!(f, "source={}", source.path)?;
            writeln!(f, "TraceContextElement={}", source.context.element_names().join(" "))?;
            writeln!(f, "{}", source.help)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{DeviceIndex, NodeIndex};

    #[test]
    fn unique_sources() {
        let mut collection = SourceCollection::new();
        let mut a = TraceContext::new();
        a.add(NodeIndex(0));
        let mut b = TraceContext::new();
        b.add(NodeIndex(1));
        let mut c = TraceContext::new();
        c.add(DeviceIndex(1));

        collection.add_unique("/nodes/rx".to_owned(), a.clone(), "received");
        // same types of context elements
        collection.add_unique("/nodes/rx".to_owned(), b, "received");
        collection.add_unique("/nodes/rx".to_owned(), c, "received");
        collection.add_unique("/nodes/rx".to_owned(), a.clone(), "other help");
        collection.add_unique("/nodes/tx".to_owned(), a, "received");

        assert_eq!(collection.len(), 4);
        assert_eq!(collection.iter().filter(|s| s.path == "/nodes/rx").count(), 3);
    }

    #[test]
    fn display() {
        let mut collection = SourceCollection::new();
        let mut context = TraceContext::new();
        context.add(NodeIndex(0));
        context.add(DeviceIndex(2));
        collection.add_unique("/nodes/0/rx".to_owned(), context, "packet received");

        assert_eq!(
            collection.to_string(),
            "source=/nodes/0/rx\nTraceContextElement=NodeIndex DeviceIndex\npacket received\n\n"
        );
    }
}
