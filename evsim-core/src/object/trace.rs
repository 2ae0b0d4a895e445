use crate::{
    TypeId,
    object::{Ptr, ptr::Node},
    trace::{
        Callback, CallbackBase, CompositeTraceResolver, SourceCollection, TraceContext,
        TracePrinter, TraceResolver, path,
    },
};
use std::rc::Rc;

/// Resolves the `$TypeName` path elements of an object by looking up
/// the member of its aggregate implementing `TypeName`
struct AggregateTraceResolver {
    object: Ptr,
}

impl AggregateTraceResolver {
    fn interface(&self, path: &str) -> Option<Ptr> {
        let name = path::element(path).strip_prefix('$')?;
        let Some(tid) = self.object.registry().lookup_by_name(name) else {
            log::trace!("no type `{name}' registered");
            return None;
        };
        self.object.query_interface(tid)
    }

    /// apply `f` to every other member of the aggregate, unless a walk of
    /// this aggregate is already in progress
    fn for_each_other_member(&self, mut f: impl FnMut(&Ptr)) {
        let members = self.object.aggregate_members();
        if members.iter().any(|member| member.node().collecting.get()) {
            return;
        }

        self.object.node().collecting.set(true);
        for member in members.iter().skip(1) {
            f(member);
        }
        self.object.node().collecting.set(false);
    }
}

impl TraceResolver for AggregateTraceResolver {
    fn connect(&self, path: &str, callback: &CallbackBase, context: &TraceContext) {
        if let Some(interface) = self.interface(path) {
            interface.with_trace_resolver(|resolver| resolver.connect(path::subpath(path), callback, context));
        }
    }

    fn disconnect(&self, path: &str, callback: &CallbackBase) {
        if let Some(interface) = self.interface(path) {
            interface.with_trace_resolver(|resolver| resolver.disconnect(path::subpath(path), callback));
        }
    }

    fn collect_sources(&self, path: &str, context: &TraceContext, collection: &mut SourceCollection) {
        self.for_each_other_member(|member| {
            let registry = member.registry();
            for tid in registry.chain(member.tid()) {
                if tid == TypeId::OBJECT {
                    continue;
                }
                let path = format!("{path}/${}", registry.name(tid));
                log::trace!("collect: {path}");
                member.with_trace_resolver(|resolver| resolver.collect_sources(&path, context, collection));
            }
        });
    }

    fn trace_all(&self, printer: &TracePrinter, context: &TraceContext) {
        self.for_each_other_member(|member| {
            member.with_trace_resolver(|resolver| resolver.trace_all(printer, context));
        });
    }
}

impl<T: ?Sized> Ptr<T> {
    /// call `f` with the trace resolver of this object
    ///
    /// The resolver exposes the trace sources registered for the type of
    /// the object and its parents, the items added by
    /// [`Object::add_trace_items`] and the other members of the aggregate
    /// through `$TypeName` path elements.
    ///
    /// [`Object::add_trace_items`]: crate::Object::add_trace_items
    ///
    /// # Panics
    ///
    /// if the object is currently mutably borrowed
    pub fn with_trace_resolver<R>(&self, f: impl FnOnce(&dyn TraceResolver) -> R) -> R {
        assert!(self.check_loose());
        let node: &Rc<Node> = self.node();
        let object = node.value.borrow();

        let mut resolver = CompositeTraceResolver::new();
        for info in node.registry.trace_sources_chain(node.tid) {
            if let Some(source) = info.accessor.source(&**object) {
                resolver.add_source(&info.name, &info.help, source);
            }
        }
        object.add_trace_items(&mut resolver);
        resolver.set_parent(Box::new(AggregateTraceResolver {
            object: self.as_object(),
        }));

        f(&resolver)
    }

    /// connect `callback` to every trace source matching `path`
    pub fn trace_connect<A: 'static>(&self, path: &str, callback: &Callback<A>) {
        let callback = callback.base();
        self.with_trace_resolver(|resolver| resolver.connect(path, &callback, &TraceContext::new()));
    }

    pub fn trace_disconnect<A: 'static>(&self, path: &str, callback: &Callback<A>) {
        let callback = callback.base();
        self.with_trace_resolver(|resolver| resolver.disconnect(path, &callback));
    }

    /// connect `callback` to the registered trace source `name` of this
    /// object
    ///
    /// returns false if there is no such trace source or if it emits
    /// another type of arguments.
    pub fn trace_source_connect<A: 'static>(&self, name: &str, callback: &Callback<A>) -> bool {
        let Some(info) = self.registry().lookup_trace_source_by_name(self.tid(), name) else {
            return false;
        };
        let object = self.node().value.borrow();
        info.accessor
            .source(&**object)
            .is_some_and(|source| source.add_callback(&callback.base(), &TraceContext::new()))
    }

    pub fn trace_source_disconnect<A: 'static>(&self, name: &str, callback: &Callback<A>) -> bool {
        let Some(info) = self.registry().lookup_trace_source_by_name(self.tid(), name) else {
            return false;
        };
        let object = self.node().value.borrow();
        info.accessor
            .source(&**object)
            .is_some_and(|source| source.remove_callback(&callback.base()))
    }

    /// every trace source reachable from this object
    pub fn collect_sources(&self) -> SourceCollection {
        let mut collection = SourceCollection::new();
        self.with_trace_resolver(|resolver| resolver.collect_sources("", &TraceContext::new(), &mut collection));
        collection
    }

    /// connect `printer` to every trace source reachable from this object
    pub fn trace_all(&self, printer: &TracePrinter) {
        self.with_trace_resolver(|resolver| resolver.trace_all(printer, &TraceContext::new()));
    }
}
