use crate::{
    object::Ptr,
    trace::{
        CallbackBase, SourceCollection, TraceContext, TraceContextElement, TracePrinter,
        TraceResolver, TraceSource,
        path::{self, PathElement},
    },
};

type Maker<'a> = Box<dyn Fn() -> Box<dyn TraceResolver + 'a> + 'a>;

enum ItemKind<'a> {
    Source {
        source: &'a dyn TraceSource,
        help: String,
    },
    /// the trace resolver of another object
    Child(Ptr),
    Nested(CompositeTraceResolver<'a>),
    Maker(Maker<'a>),
}

struct Item<'a> {
    name: String,
    context: TraceContext,
    kind: ItemKind<'a>,
}

impl Item<'_> {
    fn with_resolver(&self, f: impl FnOnce(&dyn TraceResolver)) {
        match &self.kind {
            ItemKind::Source { .. } => {}
            ItemKind::Child(child) => child.with_trace_resolver(f),
            ItemKind::Nested(resolver) => f(resolver),
            ItemKind::Maker(maker) => f(&*maker()),
        }
    }

    fn connect(&self, subpath: &str, callback: &CallbackBase, context: &TraceContext) {
        match &self.kind {
            ItemKind::Source { source, .. } => {
                if subpath.is_empty() && !source.add_callback(callback, context) {
                    log::debug!("trace source `{}' refused a callback of another type", self.name);
                }
            }
            _ => self.with_resolver(|resolver| resolver.connect(subpath, callback, context)),
        }
    }

    fn disconnect(&self, subpath: &str, callback: &CallbackBase) {
        match &self.kind {
            ItemKind::Source { source, .. } => {
                if subpath.is_empty() {
                    source.remove_callback(callback);
                }
            }
            _ => self.with_resolver(|resolver| resolver.disconnect(subpath, callback)),
        }
    }

    fn collect_sources(&self, path: &str, context: &TraceContext, collection: &mut SourceCollection) {
        let path = format!("{path}/{}", self.name);
        let mut context = context.clone();
        context.union(&self.context);

        match &self.kind {
            ItemKind::Source { help, .. } => collection.add_unique(path, context, help),
            _ => self.with_resolver(|resolver| resolver.collect_sources(&path, &context, collection)),
        }
    }

    fn trace_all(&self, printer: &TracePrinter, context: &TraceContext) {
        let mut context = context.clone();
        context.union(&self.context);

        match &self.kind {
            ItemKind::Source { source, .. } => source.connect_printer(printer, &context),
            _ => self.with_resolver(|resolver| resolver.trace_all(printer, &context)),
        }
    }
}

enum Operation<'o> {
    Connect {
        callback: &'o CallbackBase,
        context: &'o TraceContext,
    },
    Disconnect {
        callback: &'o CallbackBase,
    },
}

impl Operation<'_> {
    fn apply(&self, subpath: &str, item: &Item<'_>) {
        match *self {
            Self::Connect { callback, context } => {
                log::trace!("connect to path={subpath} name={}", item.name);
                let mut context = context.clone();
                context.union(&item.context);
                item.connect(subpath, callback, &context);
            }
            Self::Disconnect { callback } => {
                log::trace!("disconnect from path={subpath} name={}", item.name);
                item.disconnect(subpath, callback);
            }
        }
    }

    fn apply_parent(&self, path: &str, parent: Option<&dyn TraceResolver>) {
        let Some(parent) = parent else {
            return;
        };
        match *self {
            Self::Connect { callback, context } => parent.connect(path, callback, context),
            Self::Disconnect { callback } => parent.disconnect(path, callback),
        }
    }
}

/// A trace resolver made of named items
///
/// Items are trace sources, the resolvers of child objects or nested
/// resolvers. Each path element selects items by name:
///
/// * `*` selects every item,
/// * `name` selects the first item called `name`,
/// * `(a|b)` selects the first item called `a` and the first one called `b`.
///
/// The rest of the path is then resolved by the selected items. In every
/// case the parent resolver, if any, also resolves the whole path.
///
/// ```
/// # use evsim_core::trace::{Callback, CompositeTraceResolver, TraceContext, TraceResolver, TracedCallback};
/// # use std::{cell::Cell, rc::Rc};
/// let tx = TracedCallback::<u32>::new();
/// let rx = TracedCallback::<u32>::new();
///
/// let mut resolver = CompositeTraceResolver::new();
/// resolver.add_source("tx", "packet sent", &tx);
/// resolver.add_source("rx", "packet received", &rx);
///
/// let count = Rc::new(Cell::new(0));
/// let callback = Callback::new({
///     let count = Rc::clone(&count);
///     move |_: &TraceContext, _: &u32| count.set(count.get() + 1)
/// });
/// resolver.connect("/(tx|rx)", &callback.base(), &TraceContext::new());
///
/// tx.fire(&1);
/// rx.fire(&2);
/// assert_eq!(count.get(), 2);
/// ```
#[derive(Default)]
pub struct CompositeTraceResolver<'a> {
    items: Vec<Item<'a>>,
    parent: Option<Box<dyn TraceResolver + 'a>>,
}

impl<'a> CompositeTraceResolver<'a> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            parent: None,
        }
    }

    fn add_item(&mut self, name: &str, context: TraceContext, kind: ItemKind<'a>) {
        self.items.push(Item {
            name: name.to_owned(),
            context,
            kind,
        });
    }

    pub fn add_source(&mut self, name: &str, help: &str, source: &'a dyn TraceSource) {
        self.add_item(
            name,
            TraceContext::new(),
            ItemKind::Source {
                source,
                help: help.to_owned(),
            },
        );
    }

    /// add a source whose events carry `element`
    pub fn add_source_with_context<E: TraceContextElement>(
        &mut self,
        name: &str,
        help: &str,
        source: &'a dyn TraceSource,
        element: E,
    ) {
        let mut context = TraceContext::new();
        context.add(element);
        self.add_item(
            name,
            context,
            ItemKind::Source {
                source,
                help: help.to_owned(),
            },
        );
    }

    /// add the trace sources of another object under `name`
    pub fn add_child<T: ?Sized>(&mut self, name: &str, child: &Ptr<T>) {
        self.add_item(name, TraceContext::new(), ItemKind::Child(child.as_object()));
    }

    pub fn add_child_with_context<T: ?Sized, E: TraceContextElement>(
        &mut self,
        name: &str,
        child: &Ptr<T>,
        element: E,
    ) {
        let mut context = TraceContext::new();
        context.add(element);
        self.add_item(name, context, ItemKind::Child(child.as_object()));
    }

    /// add a resolver built by `maker` every time the item is resolved
    pub fn add_resolver(&mut self, name: &str, maker: impl Fn() -> Box<dyn TraceResolver + 'a> + 'a) {
        self.add_item(name, TraceContext::new(), ItemKind::Maker(Box::new(maker)));
    }

    /// add the objects of a collection under `name`, each one named
    /// after its position: `name/0`, `name/1`...
    ///
    /// the events of the object at position `i` carry `element(i)`.
    pub fn add_array<T: ?Sized, E: TraceContextElement>(
        &mut self,
        name: &str,
        objects: impl IntoIterator<Item = Ptr<T>>,
        element: impl Fn(usize) -> E,
    ) {
        let mut array = CompositeTraceResolver::new();
        for (index, object) in objects.into_iter().enumerate() {
            array.add_child_with_context(&index.to_string(), &object, element(index));
        }
        self.add_item(name, TraceContext::new(), ItemKind::Nested(array));
    }

    /// the resolver consulted after this one for every path
    pub fn set_parent(&mut self, parent: Box<dyn TraceResolver + 'a>) {
        self.parent = Some(parent);
    }

    fn find(&self, name: &str) -> Option<&Item<'a>> {
        self.items.iter().find(|item| item.name == name)
    }

    fn recursive_operation(&self, path: &str, operation: &Operation<'_>) {
        if path.is_empty() {
            return;
        }
        let subpath = path::subpath(path);

        match PathElement::parse(path::element(path)) {
            PathElement::Wildcard => {
                for item in &self.items {
                    operation.apply(subpath, item);
                }
            }
            PathElement::Name(name) => {
                if let Some(item) = self.find(name) {
                    operation.apply(subpath, item);
                }
            }
            PathElement::Alternatives(names) => {
                for name in names {
                    if let Some(item) = self.find(name) {
                        operation.apply(subpath, item);
                    }
                }
            }
        }

        operation.apply_parent(path, self.parent.as_deref());
    }
}

impl TraceResolver for CompositeTraceResolver<'_> {
    fn connect(&self, path: &str, callback: &CallbackBase, context: &TraceContext) {
        log::trace!("connect path={path}");
        self.recursive_operation(path, &Operation::Connect { callback, context });
    }

    fn disconnect(&self, path: &str, callback: &CallbackBase) {
        log::trace!("disconnect path={path}");
        self.recursive_operation(path, &Operation::Disconnect { callback });
    }

    fn collect_sources(&self, path: &str, context: &TraceContext, collection: &mut SourceCollection) {
        for item in &self.items {
            log::trace!("collect {}", item.name);
            item.collect_sources(path, context, collection);
        }
        if let Some(parent) = self.parent.as_deref() {
            parent.collect_sources(path, context, collection);
        }
    }

    fn trace_all(&self, printer: &TracePrinter, context: &TraceContext) {
        for item in &self.items {
            item.trace_all(printer, context);
        }
        if let Some(parent) = self.parent.as_deref() {
            parent.trace_all(printer, context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Callback, TracedCallback};
    use std::{cell::RefCell, fmt, rc::Rc};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Source {
        DoubleA,
        DoubleB,
    }

    impl fmt::Display for Source {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::DoubleA => f.write_str("tracesource=doubleA"),
                Self::DoubleB => f.write_str("tracesource=doubleB"),
            }
        }
    }

    impl TraceContextElement for Source {
        fn name() -> &'static str {
            "TraceSourceTest"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct SubSource;

    impl fmt::Display for SubSource {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("subtracesource=int")
        }
    }

    impl TraceContextElement for SubSource {
        fn name() -> &'static str {
            "SubTraceSourceTest"
        }
    }

    type Received = Rc<RefCell<Vec<Source>>>;

    fn double_sink() -> (Received, Callback<f64>) {
        let received = Received::default();
        let callback = Callback::new({
            let received = Rc::clone(&received);
            move |context: &TraceContext, _: &f64| {
                let source = context
                    .get::<Source>()
                    .expect("every double source carries its name");
                received.borrow_mut().push(source);
            }
        });
        (received, callback)
    }

    fn fire(a: &TracedCallback<f64>, b: &TracedCallback<f64>, received: &Received) -> Vec<Source> {
        received.borrow_mut().clear();
        a.fire(&0.0);
        b.fire(&0.0);
        received.borrow().clone()
    }

    #[test]
    fn path_selection() {
        let double_a = TracedCallback::<f64>::new();
        let double_b = TracedCallback::<f64>::new();
        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source_with_context("trace-double-a", "test source", &double_a, Source::DoubleA);
        resolver.add_source_with_context("trace-double-b", "test source", &double_b, Source::DoubleB);

        let (received, sink) = double_sink();
        let sink = sink.base();
        let root = TraceContext::new();

        resolver.connect("/*", &sink, &root);
        assert_eq!(fire(&double_a, &double_b, &received), [Source::DoubleA, Source::DoubleB]);
        resolver.disconnect("/*", &sink);
        assert!(fire(&double_a, &double_b, &received).is_empty());

        resolver.connect("/trace-double-a", &sink, &root);
        assert_eq!(fire(&double_a, &double_b, &received), [Source::DoubleA]);
        resolver.disconnect("/trace-double-a", &sink);

        resolver.connect("/(trace-double-a)", &sink, &root);
        assert_eq!(fire(&double_a, &double_b, &received), [Source::DoubleA]);
        resolver.disconnect("/trace-double-a", &sink);

        resolver.connect("/(trace-double-a|trace-double-b)", &sink, &root);
        assert_eq!(fire(&double_a, &double_b, &received), [Source::DoubleA, Source::DoubleB]);
        // each alternative is connected on its own
        resolver.disconnect("/trace-double-a", &sink);
        assert_eq!(fire(&double_a, &double_b, &received), [Source::DoubleB]);
        resolver.disconnect("/(trace-double-a|trace-double-b)", &sink);
        assert!(fire(&double_a, &double_b, &received).is_empty());
    }

    #[test]
    fn unknown_names_are_ignored() {
        let double_a = TracedCallback::<f64>::new();
        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source("x", "", &double_a);

        let (_, sink) = double_sink();
        resolver.connect("/y", &sink.base(), &TraceContext::new());
        resolver.connect("/(y|z)", &sink.base(), &TraceContext::new());
        resolver.connect("/x/deeper", &sink.base(), &TraceContext::new());
        resolver.connect("", &sink.base(), &TraceContext::new());

        assert!(double_a.is_empty());
    }

    #[test]
    fn first_match_only() {
        let first = TracedCallback::<f64>::new();
        let second = TracedCallback::<f64>::new();
        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source("x", "", &first);
        resolver.add_source("x", "", &second);

        let (_, sink) = double_sink();
        resolver.connect("/x", &sink.base(), &TraceContext::new());
        assert_eq!((first.len(), second.len()), (1, 0));

        resolver.connect("/*", &sink.base(), &TraceContext::new());
        assert_eq!((first.len(), second.len()), (2, 1));
    }

    #[test]
    fn nested_resolvers() {
        let trace_int = TracedCallback::<i32>::new();
        let got = Rc::new(RefCell::new(Vec::new()));
        let sink = Callback::new({
            let got = Rc::clone(&got);
            move |context: &TraceContext, value: &i32| got.borrow_mut().push((context.to_string(), *value))
        });
        let sink = sink.base();

        let mut resolver = CompositeTraceResolver::new();
        resolver.add_resolver("subresolver", || {
            let mut sub = CompositeTraceResolver::new();
            sub.add_source_with_context("trace-int", "test source", &trace_int, SubSource);
            Box::new(sub)
        });

        resolver.connect("/subresolver/trace-int", &sink, &TraceContext::new());
        trace_int.fire(&1);
        resolver.disconnect("/subresolver/trace-int", &sink);
        trace_int.fire(&2);

        resolver.connect("/*/trace-int", &sink, &TraceContext::new());
        trace_int.fire(&3);
        resolver.disconnect("/subresolver/trace-int", &sink);
        trace_int.fire(&4);

        assert_eq!(
            *got.borrow(),
            [("subtracesource=int".to_owned(), 1), ("subtracesource=int".to_owned(), 3)]
        );
    }

    #[test]
    fn parent_resolves_the_whole_path() {
        let local = TracedCallback::<f64>::new();
        let inherited = TracedCallback::<f64>::new();

        let mut parent = CompositeTraceResolver::new();
        parent.add_source("x", "", &inherited);
        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source("x", "", &local);
        resolver.set_parent(Box::new(parent));

        let (_, sink) = double_sink();
        resolver.connect("/x", &sink.base(), &TraceContext::new());
        assert_eq!((local.len(), inherited.len()), (1, 1));

        resolver.disconnect("/*", &sink.base());
        assert_eq!((local.len(), inherited.len()), (0, 0));
    }

    #[test]
    fn connect_context_wins_over_item_context() {
        let double_a = TracedCallback::<f64>::new();
        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source_with_context("a", "", &double_a, Source::DoubleA);

        let (received, sink) = double_sink();
        let mut context = TraceContext::new();
        context.add(Source::DoubleB);
        resolver.connect("/a", &sink.base(), &context);

        double_a.fire(&1.0);
        assert_eq!(*received.borrow(), [Source::DoubleB]);
    }

    #[test]
    fn collect_and_trace_all() {
        let double_a = TracedCallback::<f64>::new();
        let trace_int = TracedCallback::<i32>::new();

        let mut resolver = CompositeTraceResolver::new();
        resolver.add_source_with_context("trace-double-a", "double help", &double_a, Source::DoubleA);
        resolver.add_resolver("subresolver", || {
            let mut sub = CompositeTraceResolver::new();
            sub.add_source_with_context("trace-int", "int help", &trace_int, SubSource);
            Box::new(sub)
        });

        let mut collection = SourceCollection::new();
        resolver.collect_sources("", &TraceContext::new(), &mut collection);
        let paths: Vec<_> = collection.iter().map(|source| source.path.as_str()).collect();
        assert_eq!(paths, ["/trace-double-a", "/subresolver/trace-int"]);
        assert_eq!(
            collection.iter().map(|source| source.help.as_str()).collect::<Vec<_>>(),
            ["double help", "int help"]
        );

        let lines = Rc::new(RefCell::new(Vec::new()));
        let printer: TracePrinter = Rc::new({
            let lines = Rc::clone(&lines);
            move |context: &TraceContext, text: &str| lines.borrow_mut().push(format!("{context} {text}"))
        });
        resolver.trace_all(&printer, &TraceContext::new());
        double_a.fire(&0.5);
        trace_int.fire(&7);

        assert_eq!(*lines.borrow(), ["tracesource=doubleA 0.5", "subtracesource=int 7"]);
    }
}
