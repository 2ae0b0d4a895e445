use crate::{
    TypeId,
    object::{Object, downcast_object},
    trace::{Callback, CallbackBase, TraceContext},
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Prints the events of any trace source in textual form
pub type TracePrinter = Rc<dyn Fn(&TraceContext, &str)>;

/// Something that emits trace events
///
/// Callbacks are received type-erased: a source only accepts the
/// callbacks taking the type of arguments it emits.
pub trait TraceSource {
    /// connect `callback`, returns false if it takes the wrong arguments
    fn add_callback(&self, callback: &CallbackBase, context: &TraceContext) -> bool;

    /// disconnect every connection of `callback`, returns false if it
    /// takes the wrong arguments
    fn remove_callback(&self, callback: &CallbackBase) -> bool;

    /// connect a printer receiving the events in their debug form
    fn connect_printer(&self, printer: &TracePrinter, context: &TraceContext);
}

enum Sink<A: 'static> {
    Callback(Callback<A>),
    Printer(TracePrinter),
}

struct Connection<A: 'static> {
    sink: Sink<A>,
    context: TraceContext,
}

/// A trace source emitting values of type `A`
///
/// ```
/// # use evsim_core::trace::{Callback, TraceContext, TracedCallback};
/// # use std::{cell::Cell, rc::Rc};
/// let source = TracedCallback::<u32>::new();
/// let total = Rc::new(Cell::new(0));
///
/// let callback = Callback::new({
///     let total = Rc::clone(&total);
///     move |_: &TraceContext, size: &u32| total.set(total.get() + size)
/// });
/// source.connect(&callback, &TraceContext::new());
///
/// source.fire(&10);
/// source.fire(&5);
/// assert_eq!(total.get(), 15);
/// ```
pub struct TracedCallback<A: 'static> {
    connections: RefCell<Vec<Rc<Connection<A>>>>,
}

impl<A: fmt::Debug + 'static> TracedCallback<A> {
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(Vec::new()),
        }
    }

    /// number of connected callbacks and printers
    pub fn len(&self) -> usize {
        self.connections.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.borrow().is_empty()
    }

    /// connect `callback`; it receives `context` with every event
    ///
    /// connecting the same callback twice calls it twice per event.
    pub fn connect(&self, callback: &Callback<A>, context: &TraceContext) {
        self.connections.borrow_mut().push(Rc::new(Connection {
            sink: Sink::Callback(callback.clone()),
            context: context.clone(),
        }));
    }

    /// remove every connection of `callback`
    pub fn disconnect(&self, callback: &Callback<A>) {
        self.connections.borrow_mut().retain(|connection| match &connection.sink {
            Sink::Callback(connected) => !connected.ptr_eq(callback),
            Sink::Printer(_) => true,
        });
    }

    /// call every connected sink with `args`
    ///
    /// sinks connected or disconnected while firing take effect on the
    /// next event.
    pub fn fire(&self, args: &A) {
        let connections = self.connections.borrow().clone();
        for connection in connections {
            match &connection.sink {
                Sink::Callback(callback) => callback.call(&connection.context, args),
                Sink::Printer(printer) => printer(&connection.context, &format!("{args:?}")),
            }
        }
    }
}

impl<A: fmt::Debug + 'static> Default for TracedCallback<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: fmt::Debug + 'static> TraceSource for TracedCallback<A> {
    fn add_callback(&self, callback: &CallbackBase, context: &TraceContext) -> bool {
        match callback.downcast::<A>() {
            Some(callback) => {
                self.connect(&callback, context);
                true
            }
            None => false,
        }
    }

    fn remove_callback(&self, callback: &CallbackBase) -> bool {
        match callback.downcast::<A>() {
            Some(callback) => {
                self.disconnect(&callback);
                true
            }
            None => false,
        }
    }

    fn connect_printer(&self, printer: &TracePrinter, context: &TraceContext) {
        self.connections.borrow_mut().push(Rc::new(Connection {
            sink: Sink::Printer(Rc::clone(printer)),
            context: context.clone(),
        }));
    }
}

impl<A: 'static> fmt::Debug for TracedCallback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedCallback")
            .field("connections", &self.connections.borrow().len())
            .finish()
    }
}

/// A value that traces its changes
///
/// Every assignment of a different value emits the pair `(old, new)`.
pub struct TracedValue<T: 'static> {
    value: Cell<T>,
    changes: TracedCallback<(T, T)>,
}

impl<T: Copy + PartialEq + fmt::Debug + 'static> TracedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Cell::new(value),
            changes: TracedCallback::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn set(&self, value: T) {
        let old = self.value.replace(value);
        if old != value {
            self.changes.fire(&(old, value));
        }
    }

    pub fn connect(&self, callback: &Callback<(T, T)>, context: &TraceContext) {
        self.changes.connect(callback, context)
    }

    pub fn disconnect(&self, callback: &Callback<(T, T)>) {
        self.changes.disconnect(callback)
    }
}

impl<T: Copy + PartialEq + fmt::Debug + Default + 'static> Default for TracedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy + PartialEq + fmt::Debug + 'static> TraceSource for TracedValue<T> {
    fn add_callback(&self, callback: &CallbackBase, context: &TraceContext) -> bool {
        self.changes.add_callback(callback, context)
    }

    fn remove_callback(&self, callback: &CallbackBase) -> bool {
        self.changes.remove_callback(callback)
    }

    fn connect_printer(&self, printer: &TracePrinter, context: &TraceContext) {
        self.changes.connect_printer(printer, context)
    }
}

impl<T: Copy + fmt::Debug + 'static> fmt::Debug for TracedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TracedValue({:?})", self.value.get())
    }
}

/// Finds a trace source inside an object
pub trait TraceSourceAccessor {
    /// the trace source of `object`, `None` if `object` is not of the
    /// expected type
    fn source<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn TraceSource>;
}

struct FnTraceSourceAccessor<T> {
    get: fn(&T) -> &dyn TraceSource,
}

impl<T: Object> TraceSourceAccessor for FnTraceSourceAccessor<T> {
    fn source<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn TraceSource> {
        downcast_object::<T>(object).map(self.get)
    }
}

/// accessor of the trace source returned by `get`
///
/// ```
/// # use evsim_core::{trace::{make_trace_source_accessor, TracedCallback}, Object};
/// #[derive(Default)]
/// struct Device {
///     rx: TracedCallback<u32>,
/// }
/// impl Object for Device {}
///
/// let accessor = make_trace_source_accessor::<Device>(|device| &device.rx);
/// ```
pub fn make_trace_source_accessor<T: Object>(get: fn(&T) -> &dyn TraceSource) -> Rc<dyn TraceSourceAccessor> {
    Rc::new(FnTraceSourceAccessor { get })
}

/// A trace source as declared in the type registry
#[derive(Clone)]
pub struct TraceSourceInfo {
    /// the type that declared the trace source
    pub owner: TypeId,
    pub name: String,
    pub help: String,
    pub accessor: Rc<dyn TraceSourceAccessor>,
}

impl fmt::Debug for TraceSourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSourceInfo")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NodeIndex;

    type Received = Rc<RefCell<Vec<(String, u32)>>>;

    fn recorder() -> (Received, Callback<u32>) {
        let received = Received::default();
        let callback = Callback::new({
            let received = Rc::clone(&received);
            move |context: &TraceContext, value: &u32| {
                received.borrow_mut().push((context.to_string(), *value))
            }
        });
        (received, callback)
    }

    #[test]
    fn connect_fire_disconnect() {
        let source = TracedCallback::<u32>::new();
        let (received, callback) = recorder();

        let mut context = TraceContext::new();
        context.add(NodeIndex(3));
        source.connect(&callback, &context);
        source.fire(&1);
        source.disconnect(&callback);
        source.fire(&2);

        assert!(source.is_empty());
        assert_eq!(*received.borrow(), [("node=3".to_owned(), 1)]);
    }

    #[test]
    fn connected_twice() {
        let source = TracedCallback::<u32>::new();
        let (received, callback) = recorder();

        source.connect(&callback, &TraceContext::new());
        source.connect(&callback, &TraceContext::new());
        source.fire(&7);
        assert_eq!(received.borrow().len(), 2);

        source.disconnect(&callback);
        assert!(source.is_empty());
    }

    #[test]
    fn type_erased_callbacks() {
        let source = TracedCallback::<u32>::new();
        let (received, callback) = recorder();
        let wrong = Callback::new(|_: &TraceContext, _: &String| {});

        assert!(!source.add_callback(&wrong.base(), &TraceContext::new()));
        assert!(source.add_callback(&callback.base(), &TraceContext::new()));
        source.fire(&4);
        assert!(source.remove_callback(&callback.base()));
        source.fire(&5);

        assert_eq!(*received.borrow(), [(String::new(), 4)]);
    }

    #[test]
    fn printer() {
        let source = TracedCallback::<(u32, bool)>::new();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let printer: TracePrinter = Rc::new({
            let lines = Rc::clone(&lines);
            move |context: &TraceContext, text: &str| lines.borrow_mut().push(format!("{context}: {text}"))
        });

        let mut context = TraceContext::new();
        context.add(NodeIndex(0));
        source.connect_printer(&printer, &context);
        source.fire(&(3, true));

        assert_eq!(*lines.borrow(), ["node=0: (3, true)"]);
    }

    #[test]
    fn traced_value_fires_on_change() {
        let value = TracedValue::new(1i32);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let callback = Callback::new({
            let changes = Rc::clone(&changes);
            move |_: &TraceContext, change: &(i32, i32)| changes.borrow_mut().push(*change)
        });
        value.connect(&callback, &TraceContext::new());

        value.set(1);
        value.set(4);
        value.set(-2);

        assert_eq!(value.get(), -2);
        assert_eq!(*changes.borrow(), [(1, 4), (4, -2)]);
    }

    #[test]
    fn accessor_checks_object_type() {
        #[derive(Default)]
        struct Device {
            rx: TracedCallback<u32>,
        }
        impl Object for Device {}

        #[derive(Default)]
        struct Other;
        impl Object for Other {}

        let accessor = make_trace_source_accessor::<Device>(|device| &device.rx);
        let device = Device::default();
        let (received, callback) = recorder();

        let source = accessor.source(&device).unwrap();
        assert!(source.add_callback(&callback.base(), &TraceContext::new()));
        device.rx.fire(&9);
        assert_eq!(received.borrow().len(), 1);

        assert!(accessor.source(&Other).is_none());

        #[derive(Default)]
        struct Radio {
            device: Device,
        }
        impl Object for Radio {
            fn as_parent(&self) -> Option<&dyn Object> {
                Some(&self.device)
            }
        }

        let radio = Radio::default();
        let source = accessor.source(&radio).unwrap();
        assert!(source.add_callback(&callback.base(), &TraceContext::new()));
        radio.device.rx.fire(&3);
        assert_eq!(received.borrow().len(), 2);
    }
}
