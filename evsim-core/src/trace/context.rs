use std::{
    any::{Any, TypeId},
    fmt,
    rc::Rc,
};

/// A piece of information passed along with every traced event
///
/// A context holds at most one element of each type. Elements are
/// usually small copyable values, for example the index of the node
/// that emitted the event.
///
/// ```
/// # use evsim_core::trace::TraceContextElement;
/// # use std::fmt;
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// struct NodeIndex(u32);
///
/// impl fmt::Display for NodeIndex {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "nodeid={}", self.0)
///     }
/// }
///
/// impl TraceContextElement for NodeIndex {
///     fn name() -> &'static str {
///         "NodeIndex"
///     }
/// }
/// ```
pub trait TraceContextElement: Any + Clone + fmt::Display {
    fn name() -> &'static str;
}

trait Element {
    fn as_any(&self) -> &dyn Any;
    fn name(&self) -> &'static str;
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<E: TraceContextElement> Element for E {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &'static str {
        <E as TraceContextElement>::name()
    }

    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The set of [`TraceContextElement`] attached to a trace event
///
/// Elements keep the order in which they were first added.
#[derive(Clone, Default)]
pub struct TraceContext {
    elements: Vec<(TypeId, Rc<dyn Element>)>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// add `element`, replacing the element of the same type if any
    pub fn add<E: TraceContextElement>(&mut self, element: E) {
        let key = TypeId::of::<E>();
        let element: Rc<dyn Element> = Rc::new(element);
        match self.elements.iter_mut().find(|(id, _)| *id == key) {
            Some(entry) => entry.1 = element,
            None => self.elements.push((key, element)),
        }
    }

    /// the element of type `E`, if present
    pub fn get<E: TraceContextElement>(&self) -> Option<E> {
        let key = TypeId::of::<E>();
        self.elements
            .iter()
            .find(|(id, _)| *id == key)
            .and_then(|(_, element)| element.as_any().downcast_ref::<E>())
            .cloned()
    }

    /// add the elements of `other` whose type is not already present
    pub fn union(&mut self, other: &TraceContext) {
        for (key, element) in &other.elements {
            if !self.elements.iter().any(|(id, _)| id == key) {
                self.elements.push((*key, Rc::clone(element)));
            }
        }
    }

    /// both contexts hold elements of the same types, whatever their values
    pub fn is_similar(&self, other: &TraceContext) -> bool {
        self.len() == other.len()
            && self
                .elements
                .iter()
                .all(|(key, _)| other.elements.iter().any(|(id, _)| id == key))
    }

    /// names of the types of the elements present
    pub fn element_names(&self) -> Vec<&'static str> {
        self.elements.iter().map(|(_, element)| element.name()).collect()
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (_, element)) in self.elements.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            element.print(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceContext({self})")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) struct NodeIndex(pub u32);

    impl fmt::Display for NodeIndex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "node={}", self.0)
        }
    }

    impl TraceContextElement for NodeIndex {
        fn name() -> &'static str {
            "NodeIndex"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) struct DeviceIndex(pub u32);

    impl fmt::Display for DeviceIndex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "device={}", self.0)
        }
    }

    impl TraceContextElement for DeviceIndex {
        fn name() -> &'static str {
            "DeviceIndex"
        }
    }

    #[test]
    fn add_and_get() {
        let mut context = TraceContext::new();
        assert!(context.is_empty());
        assert_eq!(context.get::<NodeIndex>(), None);

        context.add(NodeIndex(1));
        context.add(DeviceIndex(4));
        assert_eq!(context.get::<NodeIndex>(), Some(NodeIndex(1)));
        assert_eq!(context.get::<DeviceIndex>(), Some(DeviceIndex(4)));

        context.add(NodeIndex(2));
        assert_eq!(context.len(), 2);
        assert_eq!(context.get::<NodeIndex>(), Some(NodeIndex(2)));
        assert_eq!(context.to_string(), "node=2 device=4");
        assert_eq!(context.element_names(), ["NodeIndex", "DeviceIndex"]);
    }

    #[test]
    fn union_keeps_existing_elements() {
        let mut context = TraceContext::new();
        context.add(NodeIndex(1));

        let mut other = TraceContext::new();
        other.add(NodeIndex(7));
        other.add(DeviceIndex(3));

        context.union(&other);
        assert_eq!(context.get::<NodeIndex>(), Some(NodeIndex(1)));
        assert_eq!(context.get::<DeviceIndex>(), Some(DeviceIndex(3)));
    }

    #[test]
    fn similarity() {
        let mut a = TraceContext::new();
        a.add(NodeIndex(1));
        a.add(DeviceIndex(2));

        let mut b = TraceContext::new();
        b.add(DeviceIndex(9));
        b.add(NodeIndex(8));
        assert!(a.is_similar(&b));

        let mut c = TraceContext::new();
        c.add(NodeIndex(1));
        assert!(!a.is_similar(&c));
        assert!(!c.is_similar(&a));
    }
}
