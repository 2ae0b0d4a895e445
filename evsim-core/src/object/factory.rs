use crate::{
    TypeId, TypeRegistry,
    attribute::{AttributeList, AttributeValue},
    object::Ptr,
};

/// Creates objects of a type chosen at run time
///
/// The factory records a type and a set of attribute values. Every call
/// to [`ObjectFactory::create`] builds a new object with them.
///
/// ```
/// # use evsim_core::{attribute::{make_accessor, make_uinteger_checker}, Object, ObjectFactory, TypeRegistry};
/// #[derive(Default)]
/// struct Queue {
///     size: u32,
/// }
/// impl Object for Queue {}
///
/// let registry = TypeRegistry::new();
/// registry.register("Queue").add_constructor::<Queue>().add_attribute(
///     "Size",
///     "maximum number of packets",
///     100u32,
///     make_accessor(|q: &Queue| q.size, |q: &mut Queue, size: u32| q.size = size),
///     make_uinteger_checker::<u32>(),
/// );
///
/// let mut factory = ObjectFactory::new(&registry);
/// assert!(factory.set_type_name("Queue"));
/// assert!(factory.set("Size", 10u32));
///
/// let queue = factory.create().unwrap();
/// assert_eq!(queue.downcast::<Queue>().unwrap().borrow().size, 10);
/// ```
#[derive(Clone)]
pub struct ObjectFactory {
    registry: TypeRegistry,
    tid: Option<TypeId>,
    attributes: AttributeList,
}

impl ObjectFactory {
    pub fn new(registry: &TypeRegistry) -> Self {
        Self {
            registry: registry.clone(),
            tid: None,
            attributes: AttributeList::new(),
        }
    }

    /// select the type of the objects to create
    ///
    /// the attribute values set so far are kept.
    pub fn set_type_id(&mut self, tid: TypeId) {
        self.tid = Some(tid);
    }

    /// select the type by its registered name
    ///
    /// returns false, and keeps the current type, if no such type exists.
    pub fn set_type_name(&mut self, name: &str) -> bool {
        match self.registry.lookup_by_name(name) {
            Some(tid) => {
                self.tid = Some(tid);
                true
            }
            None => {
                log::debug!("no type `{name}' registered");
                false
            }
        }
    }

    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.tid
    }

    /// record the value of an attribute of the selected type
    ///
    /// returns false if no type is selected, if the attribute does not
    /// exist or if the value is refused.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> bool {
        let Some(tid) = self.tid else {
            return false;
        };
        self.attributes.set_with_type_id(&self.registry, tid, name, value)
    }

    #[inline]
    pub fn attributes(&self) -> &AttributeList {
        &self.attributes
    }

    /// create a new object, `None` if no type was selected
    ///
    /// # Panics
    ///
    /// if the selected type has no default constructor
    pub fn create(&self) -> Option<Ptr> {
        let tid = self.tid?;
        Some(self.registry.create_object(tid, &self.attributes))
    }
}

impl std::fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFactory")
            .field("type", &self.tid.map(|tid| self.registry.name(tid)))
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Object,
        attribute::{make_accessor, make_integer_checker},
    };

    #[derive(Default)]
    struct Counter {
        start: i32,
    }
    impl Object for Counter {}

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register("Counter").add_constructor::<Counter>().add_attribute(
            "Start",
            "",
            1i32,
            make_accessor(|c: &Counter| c.start, |c: &mut Counter, start: i32| c.start = start),
            make_integer_checker::<i32>(),
        );
        registry
    }

    #[test]
    fn no_type() {
        let registry = registry();
        let mut factory = ObjectFactory::new(&registry);

        assert!(factory.create().is_none());
        assert!(!factory.set("Start", 3i32));
        assert!(!factory.set_type_name("Missing"));
        assert_eq!(factory.type_id(), None);
    }

    #[test]
    fn creates_distinct_objects() {
        let registry = registry();
        let mut factory = ObjectFactory::new(&registry);
        assert!(factory.set_type_name("Counter"));
        assert!(factory.set("Start", 3i32));
        assert!(!factory.set("Start", "three"));
        assert!(!factory.set("Missing", 3i32));

        let a = factory.create().unwrap();
        let b = factory.create().unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.downcast::<Counter>().unwrap().borrow().start, 3);
        assert_eq!(b.get_attribute("Start"), Some(AttributeValue::Integer(3)));
        assert_eq!(factory.attributes().len(), 1);
    }
}
