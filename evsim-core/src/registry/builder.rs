use crate::{
    TypeId, TypeRegistry,
    attribute::{Accessor, AttributeFlags, AttributeInfo, AttributeValue, Checker},
    object::Object,
    registry::Constructor,
    trace::{TraceSourceAccessor, TraceSourceInfo},
};
use std::rc::Rc;

/// Describes a type being registered
///
/// Every call is applied to the registry immediately. The builder is
/// obtained from [`TypeRegistry::register`] or
/// [`TypeRegistry::lookup_or_register`].
pub struct TypeBuilder {
    registry: TypeRegistry,
    tid: TypeId,
}

fn create_default<T: Object + Default>() -> Box<dyn Object> {
    Box::new(T::default())
}

impl TypeBuilder {
    pub(crate) fn new(registry: TypeRegistry, tid: TypeId) -> Self {
        Self { registry, tid }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.tid
    }

    pub fn set_parent(&mut self, parent: TypeId) -> &mut Self {
        assert!(
            !self.registry.is_a(parent, self.tid),
            "type `{}' cannot derive from one of its descendants",
            self.registry.name(self.tid)
        );
        self.registry.with_type_mut(self.tid, |info| info.parent = parent);
        self
    }

    pub fn set_group_name(&mut self, group_name: &str) -> &mut Self {
        self.registry
            .with_type_mut(self.tid, |info| info.group_name = group_name.to_owned());
        self
    }

    pub fn set_type_name(&mut self, type_name: &str) -> &mut Self {
        self.registry
            .with_type_mut(self.tid, |info| info.type_name = type_name.to_owned());
        self
    }

    fn add_constructor_impl(&mut self, constructor: Constructor) -> &mut Self {
        let arity = constructor.arity();
        self.registry.with_type_mut(self.tid, |info| {
            if info.constructors.iter().any(|c| c.arity() == arity) {
                panic!(
                    "type `{}' already has a constructor taking {arity} argument(s)",
                    info.name
                );
            }
            info.constructors.push(constructor);
        });
        self
    }

    /// objects of this type are built with `T::default()`
    pub fn add_constructor<T: Object + Default>(&mut self) -> &mut Self {
        self.add_constructor_impl(Constructor::Default(create_default::<T>))
    }

    /// objects of this type can be built from one argument
    pub fn add_constructor_with_argument<T, F>(&mut self, create: F) -> &mut Self
    where
        T: Object,
        F: Fn(&AttributeValue) -> Option<T> + 'static,
    {
        self.add_constructor_impl(Constructor::WithArgument(Rc::new(move |argument| {
            create(argument).map(|object| Box::new(object) as Box<dyn Object>)
        })))
    }

    /// declare an attribute usable at construction and on live objects
    pub fn add_attribute(
        &mut self,
        name: &str,
        help: &str,
        initial: impl Into<AttributeValue>,
        accessor: Accessor,
        checker: Checker,
    ) -> &mut Self {
        self.add_attribute_with_flags(name, help, AttributeFlags::ALL, initial, accessor, checker)
    }

    /// # Panics
    ///
    /// if this type already declares an attribute `name` or if `initial`
    /// is refused by `checker`
    pub fn add_attribute_with_flags(
        &mut self,
        name: &str,
        help: &str,
        flags: AttributeFlags,
        initial: impl Into<AttributeValue>,
        accessor: Accessor,
        checker: Checker,
    ) -> &mut Self {
        let initial = initial.into();
        let owner = self.tid;

        self.registry.with_type_mut(owner, |info| {
            if info.attributes.iter().any(|attribute| attribute.name == name) {
                panic!("attribute `{name}' is already declared by type `{}'", info.name);
            }
            if !checker.check(&initial) {
                panic!(
                    "initial value {initial:?} of attribute `{}::{name}' is refused by its checker",
                    info.name
                );
            }

            info.attributes.push(AttributeInfo {
                owner,
                name: name.to_owned(),
                help: help.to_owned(),
                flags,
                initial,
                accessor,
                checker,
            });
        });
        self
    }

    /// declare a trace source reachable by name on every object of this type
    ///
    /// # Panics
    ///
    /// if this type already declares a trace source `name`
    pub fn add_trace_source(&mut self, name: &str, help: &str, accessor: Rc<dyn TraceSourceAccessor>) -> &mut Self {
        let owner = self.tid;

        self.registry.with_type_mut(owner, |info| {
            if info.trace_sources.iter().any(|source| source.name == name) {
                panic!("trace source `{name}' is already declared by type `{}'", info.name);
            }

            info.trace_sources.push(TraceSourceInfo {
                owner,
                name: name.to_owned(),
                help: help.to_owned(),
                accessor,
            });
        });
        self
    }
}
