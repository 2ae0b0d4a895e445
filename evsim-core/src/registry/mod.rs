/*!
Run-time type information

The [`TypeRegistry`] records, for each registered type, its name, its
parent, the constructors able to create it, its attributes and its trace
sources. Types are registered once, usually on first use through
[`TypeRegistry::lookup_or_register`], and only read afterward.

A registry handle is cheap to clone; every clone shares the same table.
[`TypeRegistry::global`] is the default table of the current thread and
[`TypeRegistry::new`] creates an independent one (handy for tests).
*/

mod builder;
mod type_id;

pub use self::{builder::TypeBuilder, type_id::TypeId};
use crate::{
    attribute::{AttributeInfo, AttributeList, AttributeValue, Checker, same_checker},
    defaults::ROOT_TYPE_NAME,
    object::{self, Object, ObjectType, Ptr},
    trace::TraceSourceInfo,
};
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

/// A way to build an object of a registered type
#[derive(Clone)]
pub enum Constructor {
    /// takes no argument
    Default(fn() -> Box<dyn Object>),
    /// takes one argument, may refuse it
    WithArgument(Rc<dyn Fn(&AttributeValue) -> Option<Box<dyn Object>>>),
}

impl Constructor {
    pub fn arity(&self) -> usize {
        match self {
            Self::Default(_) => 0,
            Self::WithArgument(_) => 1,
        }
    }
}

struct TypeInformation {
    name: String,
    parent: TypeId,
    type_name: String,
    group_name: String,
    constructors: Vec<Constructor>,
    attributes: Vec<AttributeInfo>,
    trace_sources: Vec<TraceSourceInfo>,
}

struct Registry {
    types: Vec<TypeInformation>,
    names: HashMap<String, TypeId>,
    globals: AttributeList,
}

/// The table of registered types
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Rc<RefCell<Registry>>,
}

thread_local! {
    static GLOBAL: TypeRegistry = TypeRegistry::new();
}

impl TypeRegistry {
    /// create a new registry, containing only the root type
    pub fn new() -> Self {
        let registry = Self {
            inner: Rc::new(RefCell::new(Registry {
                types: Vec::new(),
                names: HashMap::new(),
                globals: AttributeList::new(),
            })),
        };

        let root = registry.allocate(ROOT_TYPE_NAME);
        debug_assert_eq!(root, TypeId::OBJECT);

        registry
    }

    /// the default registry of the current thread
    pub fn global() -> Self {
        GLOBAL.with(Self::clone)
    }

    /// both handles share the same table
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn allocate(&self, name: &str) -> TypeId {
        let mut inner = self.inner.borrow_mut();

        if inner.names.contains_key(name) {
            panic!("type `{name}' is already registered");
        }
        let Ok(index) = u16::try_from(inner.types.len()) else {
            panic!("too many types registered, cannot register `{name}'");
        };

        let tid = TypeId::new(index);
        inner.types.push(TypeInformation {
            name: name.to_owned(),
            parent: TypeId::OBJECT,
            type_name: String::new(),
            group_name: String::new(),
            constructors: Vec::new(),
            attributes: Vec::new(),
            trace_sources: Vec::new(),
        });
        inner.names.insert(name.to_owned(), tid);

        log::debug!("registered type `{name}' as {tid}");
        tid
    }

    /// register a new type
    ///
    /// # Panics
    ///
    /// if a type with the same name is already registered
    pub fn register(&self, name: &str) -> TypeBuilder {
        let tid = self.allocate(name);
        TypeBuilder::new(self.clone(), tid)
    }

    /// the type named `name`, registering it with `init` if it does not
    /// exist yet
    ///
    /// ```
    /// # use evsim_core::{TypeRegistry, TypeId};
    /// let registry = TypeRegistry::new();
    /// let tid = registry.lookup_or_register("Node", |builder| {
    ///     builder.set_group_name("Core");
    /// });
    /// assert_eq!(registry.lookup_or_register("Node", |_| unreachable!()), tid);
    /// assert_eq!(registry.parent(tid), TypeId::OBJECT);
    /// ```
    pub fn lookup_or_register(&self, name: &str, init: impl FnOnce(&mut TypeBuilder)) -> TypeId {
        if let Some(tid) = self.lookup_by_name(name) {
            return tid;
        }

        let mut builder = self.register(name);
        init(&mut builder);
        builder.id()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<TypeId> {
        self.inner.borrow().names.get(name).copied()
    }

    /// the type of `T`, registered on first use
    pub fn type_id_of<T: ObjectType>(&self) -> TypeId {
        T::get_type_id(self)
    }

    fn with_type<R>(&self, tid: TypeId, f: impl FnOnce(&TypeInformation) -> R) -> R {
        let inner = self.inner.borrow();
        let Some(info) = inner.types.get(tid.index()) else {
            panic!("type id {tid} is not registered in this registry");
        };
        f(info)
    }

    fn with_type_mut<R>(&self, tid: TypeId, f: impl FnOnce(&mut TypeInformation) -> R) -> R {
        let mut inner = self.inner.borrow_mut();
        let Some(info) = inner.types.get_mut(tid.index()) else {
            panic!("type id {tid} is not registered in this registry");
        };
        f(info)
    }

    pub fn name(&self, tid: TypeId) -> String {
        self.with_type(tid, |info| info.name.clone())
    }

    /// the parent type, the root is its own parent
    pub fn parent(&self, tid: TypeId) -> TypeId {
        self.with_type(tid, |info| info.parent)
    }

    pub fn group_name(&self, tid: TypeId) -> String {
        self.with_type(tid, |info| info.group_name.clone())
    }

    pub fn type_name(&self, tid: TypeId) -> String {
        self.with_type(tid, |info| info.type_name.clone())
    }

    /// `tid` is `ancestor` or one of its descendants
    pub fn is_a(&self, tid: TypeId, ancestor: TypeId) -> bool {
        self.chain(tid).contains(&ancestor)
    }

    /// `tid` followed by each of its ancestors, up to and including the
    /// root
    pub fn chain(&self, tid: TypeId) -> Vec<TypeId> {
        let inner = self.inner.borrow();
        let mut chain = Vec::new();
        let mut current = tid;
        loop {
            chain.push(current);
            let Some(info) = inner.types.get(current.index()) else {
                panic!("type id {current} is not registered in this registry");
            };
            if info.parent == current {
                break;
            }
            current = info.parent;
        }
        chain
    }

    pub fn has_constructor(&self, tid: TypeId) -> bool {
        self.with_type(tid, |info| !info.constructors.is_empty())
    }

    pub fn registered_count(&self) -> usize {
        self.inner.borrow().types.len()
    }

    /// the type registered at position `index`
    pub fn registered(&self, index: usize) -> Option<TypeId> {
        let count = self.registered_count();
        if index < count {
            u16::try_from(index).ok().map(TypeId::new)
        } else {
            None
        }
    }

    /// number of attributes declared by `tid` itself
    pub fn attribute_count(&self, tid: TypeId) -> usize {
        self.with_type(tid, |info| info.attributes.len())
    }

    /// attribute declared at `index` by `tid` itself
    pub fn attribute(&self, tid: TypeId, index: usize) -> Option<AttributeInfo> {
        self.with_type(tid, |info| info.attributes.get(index).cloned())
    }

    /// `Type::Attribute` name of the attribute at `index`
    pub fn attribute_full_name(&self, tid: TypeId, index: usize) -> Option<String> {
        self.with_type(tid, |info| {
            info.attributes
                .get(index)
                .map(|attribute| format!("{}::{}", info.name, attribute.name))
        })
    }

    /// attributes declared by `tid` itself, in declaration order
    pub(crate) fn attributes_of(&self, tid: TypeId) -> Vec<AttributeInfo> {
        self.with_type(tid, |info| info.attributes.clone())
    }

    /// the attribute `name` of `tid` or of the nearest ancestor declaring it
    pub fn lookup_attribute_by_name(&self, tid: TypeId, name: &str) -> Option<AttributeInfo> {
        let inner = self.inner.borrow();
        let mut current = tid;
        loop {
            let info = inner.types.get(current.index())?;
            if let Some(attribute) = info.attributes.iter().find(|a| a.name == name) {
                return Some(attribute.clone());
            }
            if info.parent == current {
                return None;
            }
            current = info.parent;
        }
    }

    /// the attribute named `Type::Attribute`
    pub fn lookup_attribute_by_full_name(&self, full_name: &str) -> Option<AttributeInfo> {
        let (type_name, name) = full_name.rsplit_once("::")?;
        let tid = self.lookup_by_name(type_name)?;
        self.lookup_attribute_by_name(tid, name)
    }

    /// the attribute at `position` counted from the root type down to
    /// `tid`
    pub fn lookup_attribute_by_position(&self, tid: TypeId, position: usize) -> Option<AttributeInfo> {
        let mut chain = self.chain(tid);
        chain.reverse();

        let inner = self.inner.borrow();
        chain
            .iter()
            .filter_map(|tid| inner.types.get(tid.index()))
            .flat_map(|info| info.attributes.iter())
            .nth(position)
            .cloned()
    }

    /// the `Type::Attribute` name of the attribute checked by `checker`
    pub fn attribute_full_name_of(&self, checker: &Checker) -> Option<String> {
        let inner = self.inner.borrow();
        inner.types.iter().find_map(|info| {
            info.attributes
                .iter()
                .find(|attribute| same_checker(&attribute.checker, checker))
                .map(|attribute| format!("{}::{}", info.name, attribute.name))
        })
    }

    pub fn trace_source_count(&self, tid: TypeId) -> usize {
        self.with_type(tid, |info| info.trace_sources.len())
    }

    /// trace source declared at `index` by `tid` itself
    pub fn trace_source(&self, tid: TypeId, index: usize) -> Option<TraceSourceInfo> {
        self.with_type(tid, |info| info.trace_sources.get(index).cloned())
    }

    /// the trace source `name` of `tid` or of the nearest ancestor
    /// declaring it
    pub fn lookup_trace_source_by_name(&self, tid: TypeId, name: &str) -> Option<TraceSourceInfo> {
        let inner = self.inner.borrow();
        let mut current = tid;
        loop {
            let info = inner.types.get(current.index())?;
            if let Some(source) = info.trace_sources.iter().find(|s| s.name == name) {
                return Some(source.clone());
            }
            if info.parent == current {
                return None;
            }
            current = info.parent;
        }
    }

    /// trace sources of `tid` and its ancestors, the most derived first
    ///
    /// a source redeclared by a derived type hides the parent's one.
    pub(crate) fn trace_sources_chain(&self, tid: TypeId) -> Vec<TraceSourceInfo> {
        let chain = self.chain(tid);
        let inner = self.inner.borrow();
        let mut sources: Vec<TraceSourceInfo> = Vec::new();
        for info in chain.iter().filter_map(|tid| inner.types.get(tid.index())) {
            for source in &info.trace_sources {
                if !sources.iter().any(|known| known.name == source.name) {
                    sources.push(source.clone());
                }
            }
        }
        sources
    }

    fn constructor(&self, tid: TypeId, arity: usize) -> Constructor {
        let constructor = self.with_type(tid, |info| {
            info.constructors
                .iter()
                .find(|constructor| constructor.arity() == arity)
                .cloned()
        });
        match constructor {
            Some(constructor) => constructor,
            None => panic!(
                "type `{}' has no constructor taking {arity} argument(s)",
                self.name(tid)
            ),
        }
    }

    /// create an object of type `tid` with its default constructor
    ///
    /// # Panics
    ///
    /// if the type has no constructor without argument
    pub fn create_object(&self, tid: TypeId, attributes: &AttributeList) -> Ptr {
        let Constructor::Default(create) = self.constructor(tid, 0) else {
            unreachable!("arity 0 is always the default constructor")
        };
        object::construct(self, tid, create(), attributes)
    }

    /// create an object of type `tid` with its one-argument constructor
    ///
    /// returns `None` if the constructor refused `argument`.
    ///
    /// # Panics
    ///
    /// if the type has no one-argument constructor
    pub fn create_object_with_argument(
        &self,
        tid: TypeId,
        argument: &AttributeValue,
        attributes: &AttributeList,
    ) -> Option<Ptr> {
        let Constructor::WithArgument(create) = self.constructor(tid, 1) else {
            unreachable!("arity 1 is always the constructor with argument")
        };
        let object = create(argument)?;
        Some(object::construct(self, tid, object, attributes))
    }

    /// set the value used by every construction that does not override the
    /// attribute `Type::Attribute`
    pub fn set_global(&self, full_name: &str, value: impl Into<AttributeValue>) -> bool {
        let mut globals = self.global_attributes();
        if !globals.set(self, full_name, value) {
            return false;
        }
        self.inner.borrow_mut().globals = globals;
        true
    }

    pub fn reset_globals(&self) {
        self.inner.borrow_mut().globals.reset();
    }

    /// a copy of the global attribute list
    pub fn global_attributes(&self) -> AttributeList {
        self.inner.borrow().globals.clone()
    }

    pub(crate) fn global_value(&self, checker: &Checker) -> Option<AttributeValue> {
        self.inner.borrow().globals.find(checker).cloned()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_list()
            .entries(inner.types.iter().map(|info| &info.name))
            .finish()
    }
}
