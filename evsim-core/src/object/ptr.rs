use crate::{
    TypeId, TypeRegistry,
    attribute::{AttributeFlags, AttributeInfo, AttributeValue, checked_value},
    object::Object,
};
use std::{
    any::{self, Any},
    cell::{Cell, Ref, RefCell, RefMut},
    fmt,
    marker::PhantomData,
    rc::Rc,
};

/// Storage of one object
///
/// Besides the object itself a node carries the number of live [`Ptr`]
/// to it and the link to the next member of its aggregate. The links form
/// a ring: a node that is not aggregated links to itself.
pub(super) struct Node {
    pub(super) count: Cell<u32>,
    pub(super) tid: TypeId,
    pub(super) concrete: any::TypeId,
    pub(super) disposed: Cell<bool>,
    pub(super) collecting: Cell<bool>,
    pub(super) next: RefCell<Option<Rc<Node>>>,
    pub(super) registry: TypeRegistry,
    pub(super) value: RefCell<Box<dyn Object>>,
}

impl Node {
    fn next_node(&self) -> Option<Rc<Node>> {
        self.next.borrow().clone()
    }

    /// every member of the ring, starting with `start`
    pub(super) fn ring(start: &Rc<Node>) -> Vec<Rc<Node>> {
        let mut members = vec![Rc::clone(start)];
        let mut current = start.next_node();
        while let Some(node) = current {
            if Rc::ptr_eq(&node, start) {
                break;
            }
            current = node.next_node();
            members.push(node);
        }
        members
    }

    /// release the ring once no member is referenced any more
    fn maybe_delete(start: &Rc<Node>) {
        let members = Self::ring(start);
        if members.iter().any(|member| member.count.get() > 0) {
            return;
        }

        // the nodes are freed once `members` goes out of scope
        for member in &members {
            let _next = member.next.borrow_mut().take();
        }
    }

    fn set_with_info(&self, info: &AttributeInfo, value: AttributeValue) -> bool {
        let Some(value) = checked_value(&*info.checker, value) else {
            log::debug!("value refused for attribute `{}'", info.name);
            return false;
        };
        self.apply(info, &value)
    }

    /// store a value already accepted by the attribute's checker
    pub(super) fn apply(&self, info: &AttributeInfo, value: &AttributeValue) -> bool {
        let mut object = self.value.borrow_mut();
        info.accessor.set(&mut **object, value)
    }
}

/// Counted handle to an object
///
/// Cloning the handle increments the object's reference count, dropping
/// it decrements the count. An object stays alive as long as any member
/// of its aggregate is referenced.
///
/// `Ptr<T>` refers to an object of concrete type `T`, `Ptr` (that is
/// `Ptr<dyn Object>`) to an object of any type.
pub struct Ptr<T: ?Sized = dyn Object> {
    node: Rc<Node>,
    _marker: PhantomData<*const T>,
}

impl Ptr {
    pub(super) fn new_node(registry: TypeRegistry, tid: TypeId, value: Box<dyn Object>) -> Self {
        let concrete = {
            let any: &dyn Any = &*value;
            any.type_id()
        };

        let node = Rc::new(Node {
            count: Cell::new(1),
            tid,
            concrete,
            disposed: Cell::new(false),
            collecting: Cell::new(false),
            next: RefCell::new(None),
            registry,
            value: RefCell::new(value),
        });
        *node.next.borrow_mut() = Some(Rc::clone(&node));

        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// borrow the object
    ///
    /// # Panics
    ///
    /// if the object is currently mutably borrowed
    pub fn borrow_object(&self) -> Ref<'_, dyn Object> {
        Ref::map(self.node.value.borrow(), |value| &**value)
    }

    /// mutably borrow the object
    ///
    /// # Panics
    ///
    /// if the object is currently borrowed
    pub fn borrow_object_mut(&self) -> RefMut<'_, dyn Object> {
        RefMut::map(self.node.value.borrow_mut(), |value| &mut **value)
    }
}

impl<T: Object> Ptr<T> {
    /// borrow the object
    ///
    /// # Panics
    ///
    /// if the object is currently mutably borrowed
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.node.value.borrow(), |value| {
            let any: &dyn Any = &**value;
            any.downcast_ref::<T>()
                .expect("a typed handle always refers to an object of its type")
        })
    }

    /// mutably borrow the object
    ///
    /// # Panics
    ///
    /// if the object is currently borrowed
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.node.value.borrow_mut(), |value| {
            let any: &mut dyn Any = &mut **value;
            any.downcast_mut::<T>()
                .expect("a typed handle always refers to an object of its type")
        })
    }
}

impl<T: ?Sized> Ptr<T> {
    pub(super) fn from_node(node: &Rc<Node>) -> Self {
        node.count.set(node.count.get() + 1);
        Self {
            node: Rc::clone(node),
            _marker: PhantomData,
        }
    }

    pub(super) fn node(&self) -> &Rc<Node> {
        &self.node
    }

    /// the registered type of the object
    #[inline]
    pub fn tid(&self) -> TypeId {
        self.node.tid
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.node.registry
    }

    /// the registered name of the object's type
    pub fn type_name(&self) -> String {
        self.node.registry.name(self.node.tid)
    }

    /// both handles refer to the same object
    pub fn ptr_eq<U: ?Sized>(&self, other: &Ptr<U>) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// a type-erased handle to the same object
    pub fn as_object(&self) -> Ptr {
        Ptr::from_node(&self.node)
    }

    pub fn into_object(self) -> Ptr {
        self.as_object()
    }

    /// the object is of concrete type `U`
    pub fn is<U: Object>(&self) -> bool {
        self.node.concrete == any::TypeId::of::<U>()
    }

    /// a typed handle to the same object, if it is a `U`
    pub fn downcast<U: Object>(&self) -> Option<Ptr<U>> {
        self.is::<U>().then(|| Ptr::from_node(&self.node))
    }

    /// number of live handles to this object
    pub fn reference_count(&self) -> u32 {
        self.node.count.get()
    }

    /// the object itself is referenced
    pub fn check(&self) -> bool {
        self.node.count.get() > 0
    }

    /// some member of the object's aggregate is referenced
    pub fn check_loose(&self) -> bool {
        Node::ring(&self.node)
            .iter()
            .map(|member| member.count.get())
            .sum::<u32>()
            > 0
    }

    pub fn is_disposed(&self) -> bool {
        self.node.disposed.get()
    }

    /// join the aggregate of `other` with the aggregate of this object
    ///
    /// afterward every member of both aggregates can be reached from any
    /// of them with [`Ptr::get_object`] and [`Ptr::query_interface`].
    ///
    /// # Panics
    ///
    /// if either object is disposed or if both are already in the same
    /// aggregate
    pub fn aggregate_object<U: ?Sized>(&self, other: &Ptr<U>) {
        assert!(!self.node.disposed.get(), "cannot aggregate a disposed object");
        assert!(!other.node.disposed.get(), "cannot aggregate a disposed object");
        assert!(self.check_loose() && other.check_loose());
        assert!(
            !Node::ring(&self.node)
                .iter()
                .any(|member| Rc::ptr_eq(member, &other.node)),
            "objects are already aggregated together"
        );

        log::debug!(
            "aggregate {} with {}",
            self.type_name(),
            other.type_name()
        );

        let self_next = self.node.next.borrow_mut().take();
        let other_next = other.node.next.borrow_mut().take();
        *self.node.next.borrow_mut() = other_next;
        *other.node.next.borrow_mut() = self_next;
    }

    /// every member of the aggregate, starting with this object
    pub fn aggregate_members(&self) -> Vec<Ptr> {
        Node::ring(&self.node).iter().map(Ptr::from_node).collect()
    }

    /// the member of the aggregate of concrete type `U`
    pub fn get_object<U: Object>(&self) -> Option<Ptr<U>> {
        assert!(self.check_loose());
        let wanted = any::TypeId::of::<U>();
        Node::ring(&self.node)
            .iter()
            .find(|member| member.concrete == wanted)
            .map(Ptr::from_node)
    }

    /// the member of the aggregate whose registered type is `tid` or
    /// derives from it
    pub fn query_interface(&self, tid: TypeId) -> Option<Ptr> {
        assert!(self.check_loose());
        Node::ring(&self.node)
            .iter()
            .find(|member| member.registry.is_a(member.tid, tid))
            .map(Ptr::from_node)
    }

    /// release the resources of every member of the aggregate
    ///
    /// [`Object::do_dispose`] is called exactly once on each member.
    ///
    /// # Panics
    ///
    /// if a member was already disposed
    pub fn dispose(&self) {
        for member in Node::ring(&self.node) {
            assert!(
                !member.disposed.get(),
                "object of type `{}' disposed twice",
                member.registry.name(member.tid)
            );
            member.disposed.set(true);
            member.value.borrow_mut().do_dispose();
        }
    }

    /// set an attribute of the live object
    ///
    /// returns false if the attribute does not exist, is not settable or
    /// if the value is refused.
    pub fn set_attribute(&self, name: &str, value: impl Into<AttributeValue>) -> bool {
        let Some(info) = self.registry().lookup_attribute_by_name(self.tid(), name) else {
            log::debug!("type `{}' has no attribute `{name}'", self.type_name());
            return false;
        };
        if !info.flags.contains(AttributeFlags::SET) {
            return false;
        }
        self.node.set_with_info(&info, value.into())
    }

    /// read an attribute of the live object
    pub fn get_attribute(&self, name: &str) -> Option<AttributeValue> {
        let info = self.registry().lookup_attribute_by_name(self.tid(), name)?;
        if !info.flags.contains(AttributeFlags::GET) {
            return None;
        }
        let object = self.node.value.borrow();
        info.accessor.get(&**object)
    }

    /// read an attribute of the live object in its textual form
    pub fn get_attribute_string(&self, name: &str) -> Option<String> {
        let info = self.registry().lookup_attribute_by_name(self.tid(), name)?;
        let value = self.get_attribute(name)?;
        Some(value.serialize_to_string(&*info.checker))
    }
}

impl<T: ?Sized> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self::from_node(&self.node)
    }
}

impl<T: ?Sized> Drop for Ptr<T> {
    fn drop(&mut self) {
        let count = self.node.count.get();
        debug_assert!(count > 0, "reference count underflow");
        self.node.count.set(count - 1);
        if count == 1 {
            Node::maybe_delete(&self.node);
        }
    }
}

impl<T: ?Sized> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Eq for Ptr<T> {}

impl<T: ?Sized> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ptr({}@{:p})", self.type_name(), Rc::as_ptr(&self.node))
    }
}
