/*!
Objects, aggregation and construction

Simulation entities implement [`Object`] and are created through the
[`TypeRegistry`], which applies their construct-time attributes. They are
then handled through counted [`Ptr`] handles. Objects can be aggregated:
joined into a ring in which any member can find any other member by type
([`Ptr::get_object`]) or by registered interface ([`Ptr::query_interface`]).
*/

mod factory;
mod ptr;
mod trace;

pub use self::{factory::ObjectFactory, ptr::Ptr};
use crate::{
    TypeId, TypeRegistry,
    attribute::{AttributeFlags, AttributeList, AttributeValue},
    trace::CompositeTraceResolver,
};
use std::any::Any;

/// A simulation entity
///
/// All the hooks have a default, empty, implementation.
pub trait Object: Any {
    /// release the references this object holds to other objects
    ///
    /// called once by [`Ptr::dispose`].
    fn do_dispose(&mut self) {}

    /// called once every construct-time attribute has been applied
    fn notify_construction_completed(&mut self) {}

    /// register the trace sources and the traceable children of this
    /// object in addition to the ones declared in the type registry
    fn add_trace_items<'a>(&'a self, _resolver: &mut CompositeTraceResolver<'a>) {}

    /// the embedded object backing the parent type, when the parent type
    /// is implemented by another struct
    ///
    /// Attribute and trace source accessors declared on the parent type
    /// look through it, see [`downcast_object`].
    ///
    /// ```
    /// # use evsim_core::{downcast_object, Object};
    /// #[derive(Default)]
    /// struct Device {
    ///     mtu: u16,
    /// }
    /// impl Object for Device {}
    ///
    /// #[derive(Default)]
    /// struct WifiDevice {
    ///     device: Device,
    ///     channel: u8,
    /// }
    /// impl Object for WifiDevice {
    ///     fn as_parent(&self) -> Option<&dyn Object> {
    ///         Some(&self.device)
    ///     }
    ///     fn as_parent_mut(&mut self) -> Option<&mut dyn Object> {
    ///         Some(&mut self.device)
    ///     }
    /// }
    ///
    /// let wifi = WifiDevice { device: Device { mtu: 2_304 }, channel: 6 };
    /// assert_eq!(downcast_object::<Device>(&wifi).map(|d| d.mtu), Some(2_304));
    /// ```
    fn as_parent(&self) -> Option<&dyn Object> {
        None
    }

    fn as_parent_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }
}

/// find the `T` in `object`, following [`Object::as_parent`] when
/// `object` is not a `T` itself
pub fn downcast_object<T: Object>(object: &dyn Object) -> Option<&T> {
    let any: &dyn Any = object;
    match any.downcast_ref::<T>() {
        Some(found) => Some(found),
        None => downcast_object(object.as_parent()?),
    }
}

/// mutable counterpart of [`downcast_object`]
pub fn downcast_object_mut<T: Object>(object: &mut dyn Object) -> Option<&mut T> {
    let any: &dyn Any = &*object;
    if any.is::<T>() {
        let any: &mut dyn Any = object;
        return any.downcast_mut::<T>();
    }
    downcast_object_mut(object.as_parent_mut()?)
}

/// An [`Object`] that knows its registered type
///
/// Implementations usually register the type on first use:
///
/// ```
/// # use evsim_core::{Object, ObjectType, TypeId, TypeRegistry};
/// #[derive(Default)]
/// struct Node;
///
/// impl Object for Node {}
///
/// impl ObjectType for Node {
///     fn get_type_id(registry: &TypeRegistry) -> TypeId {
///         registry.lookup_or_register("Node", |builder| {
///             builder.add_constructor::<Node>();
///         })
///     }
/// }
/// ```
pub trait ObjectType: Object + Sized {
    fn get_type_id(registry: &TypeRegistry) -> TypeId;
}

/// wrap a freshly built object and apply its construct-time attributes
///
/// The attributes of the root type are applied first and the ones of the
/// most derived type last. Each attribute takes its value from
/// `attributes`, else from the registry's global list, else its initial
/// value.
pub(crate) fn construct(
    registry: &TypeRegistry,
    tid: TypeId,
    object: Box<dyn Object>,
    attributes: &AttributeList,
) -> Ptr {
    let ptr = Ptr::new_node(registry.clone(), tid, object);
    let node = ptr.node();

    let mut chain = registry.chain(tid);
    chain.reverse();
    for current in chain {
        for info in registry.attributes_of(current) {
            if !info.flags.contains(AttributeFlags::CONSTRUCT) {
                continue;
            }

            let (value, source) = match attributes.find(&info.checker) {
                Some(value) => (value.clone(), "explicit"),
                None => match registry.global_value(&info.checker) {
                    Some(value) => (value, "global"),
                    None => (info.initial.clone(), "initial"),
                },
            };

            log::debug!(
                "construct {}::{} = {value:?} ({source})",
                registry.name(current),
                info.name
            );
            if !node.apply(&info, &value) {
                log::warn!(
                    "attribute {}::{} could not be applied",
                    registry.name(current),
                    info.name
                );
            }
        }
    }

    node.value.borrow_mut().notify_construction_completed();
    ptr
}

/// create an object of type `T` with its default constructor
///
/// # Panics
///
/// if the registered constructor of `T` does not build a `T`
pub fn create_object<T: ObjectType>(registry: &TypeRegistry, attributes: &AttributeList) -> Ptr<T> {
    let tid = T::get_type_id(registry);
    let object = registry.create_object(tid, attributes);
    match object.downcast::<T>() {
        Some(object) => object,
        None => panic!(
            "the constructor of `{}' does not build a {}",
            registry.name(tid),
            std::any::type_name::<T>()
        ),
    }
}

/// create an object of type `T`, overriding the listed attributes
///
/// # Panics
///
/// if an attribute does not exist or refuses its value
pub fn create_object_with<'a, T: ObjectType>(
    registry: &TypeRegistry,
    values: impl IntoIterator<Item = (&'a str, AttributeValue)>,
) -> Ptr<T> {
    let tid = T::get_type_id(registry);
    let mut attributes = AttributeList::new();
    for (name, value) in values {
        if !attributes.set_with_type_id(registry, tid, name, value) {
            panic!(
                "could not set attribute `{name}' of type `{}'",
                registry.name(tid)
            );
        }
    }
    create_object(registry, &attributes)
}
