use crate::{
    attribute::{AttributeType, AttributeValue},
    object::{Object, downcast_object, downcast_object_mut},
};
use std::{marker::PhantomData, rc::Rc};

/// Reads and writes one attribute of an object
///
/// The accessor receives the object type-erased and is responsible for
/// finding its concrete type back, through [`Object::as_parent`] for
/// attributes declared on a parent type. A value that does not convert to
/// the field's type, or an object of another type, is refused.
pub trait AttributeAccessor {
    fn set(&self, object: &mut dyn Object, value: &AttributeValue) -> bool;

    fn get(&self, object: &dyn Object) -> Option<AttributeValue>;

    fn has_getter(&self) -> bool;

    fn has_setter(&self) -> bool;
}

pub type Accessor = Rc<dyn AttributeAccessor>;

type Getter<T, V> = Box<dyn Fn(&T) -> V>;
type Setter<T, V> = Box<dyn Fn(&mut T, V)>;

struct FnAccessor<T, V> {
    getter: Option<Getter<T, V>>,
    setter: Option<Setter<T, V>>,
    _marker: PhantomData<fn(&T) -> V>,
}

impl<T, V> AttributeAccessor for FnAccessor<T, V>
where
    T: Object,
    V: AttributeType + 'static,
{
    fn set(&self, object: &mut dyn Object, value: &AttributeValue) -> bool {
        let Some(setter) = self.setter.as_ref() else {
            return false;
        };
        let Some(object) = downcast_object_mut::<T>(object) else {
            return false;
        };
        let Some(value) = V::from_value(value) else {
            return false;
        };

        setter(object, value);
        true
    }

    fn get(&self, object: &dyn Object) -> Option<AttributeValue> {
        let getter = self.getter.as_ref()?;
        let object = downcast_object::<T>(object)?;

        Some(getter(object).into_value())
    }

    fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

/// accessor reading and writing the attribute
///
/// ```
/// # use evsim_core::{attribute::make_accessor, Object};
/// #[derive(Default)]
/// struct Device {
///     mtu: u16,
/// }
/// impl Object for Device {}
///
/// let accessor = make_accessor(|d: &Device| d.mtu, |d: &mut Device, mtu: u16| d.mtu = mtu);
/// # assert!(accessor.has_getter() && accessor.has_setter());
/// ```
pub fn make_accessor<T, V>(
    getter: impl Fn(&T) -> V + 'static,
    setter: impl Fn(&mut T, V) + 'static,
) -> Accessor
where
    T: Object,
    V: AttributeType + 'static,
{
    Rc::new(FnAccessor {
        getter: Some(Box::new(getter)),
        setter: Some(Box::new(setter)),
        _marker: PhantomData,
    })
}

/// read-only accessor: setting the attribute always fails
pub fn make_getter_accessor<T, V>(getter: impl Fn(&T) -> V + 'static) -> Accessor
where
    T: Object,
    V: AttributeType + 'static,
{
    Rc::new(FnAccessor::<T, V> {
        getter: Some(Box::new(getter)),
        setter: None,
        _marker: PhantomData,
    })
}

/// write-only accessor: reading the attribute always fails
pub fn make_setter_accessor<T, V>(setter: impl Fn(&mut T, V) + 'static) -> Accessor
where
    T: Object,
    V: AttributeType + 'static,
{
    Rc::new(FnAccessor::<T, V> {
        getter: None,
        setter: Some(Box::new(setter)),
        _marker: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i16,
        hits: u32,
    }
    impl Object for Counter {}

    #[derive(Default)]
    struct Other;
    impl Object for Other {}

    #[derive(Default)]
    struct TaggedCounter {
        counter: Counter,
        tag: u8,
    }

    impl Object for TaggedCounter {
        fn as_parent(&self) -> Option<&dyn Object> {
            Some(&self.counter)
        }

        fn as_parent_mut(&mut self) -> Option<&mut dyn Object> {
            Some(&mut self.counter)
        }
    }

    #[derive(Default)]
    struct Labelled {
        tagged: TaggedCounter,
    }

    impl Object for Labelled {
        fn as_parent(&self) -> Option<&dyn Object> {
            Some(&self.tagged)
        }

        fn as_parent_mut(&mut self) -> Option<&mut dyn Object> {
            Some(&mut self.tagged)
        }
    }

    #[test]
    fn get_and_set() {
        let accessor = make_accessor(|c: &Counter| c.value, |c: &mut Counter, v: i16| c.value = v);
        let mut counter = Counter::default();

        assert!(accessor.set(&mut counter, &AttributeValue::Integer(-3)));
        assert_eq!(counter.value, -3);
        assert_eq!(accessor.get(&counter), Some(AttributeValue::Integer(-3)));

        // does not fit in an i16
        assert!(!accessor.set(&mut counter, &AttributeValue::Integer(1 << 20)));
        // wrong kind
        assert!(!accessor.set(&mut counter, &AttributeValue::Boolean(true)));
        assert_eq!(counter.value, -3);
    }

    #[test]
    fn wrong_object_type() {
        let accessor = make_accessor(|c: &Counter| c.value, |c: &mut Counter, v: i16| c.value = v);
        let mut other = Other;

        assert!(!accessor.set(&mut other, &AttributeValue::Integer(1)));
        assert_eq!(accessor.get(&other), None);
    }

    #[test]
    fn embedded_parent_object() {
        let accessor = make_accessor(|c: &Counter| c.value, |c: &mut Counter, v: i16| c.value = v);
        let tag = make_accessor(|t: &TaggedCounter| t.tag, |t: &mut TaggedCounter, v: u8| t.tag = v);
        let mut labelled = Labelled::default();

        assert!(accessor.set(&mut labelled, &AttributeValue::Integer(12)));
        assert!(tag.set(&mut labelled, &AttributeValue::Uinteger(4)));
        assert_eq!(labelled.tagged.counter.value, 12);
        assert_eq!(labelled.tagged.tag, 4);
        assert_eq!(accessor.get(&labelled), Some(AttributeValue::Integer(12)));
        assert_eq!(tag.get(&labelled.tagged), Some(AttributeValue::Uinteger(4)));

        // parents do not see their children
        assert_eq!(tag.get(&labelled.tagged.counter), None);
    }

    #[test]
    fn read_only_and_write_only() {
        let read_only = make_getter_accessor(|c: &Counter| c.hits);
        let write_only = make_setter_accessor(|c: &mut Counter, v: i16| c.value = v);
        let mut counter = Counter { value: 1, hits: 7 };

        assert!(read_only.has_getter() && !read_only.has_setter());
        assert!(!read_only.set(&mut counter, &AttributeValue::Uinteger(1)));
        assert_eq!(read_only.get(&counter), Some(AttributeValue::Uinteger(7)));

        assert!(!write_only.has_getter() && write_only.has_setter());
        assert_eq!(write_only.get(&counter), None);
        assert!(write_only.set(&mut counter, &AttributeValue::Integer(9)));
        assert_eq!(counter.value, 9);
    }
}
