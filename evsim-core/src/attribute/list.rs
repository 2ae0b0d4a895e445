use crate::{
    TypeId, TypeRegistry,
    attribute::{AttributeInfo, AttributeValue, Checker, checked_value, same_checker},
};
use std::fmt;

#[derive(Clone)]
struct Entry {
    checker: Checker,
    value: AttributeValue,
}

/// A set of attribute values, used to override the initial values when
/// constructing objects
///
/// An attribute appears at most once: it is identified by its checker,
/// so two attributes of the same name in a type and in its parent are
/// distinct entries. Every value stored was accepted by its checker.
///
/// The textual form is `Type::Attribute=value` entries joined with `|`:
///
/// ```
/// # use evsim_core::{AttributeList, TypeRegistry, attribute::*, Object};
/// # #[derive(Default)] struct Queue { size: u32 }
/// # impl Object for Queue {}
/// let registry = TypeRegistry::new();
/// registry.register("Queue").add_attribute(
///     "MaxSize",
///     "maximum number of packets",
///     100u32,
///     make_accessor(|q: &Queue| q.size, |q: &mut Queue, v: u32| q.size = v),
///     make_uinteger_checker::<u32>(),
/// );
///
/// let mut list = AttributeList::new();
/// assert!(list.set(&registry, "Queue::MaxSize", "12"));
/// assert_eq!(list.serialize_to_string(&registry), "Queue::MaxSize=12");
/// ```
#[derive(Clone, Default)]
pub struct AttributeList {
    entries: Vec<Entry>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// remove every value
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// set the attribute named `Type::Attribute`
    ///
    /// returns false if no such attribute exists or if the value is
    /// refused by the attribute's checker.
    pub fn set(&mut self, registry: &TypeRegistry, full_name: &str, value: impl Into<AttributeValue>) -> bool {
        let Some(info) = registry.lookup_attribute_by_full_name(full_name) else {
            log::debug!("unknown attribute `{full_name}'");
            return false;
        };
        self.set_with_info(&info, value.into())
    }

    /// set the attribute `name` of the type `tid` or of one of its parents
    pub fn set_with_type_id(
        &mut self,
        registry: &TypeRegistry,
        tid: TypeId,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> bool {
        let Some(info) = registry.lookup_attribute_by_name(tid, name) else {
            log::debug!("unknown attribute `{name}' for type {}", registry.name(tid));
            return false;
        };
        self.set_with_info(&info, value.into())
    }

    /// set the attribute registered at `position` in the type `tid`
    pub fn set_with_position(
        &mut self,
        registry: &TypeRegistry,
        tid: TypeId,
        position: usize,
        value: impl Into<AttributeValue>,
    ) -> bool {
        let Some(info) = registry.lookup_attribute_by_position(tid, position) else {
            return false;
        };
        self.set_with_info(&info, value.into())
    }

    fn set_with_info(&mut self, info: &AttributeInfo, value: AttributeValue) -> bool {
        let Some(value) = checked_value(&*info.checker, value) else {
            log::debug!("value refused for attribute `{}'", info.name);
            return false;
        };
        self.insert(&info.checker, value);
        true
    }

    /// store an already checked value, replacing the previous value of the
    /// same attribute
    pub(crate) fn insert(&mut self, checker: &Checker, value: AttributeValue) {
        match self
            .entries
            .iter_mut()
            .find(|entry| same_checker(&entry.checker, checker))
        {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                checker: Checker::clone(checker),
                value,
            }),
        }
    }

    /// value stored for the attribute identified by `checker`
    pub fn find(&self, checker: &Checker) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|entry| same_checker(&entry.checker, checker))
            .map(|entry| &entry.value)
    }

    pub fn serialize_to_string(&self, registry: &TypeRegistry) -> String {
        let mut parts = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let Some(full_name) = registry.attribute_full_name_of(&entry.checker) else {
                continue;
            };
            parts.push(format!(
                "{full_name}={}",
                entry.value.serialize_to_string(&*entry.checker)
            ));
        }
        parts.join("|")
    }

    /// read entries from the textual form, merging them into this list
    ///
    /// Nothing is merged unless every entry names a known attribute and
    /// carries a value its checker accepts.
    pub fn deserialize_from_string(&mut self, registry: &TypeRegistry, text: &str) -> bool {
        let mut parsed = self.clone();

        for part in text.split('|').map(str::trim).filter(|part| !part.is_empty()) {
            let Some((name, value)) = part.split_once('=') else {
                log::debug!("missing `=' in attribute entry `{part}'");
                return false;
            };
            if !parsed.set(registry, name.trim(), value.trim()) {
                return false;
            }
        }

        *self = parsed;
        true
    }
}

impl fmt::Debug for AttributeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.value))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Object,
        attribute::{EnumValue, make_accessor, make_enum_checker, make_integer_checker_with_range},
    };

    #[derive(Default)]
    struct Queue {
        size: i64,
        mode: i64,
    }
    impl Object for Queue {}

    fn registry() -> (TypeRegistry, TypeId) {
        let registry = TypeRegistry::new();
        let tid = registry
            .register("Queue")
            .add_attribute(
                "Size",
                "",
                10i64,
                make_accessor(|q: &Queue| q.size, |q: &mut Queue, v: i64| q.size = v),
                make_integer_checker_with_range(0, 100),
            )
            .add_attribute(
                "Mode",
                "",
                EnumValue(0),
                make_accessor(|q: &Queue| EnumValue(q.mode), |q: &mut Queue, v: EnumValue| q.mode = v.0),
                make_enum_checker([(0, "Fifo"), (1, "Lifo")]),
            )
            .id();
        (registry, tid)
    }

    #[test]
    fn set_replaces_previous_value() {
        let (registry, tid) = registry();
        let mut list = AttributeList::new();

        assert!(list.set(&registry, "Queue::Size", 5i64));
        assert!(list.set_with_type_id(&registry, tid, "Size", 7i64));
        assert_eq!(list.len(), 1);
        assert!(list.set_with_position(&registry, tid, 1, "Lifo"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.serialize_to_string(&registry), "Queue::Size=7|Queue::Mode=Lifo");

        list.reset();
        assert!(list.is_empty());
    }

    #[test]
    fn refused_values() {
        let (registry, tid) = registry();
        let mut list = AttributeList::new();

        assert!(!list.set(&registry, "Queue::Size", 101i64));
        assert!(!list.set(&registry, "Queue::Size", "many"));
        assert!(!list.set(&registry, "Queue::Missing", 1i64));
        assert!(!list.set(&registry, "Size", 1i64));
        assert!(!list.set_with_position(&registry, tid, 2, 1i64));
        assert!(list.is_empty());
    }

    #[test]
    fn deserialize() {
        let (registry, _) = registry();
        let mut list = AttributeList::new();

        assert!(list.deserialize_from_string(&registry, "Queue::Size=42 | Queue::Mode=Lifo"));
        let text = list.serialize_to_string(&registry);
        assert_eq!(text, "Queue::Size=42|Queue::Mode=Lifo");

        let mut back = AttributeList::new();
        assert!(back.deserialize_from_string(&registry, &text));
        assert_eq!(back.serialize_to_string(&registry), text);
    }

    #[test]
    fn deserialize_is_all_or_nothing() {
        let (registry, _) = registry();
        let mut list = AttributeList::new();
        assert!(list.set(&registry, "Queue::Size", 1i64));

        assert!(!list.deserialize_from_string(&registry, "Queue::Size=2|Queue::Mode=Random"));
        assert!(!list.deserialize_from_string(&registry, "Queue::Size"));
        assert_eq!(list.serialize_to_string(&registry), "Queue::Size=1");
    }
}
