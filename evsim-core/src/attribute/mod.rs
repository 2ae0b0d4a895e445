/*!
Typed, named object parameters

An attribute is declared once per type in the [`TypeRegistry`]: a name,
a help string, [`AttributeFlags`], an initial [`AttributeValue`], an
[`AttributeAccessor`] reaching into the object and an [`AttributeChecker`]
validating the values. Attributes can then be set by name, from typed
values or from strings, when an object is constructed (through an
[`AttributeList`]) or later on a live object.

[`TypeRegistry`]: crate::TypeRegistry
*/

mod accessor;
mod checker;
mod list;
mod value;

pub use self::{
    accessor::{
        Accessor, AttributeAccessor, make_accessor, make_getter_accessor, make_setter_accessor,
    },
    checker::{
        AttributeChecker, Checker, DoubleBounds, IntegerBounds, UintegerBounds,
        make_boolean_checker, make_double_checker, make_double_checker_with_range,
        make_enum_checker, make_integer_checker, make_integer_checker_with_range,
        make_object_checker, make_string_checker, make_time_checker,
        make_time_checker_with_range, make_uinteger_checker, make_uinteger_checker_with_range,
        same_checker,
    },
    list::AttributeList,
    value::{AttributeType, AttributeValue, EnumValue},
};
pub(crate) use self::checker::checked_value;
use crate::TypeId;
use std::{fmt, ops::BitOr};

/// When an attribute may be used
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeFlags(u8);

impl AttributeFlags {
    /// applied when the object is constructed
    pub const CONSTRUCT: Self = Self(0b001);
    /// readable on a live object
    pub const GET: Self = Self(0b010);
    /// writable on a live object
    pub const SET: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for AttributeFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for AttributeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::CONSTRUCT, "CONSTRUCT"),
            (Self::GET, "GET"),
            (Self::SET, "SET"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        write!(f, "AttributeFlags({})", names.join(" | "))
    }
}

/// An attribute as declared in the type registry
#[derive(Clone)]
pub struct AttributeInfo {
    /// the type that declared the attribute
    pub owner: TypeId,
    pub name: String,
    pub help: String,
    pub flags: AttributeFlags,
    pub initial: AttributeValue,
    pub accessor: Accessor,
    pub checker: Checker,
}

impl fmt::Debug for AttributeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeInfo")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}
