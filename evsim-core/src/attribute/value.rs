use crate::{
    Time,
    attribute::AttributeChecker,
    object::{Object, Ptr},
};
use std::fmt;

/// The value of an attribute
///
/// A closed set of value kinds. Every value can be turned into a string
/// and read back from a string, with the help of the [`AttributeChecker`]
/// of the attribute it belongs to (enumerations need the checker's name
/// table).
#[derive(Clone)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Uinteger(u64),
    Double(f64),
    /// enumeration, stored as the numeric value of the variant
    Enum(i64),
    String(String),
    Time(Time),
    /// handle to another object, or none
    Object(Option<Ptr>),
}

impl AttributeValue {
    /// name of the value kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Uinteger(_) => "Uinteger",
            Self::Double(_) => "Double",
            Self::Enum(_) => "Enum",
            Self::String(_) => "String",
            Self::Time(_) => "Time",
            Self::Object(_) => "Object",
        }
    }

    /// a copy of the value
    ///
    /// Object values share the handle with the original, the object
    /// itself is not duplicated.
    #[inline]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn serialize_to_string(&self, checker: &dyn AttributeChecker) -> String {
        match self {
            Self::Boolean(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Uinteger(value) => value.to_string(),
            Self::Double(value) => value.to_string(),
            Self::Enum(value) => checker
                .enum_variants()
                .iter()
                .find(|(variant, _)| variant == value)
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| value.to_string()),
            Self::String(value) => value.clone(),
            Self::Time(value) => value.to_string(),
            Self::Object(None) => "0".to_owned(),
            Self::Object(Some(object)) => object.type_name(),
        }
    }

    /// read the value back from `text`
    ///
    /// The kind of the value is kept: `self` must already hold a value of
    /// the expected kind (see [`AttributeChecker::create`]). On failure
    /// `self` is left untouched and `false` is returned.
    ///
    /// Object handles cannot be read from text, only `"0"` (no object)
    /// is accepted.
    pub fn deserialize_from_string(&mut self, text: &str, checker: &dyn AttributeChecker) -> bool {
        let text = text.trim();
        let parsed = match self {
            Self::Boolean(_) => match text {
                "true" | "1" => Some(Self::Boolean(true)),
                "false" | "0" => Some(Self::Boolean(false)),
                _ => None,
            },
            Self::Integer(_) => text.parse().ok().map(Self::Integer),
            Self::Uinteger(_) => text.parse().ok().map(Self::Uinteger),
            Self::Double(_) => text.parse().ok().map(Self::Double),
            Self::Enum(_) => checker
                .enum_variants()
                .iter()
                .find(|(_, name)| name == text)
                .map(|(variant, _)| Self::Enum(*variant)),
            Self::String(_) => Some(Self::String(text.to_owned())),
            Self::Time(_) => text.parse().ok().map(Self::Time),
            Self::Object(_) => match text {
                "0" | "null" => Some(Self::Object(None)),
                _ => None,
            },
        };

        match parsed {
            Some(value) => {
                *self = value;
                true
            }
            None => false,
        }
    }

    /// convert into the Rust type `T`, `None` if the kinds do not match
    /// or if the value does not fit in `T`
    pub fn get<T: AttributeType>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Uinteger(a), Self::Uinteger(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "Boolean({value})"),
            Self::Integer(value) => write!(f, "Integer({value})"),
            Self::Uinteger(value) => write!(f, "Uinteger({value})"),
            Self::Double(value) => write!(f, "Double({value})"),
            Self::Enum(value) => write!(f, "Enum({value})"),
            Self::String(value) => write!(f, "String({value:?})"),
            Self::Time(value) => write!(f, "Time({value})"),
            Self::Object(None) => f.write_str("Object(null)"),
            Self::Object(Some(object)) => write!(f, "Object({})", object.type_name()),
        }
    }
}

/// Rust types that can be stored in an [`AttributeValue`]
pub trait AttributeType: Sized {
    fn into_value(self) -> AttributeValue;

    fn from_value(value: &AttributeValue) -> Option<Self>;
}

macro_rules! integer_attribute_type {
    ($($ty:ty),*) => {
        $(
            impl AttributeType for $ty {
                fn into_value(self) -> AttributeValue {
                    AttributeValue::Integer(i64::from(self))
                }

                fn from_value(value: &AttributeValue) -> Option<Self> {
                    match value {
                        AttributeValue::Integer(value) => Self::try_from(*value).ok(),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

macro_rules! uinteger_attribute_type {
    ($($ty:ty),*) => {
        $(
            impl AttributeType for $ty {
                fn into_value(self) -> AttributeValue {
                    AttributeValue::Uinteger(u64::from(self))
                }

                fn from_value(value: &AttributeValue) -> Option<Self> {
                    match value {
                        AttributeValue::Uinteger(value) => Self::try_from(*value).ok(),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

integer_attribute_type!(i8, i16, i32, i64);
uinteger_attribute_type!(u8, u16, u32, u64);

impl AttributeType for f64 {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Double(self)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Double(value) => Some(*value),
            _ => None,
        }
    }
}

impl AttributeType for f32 {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Double(f64::from(self))
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Double(value) => Some(*value as f32),
            _ => None,
        }
    }
}

impl AttributeType for bool {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Boolean(self)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl AttributeType for String {
    fn into_value(self) -> AttributeValue {
        AttributeValue::String(self)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl AttributeType for Time {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Time(self)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Time(value) => Some(*value),
            _ => None,
        }
    }
}

/// Numeric value of an enumeration variant
///
/// Accessors of enumeration attributes read and write this type, the
/// names of the variants are only known to the attribute's checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumValue(pub i64);

impl AttributeType for EnumValue {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Enum(self.0)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Enum(value) => Some(Self(*value)),
            _ => None,
        }
    }
}

impl From<EnumValue> for AttributeValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value.0)
    }
}

impl AttributeType for Option<Ptr> {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Object(self)
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Object(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T: Object> AttributeType for Option<Ptr<T>> {
    fn into_value(self) -> AttributeValue {
        AttributeValue::Object(self.map(Ptr::into_object))
    }

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Object(None) => Some(None),
            AttributeValue::Object(Some(object)) => object.downcast::<T>().map(Some),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        value.into_value()
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Time> for AttributeValue {
    fn from(value: Time) -> Self {
        Self::Time(value)
    }
}

impl From<Option<Ptr>> for AttributeValue {
    fn from(value: Option<Ptr>) -> Self {
        Self::Object(value)
    }
}

impl From<Ptr> for AttributeValue {
    fn from(value: Ptr) -> Self {
        Self::Object(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{
        make_boolean_checker, make_double_checker, make_enum_checker, make_integer_checker,
        make_string_checker, make_time_checker, make_uinteger_checker,
    };

    fn round_trip(value: AttributeValue, checker: &dyn AttributeChecker) {
        let text = value.serialize_to_string(checker);
        let mut back = checker.create();
        assert!(back.deserialize_from_string(&text, checker), "{text}");
        assert_eq!(back, value, "{text}");
    }

    #[test]
    fn string_forms() {
        round_trip(AttributeValue::Boolean(true), &*make_boolean_checker());
        round_trip(AttributeValue::Integer(-32768), &*make_integer_checker::<i16>());
        round_trip(AttributeValue::Uinteger(255), &*make_uinteger_checker::<u8>());
        round_trip(AttributeValue::Double(-1.1), &*make_double_checker::<f64>());
        round_trip(AttributeValue::String("hello".into()), &*make_string_checker());
        round_trip(AttributeValue::Time(Time::from_micros(1_500)), &*make_time_checker());
    }

    #[test]
    fn enum_uses_variant_names() {
        let checker = make_enum_checker([(0, "TestA"), (1, "TestB"), (2, "TestC")]);

        let value = AttributeValue::Enum(1);
        assert_eq!(value.serialize_to_string(&*checker), "TestB");

        let mut value = checker.create();
        assert!(value.deserialize_from_string("TestC", &*checker));
        assert_eq!(value, AttributeValue::Enum(2));
        assert!(!value.deserialize_from_string("TestD", &*checker));
        assert_eq!(value, AttributeValue::Enum(2));
    }

    #[test]
    fn failed_parse_leaves_value() {
        let checker = make_uinteger_checker::<u8>();
        let mut value = AttributeValue::Uinteger(3);

        assert!(!value.deserialize_from_string("-1", &*checker));
        assert_eq!(value, AttributeValue::Uinteger(3));

        let checker = make_boolean_checker();
        let mut value = AttributeValue::Boolean(false);
        assert!(!value.deserialize_from_string("maybe", &*checker));
        assert!(value.deserialize_from_string("1", &*checker));
        assert_eq!(value, AttributeValue::Boolean(true));
    }

    #[test]
    fn rust_conversions() {
        assert_eq!(AttributeValue::Integer(-5).get::<i16>(), Some(-5));
        assert_eq!(AttributeValue::Integer(40_000).get::<i16>(), None);
        assert_eq!(AttributeValue::Uinteger(255).get::<u8>(), Some(255));
        assert_eq!(AttributeValue::Uinteger(256).get::<u8>(), None);
        assert_eq!(AttributeValue::Integer(1).get::<u8>(), None);
        assert_eq!(AttributeValue::from(2.5f32).get::<f32>(), Some(2.5));
        assert_eq!(AttributeValue::from("x").get::<String>(), Some("x".to_owned()));
        assert_eq!(AttributeValue::from(5), AttributeValue::Integer(5));
        assert_eq!(AttributeValue::from(5u32), AttributeValue::Uinteger(5));
        assert_eq!(AttributeValue::from(EnumValue(2)).get::<EnumValue>(), Some(EnumValue(2)));
        assert_eq!(AttributeValue::Integer(2).get::<EnumValue>(), None);
    }
}
