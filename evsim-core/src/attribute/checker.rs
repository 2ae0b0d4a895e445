use crate::{
    Time,
    attribute::AttributeValue,
    object::{Object, Ptr},
};
use std::{any::type_name, rc::Rc};

/// Validates the values of one attribute
///
/// A checker is shared between the attribute descriptor of a type and
/// every [`AttributeList`] entry for that attribute. Its identity (the
/// shared allocation, not its content) is what identifies the attribute.
///
/// [`AttributeList`]: crate::AttributeList
pub trait AttributeChecker {
    /// `value` is of the right kind and within the constraints
    fn check(&self, value: &AttributeValue) -> bool;

    /// name of the kind of values accepted
    fn value_type(&self) -> &'static str;

    /// human readable constraints, if any
    fn type_constraints(&self) -> Option<String> {
        None
    }

    /// a fresh default value of the right kind
    fn create(&self) -> AttributeValue;

    /// numeric value and name of the variants of an enumeration
    fn enum_variants(&self) -> &[(i64, String)] {
        &[]
    }
}

pub type Checker = Rc<dyn AttributeChecker>;

/// both handles refer to the same checker
#[inline]
pub fn same_checker(a: &Checker, b: &Checker) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// `value` accepted by `checker` as is or, for a string, once converted
/// to the checker's kind
pub(crate) fn checked_value(checker: &dyn AttributeChecker, value: AttributeValue) -> Option<AttributeValue> {
    if checker.check(&value) {
        return Some(value);
    }

    let AttributeValue::String(text) = &value else {
        return None;
    };

    let mut converted = checker.create();
    if converted.deserialize_from_string(text, checker) && checker.check(&converted) {
        Some(converted)
    } else {
        None
    }
}

/// Bounds of the signed integer types usable with
/// [`make_integer_checker`]
pub trait IntegerBounds {
    const MIN: i64;
    const MAX: i64;
}

/// Bounds of the unsigned integer types usable with
/// [`make_uinteger_checker`]
pub trait UintegerBounds {
    const MIN: u64;
    const MAX: u64;
}

/// Bounds of the floating point types usable with
/// [`make_double_checker`]
pub trait DoubleBounds {
    const MIN: f64;
    const MAX: f64;
}

macro_rules! integer_bounds {
    ($($ty:ty),*) => {
        $(
            impl IntegerBounds for $ty {
                const MIN: i64 = <$ty>::MIN as i64;
                const MAX: i64 = <$ty>::MAX as i64;
            }
        )*
    };
}

macro_rules! uinteger_bounds {
    ($($ty:ty),*) => {
        $(
            impl UintegerBounds for $ty {
                const MIN: u64 = <$ty>::MIN as u64;
                const MAX: u64 = <$ty>::MAX as u64;
            }
        )*
    };
}

integer_bounds!(i8, i16, i32, i64);
uinteger_bounds!(u8, u16, u32, u64);

impl DoubleBounds for f32 {
    const MIN: f64 = f32::MIN as f64;
    const MAX: f64 = f32::MAX as f64;
}

impl DoubleBounds for f64 {
    const MIN: f64 = f64::MIN;
    const MAX: f64 = f64::MAX;
}

struct BooleanChecker;

impl AttributeChecker for BooleanChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::Boolean(_))
    }

    fn value_type(&self) -> &'static str {
        "Boolean"
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Boolean(false)
    }
}

struct IntegerChecker {
    min: i64,
    max: i64,
}

impl AttributeChecker for IntegerChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::Integer(v) if (self.min..=self.max).contains(v))
    }

    fn value_type(&self) -> &'static str {
        "Integer"
    }

    fn type_constraints(&self) -> Option<String> {
        Some(format!("{}:{}", self.min, self.max))
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Integer(0i64.clamp(self.min, self.max))
    }
}

struct UintegerChecker {
    min: u64,
    max: u64,
}

impl AttributeChecker for UintegerChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::Uinteger(v) if (self.min..=self.max).contains(v))
    }

    fn value_type(&self) -> &'static str {
        "Uinteger"
    }

    fn type_constraints(&self) -> Option<String> {
        Some(format!("{}:{}", self.min, self.max))
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Uinteger(self.min)
    }
}

struct DoubleChecker {
    min: f64,
    max: f64,
}

impl AttributeChecker for DoubleChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::Double(v) if *v >= self.min && *v <= self.max)
    }

    fn value_type(&self) -> &'static str {
        "Double"
    }

    fn type_constraints(&self) -> Option<String> {
        Some(format!("{}:{}", self.min, self.max))
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Double(0f64.clamp(self.min, self.max))
    }
}

struct EnumChecker {
    variants: Vec<(i64, String)>,
}

impl AttributeChecker for EnumChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        match value {
            AttributeValue::Enum(v) => self.variants.iter().any(|(variant, _)| variant == v),
            _ => false,
        }
    }

    fn value_type(&self) -> &'static str {
        "Enum"
    }

    fn type_constraints(&self) -> Option<String> {
        let names: Vec<&str> = self.variants.iter().map(|(_, name)| name.as_str()).collect();
        Some(names.join("|"))
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Enum(self.variants.first().map(|(v, _)| *v).unwrap_or_default())
    }

    fn enum_variants(&self) -> &[(i64, String)] {
        &self.variants
    }
}

struct StringChecker;

impl AttributeChecker for StringChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::String(_))
    }

    fn value_type(&self) -> &'static str {
        "String"
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::String(String::new())
    }
}

struct TimeChecker {
    min: Time,
    max: Time,
}

impl AttributeChecker for TimeChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        matches!(value, AttributeValue::Time(v) if (self.min..=self.max).contains(v))
    }

    fn value_type(&self) -> &'static str {
        "Time"
    }

    fn type_constraints(&self) -> Option<String> {
        Some(format!("{}:{}", self.min, self.max))
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Time(self.min)
    }
}

struct ObjectChecker {
    is_a: fn(&Ptr) -> bool,
    type_name: &'static str,
}

impl AttributeChecker for ObjectChecker {
    fn check(&self, value: &AttributeValue) -> bool {
        match value {
            AttributeValue::Object(None) => true,
            AttributeValue::Object(Some(object)) => (self.is_a)(object),
            _ => false,
        }
    }

    fn value_type(&self) -> &'static str {
        "Object"
    }

    fn type_constraints(&self) -> Option<String> {
        Some(self.type_name.to_owned())
    }

    fn create(&self) -> AttributeValue {
        AttributeValue::Object(None)
    }
}

fn is_a<T: Object>(object: &Ptr) -> bool {
    object.is::<T>()
}

pub fn make_boolean_checker() -> Checker {
    Rc::new(BooleanChecker)
}

/// signed integer within the range of `T`
pub fn make_integer_checker<T: IntegerBounds>() -> Checker {
    make_integer_checker_with_range(T::MIN, T::MAX)
}

pub fn make_integer_checker_with_range(min: i64, max: i64) -> Checker {
    assert!(min <= max, "invalid integer range [{min}, {max}]");
    Rc::new(IntegerChecker { min, max })
}

/// unsigned integer within the range of `T`
pub fn make_uinteger_checker<T: UintegerBounds>() -> Checker {
    make_uinteger_checker_with_range(T::MIN, T::MAX)
}

pub fn make_uinteger_checker_with_range(min: u64, max: u64) -> Checker {
    assert!(min <= max, "invalid unsigned integer range [{min}, {max}]");
    Rc::new(UintegerChecker { min, max })
}

/// floating point value within the finite range of `T`
pub fn make_double_checker<T: DoubleBounds>() -> Checker {
    make_double_checker_with_range(T::MIN, T::MAX)
}

pub fn make_double_checker_with_range(min: f64, max: f64) -> Checker {
    assert!(min <= max, "invalid floating point range [{min}, {max}]");
    Rc::new(DoubleChecker { min, max })
}

/// enumeration accepting only the listed variants
///
/// The first variant is the default created value.
pub fn make_enum_checker<N: Into<String>>(variants: impl IntoIterator<Item = (i64, N)>) -> Checker {
    let variants: Vec<(i64, String)> = variants
        .into_iter()
        .map(|(value, name)| (value, name.into()))
        .collect();
    assert!(!variants.is_empty(), "an enumeration needs at least one variant");
    Rc::new(EnumChecker { variants })
}

pub fn make_string_checker() -> Checker {
    Rc::new(StringChecker)
}

pub fn make_time_checker() -> Checker {
    make_time_checker_with_range(Time::ZERO, Time::MAX)
}

pub fn make_time_checker_with_range(min: Time, max: Time) -> Checker {
    assert!(min <= max, "invalid time range [{min}, {max}]");
    Rc::new(TimeChecker { min, max })
}

/// handle to an object of concrete type `T`, or no object
pub fn make_object_checker<T: Object>() -> Checker {
    Rc::new(ObjectChecker {
        is_a: is_a::<T>,
        type_name: type_name::<T>(),
    })
}
