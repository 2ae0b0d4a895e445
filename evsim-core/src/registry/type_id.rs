use std::fmt;

/// Handle to a type registered in a [`TypeRegistry`]
///
/// The handle is an index in the registry that issued it; it is only
/// meaningful for that registry.
///
/// [`TypeRegistry`]: crate::TypeRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u16);

impl TypeId {
    /// the root of every type hierarchy, registered as `"Object"`
    pub const OBJECT: Self = Self::new(0);

    pub(crate) const fn new(id: u16) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl fmt::LowerHex for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
impl fmt::UpperHex for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print() {
        assert_eq!(format!("{}", TypeId(42)), "42")
    }
    #[test]
    fn print_lower_hex() {
        assert_eq!(format!("{:x}", TypeId(42)), "2a")
    }
    #[test]
    fn print_upper_hex() {
        assert_eq!(format!("{:X}", TypeId(42)), "2A")
    }
    #[test]
    fn root() {
        assert_eq!(TypeId::OBJECT.index(), 0);
        assert_eq!(TypeId::OBJECT.into_u16(), 0);
    }
}
