//! Strongly typed indices and the vectors they index.

pub mod vec;

use std::fmt::Debug;
use std::hash::Hash;

/// Represents some newtyped `usize` wrapper.
///
/// Purpose: avoid mixing indexes for different bitvector domains.
pub trait Idx: Copy + 'static + Eq + PartialEq + Debug + Hash {
    fn new(idx: usize) -> Self;

    fn index(self) -> usize;

    fn increment_by(&mut self, amount: usize) {
        *self = self.plus(amount);
    }

    fn plus(self, amount: usize) -> Self {
        Self::new(self.index() + amount)
    }
}

impl Idx for usize {
    #[inline]
    fn new(idx: usize) -> Self {
        idx
    }
    #[inline]
    fn index(self) -> usize {
        self
    }
}

impl Idx for u32 {
    #[inline]
    fn new(idx: usize) -> Self {
        assert!(idx <= u32::MAX as usize);
        idx as u32
    }
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Creates a struct type `S` that can be used as an index with
/// `IndexVec` and so on.
///
/// There are two ways of interacting with these indices:
///
/// - The `From` impls are the preferred way. So you can do
///   `S::from(v)` with a `usize` or `u32`. And you can convert back
///   to an integer with `u32::from(s)`.
///
/// - Alternatively, you can use the methods `S::new(v)` and `s.index()`
///   to create/return a value.
///
/// The debug representation defaults to `Name(index)` and can be changed
/// with `DEBUG_FORMAT = "..."`.
#[macro_export]
macro_rules! newtype_index {
    ($(#[$attrs:meta])* $v:vis struct $name:ident { .. }) => {
        $crate::newtype_index!(@decl [$(#[$attrs])*] $v $name [concat!(stringify!($name), "({})")]);
    };

    ($(#[$attrs:meta])* $v:vis struct $name:ident { DEBUG_FORMAT = $fmt:literal }) => {
        $crate::newtype_index!(@decl [$(#[$attrs])*] $v $name [$fmt]);
    };

    (@decl [$(#[$attrs:meta])*] $v:vis $name:ident [$fmt:expr]) => {
        $(#[$attrs])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $v struct $name {
            private: u32,
        }

        impl $name {
            /// Maximum value the index can take.
            $v const MAX_AS_U32: u32 = u32::MAX - 1;

            /// Maximum value the index can take.
            $v const MAX: Self = Self::from_u32(u32::MAX - 1);

            #[inline]
            $v const fn from_usize(value: usize) -> Self {
                assert!(value <= (u32::MAX - 1) as usize);
                Self { private: value as u32 }
            }

            #[inline]
            $v const fn from_u32(value: u32) -> Self {
                assert!(value <= u32::MAX - 1);
                Self { private: value }
            }

            /// Extracts the value of this index as a `usize`.
            #[inline]
            $v const fn index(self) -> usize {
                self.private as usize
            }

            /// Extracts the value of this index as a `u32`.
            #[inline]
            $v const fn as_u32(self) -> u32 {
                self.private
            }

            /// Extracts the value of this index as a `usize`.
            #[inline]
            $v const fn as_usize(self) -> usize {
                self.private as usize
            }
        }

        impl $crate::Idx for $name {
            #[inline]
            fn new(value: usize) -> Self {
                Self::from_usize(value)
            }

            #[inline]
            fn index(self) -> usize {
                self.private as usize
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(v: $name) -> u32 {
                v.as_u32()
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(v: $name) -> usize {
                v.as_usize()
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(value: usize) -> Self {
                Self::from_usize(value)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(value: u32) -> Self {
                Self::from_u32(value)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(fmt, $fmt, self.as_u32())
            }
        }
    };
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::vec::IndexVec;
    use super::Idx;

    newtype_index!(struct TestId { .. });
    newtype_index!(struct OtherId { DEBUG_FORMAT = "o{}" });

    #[test]
    fn testPushReturnsSequentialIds() {
        let mut v: IndexVec<TestId, &str> = IndexVec::new();
        let a = v.push("a");
        let b = v.push("b");
        assert_eq!(a.index(), 0);
        assert_eq!(b, TestId::new(1));
        assert_eq!(v[b], "b");
        assert_eq!(v.next_index(), TestId::from_usize(2));
    }

    #[test]
    fn testDebugFormat() {
        assert_eq!(format!("{:?}", TestId::from_u32(3)), "TestId(3)");
        assert_eq!(format!("{:?}", OtherId::from_u32(7)), "o7");
    }
}
