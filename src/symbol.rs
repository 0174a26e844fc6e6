//! Key element types.

use std::fmt::Debug;

/// A key element that maps onto a child slot.
///
/// The trie masks `to_index()` with `RANGE - 1`, so values outside the fan-out
/// alias onto lower slots. Keys rebuilt during traversal go through
/// `from_index` and therefore carry the masked value.
pub trait Symbol: Copy + Eq + Ord + Debug {
    fn to_index(self) -> usize;

    fn from_index(index: usize) -> Self;
}

macro_rules! impl_symbol {
    ($($t:ty),*) => {
        $(
            impl Symbol for $t {
                #[inline]
                fn to_index(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_index(index: usize) -> Self {
                    index as $t
                }
            }
        )*
    };
}

impl_symbol!(u8, u16, u32, u64, usize);
