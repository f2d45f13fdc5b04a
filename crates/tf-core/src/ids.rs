//! Typed indices.
//!
//! Intersections and segments are numbered densely from zero, so an id is
//! also the position of its item in the grid's arena `Vec`s:
//!
//! | Id               | Value                            |
//! |------------------|----------------------------------|
//! | `IntersectionId` | `row * cols + col`               |
//! | `SegmentId`      | `from.index() * 4 + heading`     |
//! | `VehicleId`      | generation order, never reused   |

use std::fmt;

macro_rules! dense_id {
    ($(#[$attr:meta])* $name:ident($inner:ty), $tag:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub $inner);

        impl $name {
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;

            fn try_from(n: usize) -> Result<Self, Self::Error> {
                <$inner>::try_from(n).map(Self)
            }
        }
    };
}

dense_id!(IntersectionId(u32), "I");
dense_id!(SegmentId(u32), "S");
dense_id!(
    /// 64-bit so long runs never wrap.
    VehicleId(u64),
    "V"
);
