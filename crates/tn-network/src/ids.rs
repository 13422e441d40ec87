//! Index newtypes for network records
//!
//! Records are stored in vectors and never physically removed, so indices
//! stay valid for the lifetime of a layer and all of its copies.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the owning vector
            #[inline]
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Wrap a vector position
            #[inline]
            #[must_use]
            #[allow(clippy::cast_possible_truncation)]
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_type!(
    /// Street vertex index
    VertexId,
    "v"
);
index_type!(
    /// Street edge index
    EdgeId,
    "e"
);
index_type!(
    /// Transit stop index
    StopIndex,
    "s"
);
index_type!(
    /// Trip pattern index
    PatternIndex,
    "p"
);
index_type!(
    /// Route index
    RouteIndex,
    "r"
);
