use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable handle for a registered zone.
///
/// Zones live in an arena (`Vec` slot per zone); the id is the slot index.
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<ZoneId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(NonZeroU32);

impl ZoneId {
    /// Create an id from a 0-based slot index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::new(index + 1).expect("index+1 is nonzero"))
    }

    /// Recover the 0-based slot index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Slot index as `usize`, for indexing arena storage.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneId({})", self.index())
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.index())
    }
}
