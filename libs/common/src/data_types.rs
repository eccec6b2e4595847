//! Bitflag classification of rooms, used for filtering and sorting.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of room classification flags packed into a `u64`.
///
/// A room summary carries every flag that applies to it; filter options use
/// the same type as include/exclude masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTypes(pub u64);

// Room data-type flags.
pub const INVITED: DataTypes = DataTypes(1 << 0);
pub const FAVORITED: DataTypes = DataTypes(1 << 1);
pub const DIRECT: DataTypes = DataTypes(1 << 2);
pub const LOW_PRIORITY: DataTypes = DataTypes(1 << 3);
pub const SERVER_NOTICE: DataTypes = DataTypes(1 << 4);
pub const HIDDEN: DataTypes = DataTypes(1 << 5);
pub const SPACE: DataTypes = DataTypes(1 << 6);
pub const CONFERENCE_USER: DataTypes = DataTypes(1 << 7);
pub const UNREAD: DataTypes = DataTypes(1 << 8);

impl DataTypes {
    /// The empty flag set.
    pub const fn empty() -> Self {
        DataTypes(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if at least one flag of `other` is present in `self`.
    pub const fn contains_any(self, other: DataTypes) -> bool {
        self.0 & other.0 != 0
    }

    /// `true` if every flag of `other` is present in `self`.
    pub const fn contains_all(self, other: DataTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DataTypes {
    type Output = DataTypes;

    fn bitor(self, rhs: DataTypes) -> DataTypes {
        DataTypes(self.0 | rhs.0)
    }
}

impl BitOrAssign for DataTypes {
    fn bitor_assign(&mut self, rhs: DataTypes) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DataTypes {
    type Output = DataTypes;

    fn bitand(self, rhs: DataTypes) -> DataTypes {
        DataTypes(self.0 & rhs.0)
    }
}
