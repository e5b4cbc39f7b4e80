//! Content flags for collision filtering and volume tagging.
//!
//! Solid brushes use these to decide what a sweep collides with. Non-solid
//! volumes (water, ladders) carry them as tags so movement modes can find the
//! volumes they care about among everything the body touches.

use serde::{Deserialize, Serialize};

/// Content flags describe what type of volume something is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space - nothing here.
    pub const EMPTY: Self = Self(0);

    /// Solid world geometry - walls, floors, props.
    pub const SOLID: Self = Self(1 << 0);

    /// Water volume - swimming.
    pub const WATER: Self = Self(1 << 1);

    /// Climbable volume - ladders, vines, climbing walls.
    pub const LADDER: Self = Self(1 << 2);

    /// Player clip - blocks characters but nothing else.
    pub const PLAYER_CLIP: Self = Self(1 << 3);

    /// Trigger volume - touched but never collided with.
    pub const TRIGGER: Self = Self(1 << 4);

    /// Another character's body.
    pub const PLAYER_BODY: Self = Self(1 << 5);

    /// Debris that characters walk through.
    pub const DEBRIS: Self = Self(1 << 6);

    /// Standard mask for character body sweeps.
    pub const MASK_PLAYER_SOLID: Self = Self(
        Self::SOLID.0 | Self::PLAYER_CLIP.0 | Self::PLAYER_BODY.0,
    );

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two flag sets.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for ContentFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
