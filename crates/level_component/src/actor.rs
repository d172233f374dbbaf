//! Level actor kinds and bitmask filters over them.

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// The kind of level actor that owns a [`MapComponent`](crate::MapComponent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActorType {
    Wall,
    Box,
    Bomb,
    Item,
    Player,
}

impl ActorType {
    pub const ALL: [ActorType; 5] = [
        ActorType::Wall,
        ActorType::Box,
        ActorType::Bomb,
        ActorType::Item,
        ActorType::Player,
    ];

    /// Single-bit flag for this actor type.
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActorType::Wall => "wall",
            ActorType::Box => "box",
            ActorType::Bomb => "bomb",
            ActorType::Item => "item",
            ActorType::Player => "player",
        };
        f.write_str(name)
    }
}

/// A set of [`ActorType`]s packed into a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActorTypeMask(u8);

impl ActorTypeMask {
    pub const NONE: ActorTypeMask = ActorTypeMask(0);
    pub const ALL: ActorTypeMask = ActorTypeMask(0b1_1111);

    /// Builds a mask from raw bits. Bits outside the known types are dropped.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, actor_type: ActorType) -> bool {
        self.0 & actor_type.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<ActorType> for ActorTypeMask {
    fn from(actor_type: ActorType) -> Self {
        Self(actor_type.bit())
    }
}

impl BitOr for ActorTypeMask {
    type Output = ActorTypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ActorType> for ActorTypeMask {
    type Output = ActorTypeMask;

    fn bitor(self, rhs: ActorType) -> Self::Output {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for ActorType {
    type Output = ActorTypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ActorTypeMask(self.bit() | rhs.bit())
    }
}

impl FromIterator<ActorType> for ActorTypeMask {
    fn from_iter<I: IntoIterator<Item = ActorType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |mask, ty| mask | ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_distinct() {
        let combined: u8 = ActorType::ALL.iter().map(|ty| ty.bit()).fold(0, |a, b| {
            assert_eq!(a & b, 0);
            a | b
        });
        assert_eq!(combined, ActorTypeMask::ALL.bits());
    }

    #[test]
    fn test_mask_contains() {
        let mask = ActorType::Wall | ActorType::Box;
        assert!(mask.contains(ActorType::Wall));
        assert!(mask.contains(ActorType::Box));
        assert!(!mask.contains(ActorType::Player));
        assert!(!ActorTypeMask::NONE.contains(ActorType::Wall));
        assert!(ActorTypeMask::ALL.contains(ActorType::Player));
    }

    #[test]
    fn test_mask_from_iter() {
        let mask: ActorTypeMask = [ActorType::Bomb, ActorType::Item].into_iter().collect();
        assert_eq!(mask, ActorType::Bomb | ActorType::Item);
        assert!(ActorTypeMask::from_iter(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_from_bits_drops_unknown() {
        assert_eq!(ActorTypeMask::from_bits(0xFF), ActorTypeMask::ALL);
    }
}
