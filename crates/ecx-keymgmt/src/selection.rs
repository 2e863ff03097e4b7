//! Key component selection flags.

use bitflags::bitflags;

bitflags! {
    /// Which parts of a key an operation acts on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Selection: u32 {
        const PRIVATE_KEY = 0x01;
        const PUBLIC_KEY = 0x02;
        const DOMAIN_PARAMETERS = 0x04;
        const OTHER_PARAMETERS = 0x80;

        const KEYPAIR = Self::PRIVATE_KEY.bits() | Self::PUBLIC_KEY.bits();
        const ALL_PARAMETERS = Self::DOMAIN_PARAMETERS.bits() | Self::OTHER_PARAMETERS.bits();
        const ALL = Self::KEYPAIR.bits() | Self::ALL_PARAMETERS.bits();
    }
}

impl Selection {
    /// Selections this key manager understands.
    pub const POSSIBLE: Selection = Selection::ALL;

    /// True if any supported part is requested.
    pub fn is_supported(self) -> bool {
        self.intersects(Self::POSSIBLE)
    }

    pub fn wants_private(self) -> bool {
        self.contains(Self::PRIVATE_KEY)
    }

    pub fn wants_public(self) -> bool {
        self.contains(Self::PUBLIC_KEY)
    }

    /// True only when both halves of the key pair are requested.
    pub fn wants_keypair(self) -> bool {
        self.contains(Self::KEYPAIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_composition() {
        assert_eq!(Selection::KEYPAIR, Selection::PRIVATE_KEY | Selection::PUBLIC_KEY);
        assert!(Selection::KEYPAIR.wants_keypair());
        assert!(!Selection::PUBLIC_KEY.wants_keypair());
        assert!(Selection::ALL.wants_keypair());
    }

    #[test]
    fn test_is_supported() {
        assert!(!Selection::empty().is_supported());
        assert!(Selection::DOMAIN_PARAMETERS.is_supported());
        assert!(Selection::PUBLIC_KEY.is_supported());
    }
}
