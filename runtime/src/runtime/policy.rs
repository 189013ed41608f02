use std::collections::BTreeSet;

use crate::builtin::SectorSize;

pub trait RuntimePolicy {
    fn policy(&self) -> &Policy;
}

/// Chain parameters that are fixed per network but may differ between networks and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Sector sizes a storage miner may be created with.
    pub supported_sector_sizes: BTreeSet<SectorSize>,
    /// Maximum length of a peer ID in bytes.
    pub max_peer_id_length: usize,
}

impl Policy {
    pub fn is_supported_sector_size(&self, size: SectorSize) -> bool {
        self.supported_sector_sizes.contains(&size)
    }
}

impl Default for Policy {
    fn default() -> Policy {
        Policy {
            supported_sector_sizes: BTreeSet::from([policy_constants::SECTOR_SIZE]),
            max_peer_id_length: policy_constants::MAX_PEER_ID_LENGTH,
        }
    }
}

pub mod policy_constants {
    use crate::builtin::SectorSize;

    /// The only sector size accepted by default.
    pub const SECTOR_SIZE: SectorSize = 1024;

    /// Maximum length of a peer ID in bytes.
    pub const MAX_PEER_ID_LENGTH: usize = 128;
}
