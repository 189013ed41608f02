use serde::{Deserialize, Serialize};
use storage_actors_runtime::SectorSize;

pub const DEFAULT_SECTOR_SIZE: SectorSize = 1024;
pub const DEFAULT_MAX_OPEN_SECTORS: usize = 8;

/// Settings of the local sealing pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealingConfig {
    /// Capacity of every sector, in bytes.
    pub sector_size: SectorSize,
    /// How many sectors may be accepting pieces at once.
    pub max_open_sectors: usize,
}

impl Default for SealingConfig {
    fn default() -> Self {
        SealingConfig {
            sector_size: DEFAULT_SECTOR_SIZE,
            max_open_sectors: DEFAULT_MAX_OPEN_SECTORS,
        }
    }
}
