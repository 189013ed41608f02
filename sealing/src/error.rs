use storage_actors_runtime::{SectorNumber, SectorSize};
use thiserror::Error;

use crate::SectorState;

/// Sealing subsystem error
#[derive(Debug, Error)]
pub enum SealingError {
    #[error("piece size must be non-zero")]
    EmptyPiece,
    #[error("piece of {size} bytes does not fit in a {sector_size} byte sector")]
    PieceTooLarge { size: u64, sector_size: SectorSize },
    #[error("no room for a new sector: {0} sectors already open")]
    TooManyOpenSectors(usize),
    #[error("sector {0} not found")]
    UnknownSector(SectorNumber),
    #[error("sector {sector} has no unsealed allocation of {size} bytes")]
    NoAllocation { sector: SectorNumber, size: u64 },
    #[error("sector {sector} cannot advance from state {state}")]
    InvalidTransition { sector: SectorNumber, state: SectorState },
    #[error("failed to read piece data: {0}")]
    Io(#[from] std::io::Error),
}
