// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The local sector sealing pipeline used by a storage miner.
//!
//! Client pieces are allocated space in a sector, streamed in against a deal, and the sector is
//! then moved through pre-commit and commit until it is proving. Nothing here touches chain
//! state; the miner actor learns of committed sectors separately.

use std::io::Read;

use storage_actors_runtime::{DealID, SectorNumber};

pub use self::config::*;
pub use self::error::SealingError;
pub use self::memory::MemorySealing;
pub use self::miner::Miner;
pub use self::sector::{Piece, SectorInfo, SectorState};

mod config;
mod error;
mod memory;
mod miner;
mod sector;

/// Operations offered by a sealing subsystem.
pub trait Sealing {
    /// Reserves `size` bytes in a sector accepting pieces.
    /// Returns the sector and the offset of the reserved space within it.
    fn allocate_piece(&mut self, size: u64) -> Result<(SectorNumber, u64), SealingError>;

    /// Reads exactly `size` bytes of piece data into a previously allocated slot of `sector_id`,
    /// recording the piece against `deal_id`.
    fn seal_piece(
        &mut self,
        size: u64,
        reader: &mut dyn Read,
        sector_id: SectorNumber,
        deal_id: DealID,
    ) -> Result<(), SealingError>;

    fn list_sectors(&self) -> Result<Vec<SectorInfo>, SealingError>;

    fn get_sector_info(&self, sector_id: SectorNumber) -> Result<SectorInfo, SealingError>;

    /// Creates a sector filled with pledge data, carrying no deals.
    fn pledge_sector(&mut self) -> Result<SectorNumber, SealingError>;

    /// Sets the state of a sector regardless of where it is in the pipeline.
    fn force_sector_state(
        &mut self,
        sector_id: SectorNumber,
        state: SectorState,
    ) -> Result<(), SealingError>;
}
