use std::io::Read;

use storage_actors_runtime::{DealID, SectorNumber};

use crate::{Sealing, SealingError, SectorInfo, SectorState};

/// The storage miner's view of its sealing subsystem.
pub struct Miner<S> {
    sealing: S,
}

impl<S: Sealing> Miner<S> {
    pub fn new(sealing: S) -> Self {
        Miner { sealing }
    }

    pub fn sealing(&self) -> &S {
        &self.sealing
    }

    pub fn sealing_mut(&mut self) -> &mut S {
        &mut self.sealing
    }

    pub fn allocate_piece(&mut self, size: u64) -> Result<(SectorNumber, u64), SealingError> {
        let (sector, offset) = self.sealing.allocate_piece(size)?;
        log::debug!("allocated {} bytes in sector {} at offset {}", size, sector, offset);
        Ok((sector, offset))
    }

    pub fn seal_piece(
        &mut self,
        size: u64,
        reader: &mut dyn Read,
        sector_id: SectorNumber,
        deal_id: DealID,
    ) -> Result<(), SealingError> {
        log::debug!("sealing {} byte piece for deal {} into sector {}", size, deal_id, sector_id);
        self.sealing.seal_piece(size, reader, sector_id, deal_id)
    }

    pub fn list_sectors(&self) -> Result<Vec<SectorInfo>, SealingError> {
        self.sealing.list_sectors()
    }

    pub fn get_sector_info(&self, sector_id: SectorNumber) -> Result<SectorInfo, SealingError> {
        self.sealing.get_sector_info(sector_id)
    }

    pub fn pledge_sector(&mut self) -> Result<SectorNumber, SealingError> {
        let id = self.sealing.pledge_sector()?;
        log::info!("pledged sector {}", id);
        Ok(id)
    }

    pub fn force_sector_state(
        &mut self,
        sector_id: SectorNumber,
        state: SectorState,
    ) -> Result<(), SealingError> {
        log::info!("forcing sector {} to {}", sector_id, state);
        self.sealing.force_sector_state(sector_id, state)
    }
}
