use std::collections::BTreeMap;
use std::io::{self, Read};

use storage_actors_runtime::{DealID, SectorNumber};

use crate::{Piece, Sealing, SealingConfig, SealingError, SectorInfo, SectorState};

#[derive(Clone, Debug)]
struct Allocation {
    offset: u64,
    size: u64,
    sealed: bool,
}

#[derive(Clone, Debug)]
struct SectorRecord {
    state: SectorState,
    // Bytes handed out by allocation, sealed or not.
    allocated: u64,
    allocations: Vec<Allocation>,
    pieces: Vec<Piece>,
}

impl SectorRecord {
    fn new() -> Self {
        SectorRecord {
            state: SectorState::Empty,
            allocated: 0,
            allocations: Vec::new(),
            pieces: Vec::new(),
        }
    }

    fn info(&self, sector_id: SectorNumber) -> SectorInfo {
        SectorInfo { sector_id, state: self.state, pieces: self.pieces.clone() }
    }

    fn allocate(&mut self, size: u64) -> u64 {
        let offset = self.allocated;
        self.allocations.push(Allocation { offset, size, sealed: false });
        self.allocated += size;
        if self.state == SectorState::Empty {
            self.state = SectorState::Packing;
        }
        offset
    }

    fn is_full(&self, sector_size: u64) -> bool {
        self.allocated == sector_size && self.allocations.iter().all(|a| a.sealed)
    }
}

/// Packs pieces into fixed-size sectors held in memory.
///
/// Pieces are placed first-fit into the open sectors, in sector number order. A sector whose
/// capacity is fully allocated and sealed leaves packing on its own; later stages are driven
/// with [`MemorySealing::advance`] or [`Sealing::force_sector_state`].
#[derive(Debug)]
pub struct MemorySealing {
    config: SealingConfig,
    sectors: BTreeMap<SectorNumber, SectorRecord>,
    next_sector_id: SectorNumber,
}

impl Default for MemorySealing {
    fn default() -> Self {
        MemorySealing::new(SealingConfig::default())
    }
}

impl MemorySealing {
    pub fn new(config: SealingConfig) -> Self {
        MemorySealing { config, sectors: BTreeMap::new(), next_sector_id: 1 }
    }

    pub fn config(&self) -> &SealingConfig {
        &self.config
    }

    /// Moves a sector one step along the happy path, returning its new state.
    pub fn advance(&mut self, sector_id: SectorNumber) -> Result<SectorState, SealingError> {
        let record = self.record_mut(sector_id)?;
        let next = record
            .state
            .next()
            .ok_or(SealingError::InvalidTransition { sector: sector_id, state: record.state })?;
        record.state = next;
        log::debug!("sector {} advanced to {}", sector_id, next);
        Ok(next)
    }

    fn record_mut(&mut self, sector_id: SectorNumber) -> Result<&mut SectorRecord, SealingError> {
        self.sectors.get_mut(&sector_id).ok_or(SealingError::UnknownSector(sector_id))
    }

    fn open_sector_count(&self) -> usize {
        self.sectors.values().filter(|r| r.state.accepts_pieces()).count()
    }

    fn new_sector_id(&mut self) -> SectorNumber {
        let id = self.next_sector_id;
        self.next_sector_id += 1;
        id
    }
}

impl Sealing for MemorySealing {
    fn allocate_piece(&mut self, size: u64) -> Result<(SectorNumber, u64), SealingError> {
        let sector_size = self.config.sector_size;
        if size == 0 {
            return Err(SealingError::EmptyPiece);
        }
        if size > sector_size {
            return Err(SealingError::PieceTooLarge { size, sector_size });
        }

        if let Some((id, record)) = self
            .sectors
            .iter_mut()
            .find(|(_, r)| r.state.accepts_pieces() && sector_size - r.allocated >= size)
        {
            let offset = record.allocate(size);
            return Ok((*id, offset));
        }

        let open = self.open_sector_count();
        if open >= self.config.max_open_sectors {
            return Err(SealingError::TooManyOpenSectors(open));
        }
        let id = self.new_sector_id();
        let mut record = SectorRecord::new();
        let offset = record.allocate(size);
        self.sectors.insert(id, record);
        log::debug!("opened sector {}", id);
        Ok((id, offset))
    }

    fn seal_piece(
        &mut self,
        size: u64,
        reader: &mut dyn Read,
        sector_id: SectorNumber,
        deal_id: DealID,
    ) -> Result<(), SealingError> {
        let sector_size = self.config.sector_size;
        let record = self.record_mut(sector_id)?;
        let idx = record
            .allocations
            .iter()
            .position(|a| !a.sealed && a.size == size)
            .filter(|_| record.state.accepts_pieces())
            .ok_or(SealingError::NoAllocation { sector: sector_id, size })?;

        let read = io::copy(&mut reader.take(size), &mut io::sink())?;
        if read != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes of piece data, got {}", size, read),
            )
            .into());
        }

        let alloc = &mut record.allocations[idx];
        alloc.sealed = true;
        let piece = Piece { deal_id, size, offset: alloc.offset };
        let pos = record.pieces.partition_point(|p| p.offset < piece.offset);
        record.pieces.insert(pos, piece);

        if record.is_full(sector_size) {
            record.state = SectorState::Unsealed;
            log::debug!("sector {} packed", sector_id);
        }
        Ok(())
    }

    fn list_sectors(&self) -> Result<Vec<SectorInfo>, SealingError> {
        Ok(self.sectors.iter().map(|(id, r)| r.info(*id)).collect())
    }

    fn get_sector_info(&self, sector_id: SectorNumber) -> Result<SectorInfo, SealingError> {
        self.sectors
            .get(&sector_id)
            .map(|r| r.info(sector_id))
            .ok_or(SealingError::UnknownSector(sector_id))
    }

    fn pledge_sector(&mut self) -> Result<SectorNumber, SealingError> {
        let sector_size = self.config.sector_size;
        let id = self.new_sector_id();
        let mut record = SectorRecord::new();
        let offset = record.allocate(sector_size);
        record.allocations[0].sealed = true;
        record.pieces.push(Piece { deal_id: 0, size: sector_size, offset });
        record.state = SectorState::Unsealed;
        self.sectors.insert(id, record);
        log::debug!("pledged sector {}", id);
        Ok(id)
    }

    fn force_sector_state(
        &mut self,
        sector_id: SectorNumber,
        state: SectorState,
    ) -> Result<(), SealingError> {
        let record = self.record_mut(sector_id)?;
        log::warn!("forcing sector {} from {} to {}", sector_id, record.state, state);
        record.state = state;
        Ok(())
    }
}
