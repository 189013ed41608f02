use std::fmt;

use serde::{Deserialize, Serialize};
use storage_actors_runtime::{DealID, SectorNumber};

/// Lifecycle of a sector in the local sealing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorState {
    Empty,
    Packing,
    Unsealed,
    PreCommitting,
    PreCommitted,
    Committing,
    Proving,

    SealFailed,
    PreCommitFailed,
    CommitFailed,
    FailedUnrecoverable,
}

impl SectorState {
    /// The successor on the happy path, if any.
    /// Proving and the failure states have none.
    pub fn next(self) -> Option<SectorState> {
        use SectorState::*;
        match self {
            Empty => Some(Packing),
            Packing => Some(Unsealed),
            Unsealed => Some(PreCommitting),
            PreCommitting => Some(PreCommitted),
            PreCommitted => Some(Committing),
            Committing => Some(Proving),
            Proving | SealFailed | PreCommitFailed | CommitFailed | FailedUnrecoverable => None,
        }
    }

    pub fn is_failed(self) -> bool {
        matches!(
            self,
            SectorState::SealFailed
                | SectorState::PreCommitFailed
                | SectorState::CommitFailed
                | SectorState::FailedUnrecoverable
        )
    }

    /// Whether pieces may still be allocated into a sector in this state.
    pub fn accepts_pieces(self) -> bool {
        matches!(self, SectorState::Empty | SectorState::Packing)
    }
}

impl fmt::Display for SectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A piece of client data placed in a sector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Deal the piece belongs to. Zero for pledge filler.
    pub deal_id: DealID,
    pub size: u64,
    pub offset: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorInfo {
    pub sector_id: SectorNumber,
    pub state: SectorState,
    /// Pieces sealed into the sector, in offset order.
    pub pieces: Vec<Piece>,
}

impl SectorInfo {
    pub fn deal_ids(&self) -> Vec<DealID> {
        self.pieces.iter().map(|p| p.deal_id).filter(|id| *id != 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_ends_at_proving() {
        let mut state = SectorState::Empty;
        let mut steps = 0;
        while let Some(next) = state.next() {
            state = next;
            steps += 1;
        }
        assert_eq!(SectorState::Proving, state);
        assert_eq!(6, steps);
    }

    #[test]
    fn failure_states_are_terminal() {
        for s in [
            SectorState::SealFailed,
            SectorState::PreCommitFailed,
            SectorState::CommitFailed,
            SectorState::FailedUnrecoverable,
        ] {
            assert!(s.is_failed());
            assert_eq!(None, s.next());
            assert!(!s.accepts_pieces());
        }
    }

    #[test]
    fn filler_pieces_carry_no_deal() {
        let info = SectorInfo {
            sector_id: 3,
            state: SectorState::Unsealed,
            pieces: vec![
                Piece { deal_id: 0, size: 512, offset: 0 },
                Piece { deal_id: 42, size: 512, offset: 512 },
            ],
        };
        assert_eq!(vec![42], info.deal_ids());
    }
}
