// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::sector::StoragePower;
use num_traits::Zero;

use storage_actors_runtime::{
    actor_error, ActorError, SectorNumber, SectorSize, Set, DEFAULT_HAMT_CONFIG,
};

pub type SectorSet<BS> = Set<BS, SectorNumber>;

/// Miner actor state
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub owner: Address,
    pub worker: Address,
    pub sector_size: SectorSize,
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
    /// Set of committed sector numbers.
    pub sectors: Cid,
    /// Storage committed by this miner, in bytes.
    #[serde(with = "bigint_ser")]
    pub power: StoragePower,
}

impl State {
    pub fn new<BS: Blockstore>(
        store: &BS,
        owner: Address,
        worker: Address,
        sector_size: SectorSize,
        peer_id: Vec<u8>,
    ) -> Result<Self, ActorError> {
        let sectors = SectorSet::empty(store, DEFAULT_HAMT_CONFIG, "sectors").flush()?;
        Ok(Self { owner, worker, sector_size, peer_id, sectors, power: StoragePower::zero() })
    }

    pub fn load_sectors<'bs, BS: Blockstore>(
        &self,
        store: &'bs BS,
    ) -> Result<SectorSet<&'bs BS>, ActorError> {
        SectorSet::load(store, &self.sectors, DEFAULT_HAMT_CONFIG, "sectors")
    }

    /// Records a sector as committed and adds its size to the miner's power.
    pub fn commit_sector<BS: Blockstore>(
        &mut self,
        store: &BS,
        sector_number: SectorNumber,
    ) -> Result<(), ActorError> {
        let mut sectors = self.load_sectors(store)?;
        if !sectors.put(&sector_number)? {
            return Err(actor_error!(illegal_argument;
                "sector {} already committed", sector_number));
        }
        self.sectors = sectors.flush()?;
        self.power += self.sector_size;
        Ok(())
    }

    pub fn has_sector<BS: Blockstore>(
        &self,
        store: &BS,
        sector_number: SectorNumber,
    ) -> Result<bool, ActorError> {
        self.load_sectors(store)?.has(&sector_number)
    }
}
