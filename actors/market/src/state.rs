// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::sector::StoragePower;
use num_traits::Zero;

use storage_actors_runtime::{ActorError, Config, Set, DEFAULT_HAMT_CONFIG};

pub type MinerSet<BS> = Set<BS, Address>;
pub const MINERS_CONFIG: Config = DEFAULT_HAMT_CONFIG;

/// Storage market actor state
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// Root of the set of registered miner addresses.
    pub miners: Cid,
    /// Number of entries in `miners`.
    pub miner_count: u64,
    /// Sum of all storage deltas accepted from miners.
    #[serde(with = "bigint_ser")]
    pub total_storage: StoragePower,
}

impl State {
    pub fn new<BS: Blockstore>(store: &BS) -> Result<Self, ActorError> {
        let miners = MinerSet::empty(store, MINERS_CONFIG, "miners").flush()?;
        Ok(Self { miners, miner_count: 0, total_storage: StoragePower::zero() })
    }

    pub fn load_miners<'bs, BS: Blockstore>(
        &self,
        store: &'bs BS,
    ) -> Result<MinerSet<&'bs BS>, ActorError> {
        MinerSet::load(store, &self.miners, MINERS_CONFIG, "miners")
    }

    pub fn is_miner<BS: Blockstore>(&self, store: &BS, addr: &Address) -> Result<bool, ActorError> {
        self.load_miners(store)?.has(addr)
    }

    /// Registers a miner. Returns whether it was not already registered.
    pub fn add_miner<BS: Blockstore>(
        &mut self,
        store: &BS,
        addr: &Address,
    ) -> Result<bool, ActorError> {
        let mut miners = self.load_miners(store)?;
        let added = miners.put(addr)?;
        if added {
            self.miners = miners.flush()?;
            self.miner_count += 1;
        }
        Ok(added)
    }

    /// Applies a change in committed storage. The total is not bounded below.
    pub fn add_storage(&mut self, delta: &StoragePower) {
        self.total_storage += delta;
    }
}
