// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use storage_actors_runtime::{SectorNumber, SectorSize};

/// Storage miner actor constructor params are defined here so the market actor can send them
/// to the init actor to instantiate miners.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct MinerConstructorParams {
    pub owner: Address,
    pub worker: Address,
    pub sector_size: SectorSize,
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct CommitSectorParams {
    pub sector_number: SectorNumber,
}
