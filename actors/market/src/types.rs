// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::sector::StoragePower;
use storage_actors_runtime::SectorSize;

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct CreateStorageMinerParams {
    pub owner: Address,
    pub worker: Address,
    pub sector_size: SectorSize,
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
}

/// Change in a miner's committed storage. May be negative.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct UpdateStorageParams {
    #[serde(with = "bigint_ser")]
    pub delta: StoragePower,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct PowerLookupParams {
    pub miner: Address,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct IsMinerParams {
    pub addr: Address,
}
