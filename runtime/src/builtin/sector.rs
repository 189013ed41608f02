// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Size of a sector in bytes.
pub type SectorSize = u64;

/// Index of a sector within a single miner.
pub type SectorNumber = u64;

/// Identifier of a storage deal.
pub type DealID = u64;
