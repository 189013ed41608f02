// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use cid::Cid;

use fvm_ipld_blockstore::Blockstore;

/// Stats for a [MemoryBlockstore] this indicates the amount of read and written data
/// to the wrapped store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BSStats {
    /// Number of reads
    pub r: usize,
    /// Number of writes
    pub w: usize,
    /// Bytes Read
    pub br: usize,
    /// Bytes Written
    pub bw: usize,
}

/// In-memory blockstore tracking reads and writes for verification.
/// Blocks are never removed, so every state generation stays readable.
#[derive(Debug, Default)]
pub struct MemoryBlockstore {
    blocks: RefCell<HashMap<Cid, Vec<u8>>>,
    pub stats: RefCell<BSStats>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self { blocks: Default::default(), stats: Default::default() }
    }

    /// Number of distinct blocks held.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }
}

impl Blockstore for MemoryBlockstore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>> {
        let mut stats = self.stats.borrow_mut();
        stats.r += 1;

        let bytes = self.blocks.borrow().get(cid).cloned();

        if let Some(bytes) = &bytes {
            stats.br += bytes.len();
        }
        Ok(bytes)
    }

    fn has(&self, cid: &Cid) -> Result<bool> {
        self.stats.borrow_mut().r += 1;

        Ok(self.blocks.borrow().contains_key(cid))
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> Result<()> {
        let mut stats = self.stats.borrow_mut();
        stats.w += 1;
        stats.bw += block.len();

        self.blocks.borrow_mut().insert(*k, block.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_ipld_encoding::CborStore;
    use multihash::Code;

    #[test]
    fn equal_values_intern_once() {
        let store = MemoryBlockstore::new();
        assert_eq!(*store.stats.borrow(), BSStats::default());

        let first = store.put_cbor(&(1u64, "miner"), Code::Blake2b256).unwrap();
        let second = store.put_cbor(&(1u64, "miner"), Code::Blake2b256).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.block_count(), 1);
        assert_eq!(store.stats.borrow().w, 2);

        let other = store.put_cbor(&(2u64, "miner"), Code::Blake2b256).unwrap();
        assert_ne!(first, other);
        assert_eq!(store.block_count(), 2);
    }

    #[test]
    fn tracks_reads() {
        let store = MemoryBlockstore::new();
        let cid = store.put_cbor(&42u64, Code::Blake2b256).unwrap();
        let len = store.stats.borrow().bw;

        let v: Option<u64> = store.get_cbor(&cid).unwrap();
        assert_eq!(v, Some(42));
        assert_eq!(*store.stats.borrow(), BSStats { r: 1, br: len, w: 1, bw: len });
    }
}
