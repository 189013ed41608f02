use fvm_ipld_blockstore::Blockstore;
use fvm_shared::address::{Address, Protocol};
use fvm_shared::sector::StoragePower;

use storage_actors_runtime::MessageAccumulator;

use crate::State;

pub struct StateSummary {
    pub miners: Vec<Address>,
    pub total_storage: StoragePower,
}

/// Checks internal invariants of market state.
pub fn check_state_invariants<BS: Blockstore>(
    state: &State,
    store: &BS,
) -> (StateSummary, MessageAccumulator) {
    let acc = MessageAccumulator::default();

    let mut miners = Vec::new();
    match state.load_miners(store) {
        Ok(set) => {
            let ret = set.for_each(|addr| {
                acc.require(
                    addr.protocol() == Protocol::ID,
                    &format!("miner {} is not an ID address", addr),
                );
                miners.push(addr);
                Ok(())
            });
            acc.require_no_error(ret, "error iterating miners");
        }
        Err(e) => acc.add(&format!("error loading miners: {}", e)),
    }

    acc.require(
        miners.len() as u64 == state.miner_count,
        &format!("miner count {} does not match {} miners in set", state.miner_count, miners.len()),
    );

    (StateSummary { miners, total_storage: state.total_storage.clone() }, acc)
}
