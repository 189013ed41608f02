// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::StoragePower;
use num_derive::FromPrimitive;

use storage_actors_runtime::cbor::serialize;
use storage_actors_runtime::runtime::{ActorCode, Policy, Runtime};
use storage_actors_runtime::{
    actor_error, actor_dispatch, bigint_to_bytes, ActorError, SectorSize, INIT_ACTOR_ADDR, METHOD_CONSTRUCTOR,
    STORAGE_MARKET_ACTOR_ADDR,
};

pub use self::state::*;
pub use self::types::*;

#[doc(hidden)]
pub mod ext;

mod state;
mod types;

/// Storage Miner actor methods available
#[derive(FromPrimitive)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    CommitSector = 7,
    GetPower = 9,
}

/// Miner Actor
pub struct Actor;

impl Actor {
    pub fn constructor(
        rt: &mut impl Runtime,
        params: MinerConstructorParams,
    ) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(std::iter::once(&INIT_ACTOR_ADDR))?;

        check_sector_size(rt.policy(), params.sector_size)?;
        check_peer_id(rt.policy(), &params.peer_id)?;

        let st = State::new(
            rt.store(),
            params.owner,
            params.worker,
            params.sector_size,
            params.peer_id,
        )?;
        rt.create(&st)?;
        Ok(())
    }

    /// Commits a sector and reports the added storage to the market.
    pub fn commit_sector(
        rt: &mut impl Runtime,
        params: CommitSectorParams,
    ) -> Result<(), ActorError> {
        let st: State = rt.state()?;
        rt.validate_immediate_caller_is([st.owner, st.worker].iter())?;

        let sector_size = rt.transaction(|st: &mut State, rt| {
            st.commit_sector(rt.store(), params.sector_number)?;
            Ok(st.sector_size)
        })?;

        let update = serialize(
            &ext::market::UpdateStorageParams { delta: StoragePower::from(sector_size) },
            "update storage params",
        )?;
        let ret = rt.send(
            &STORAGE_MARKET_ACTOR_ADDR,
            ext::market::UPDATE_STORAGE_METHOD,
            update,
            TokenAmount::default(),
        )?;
        if !ret.exit_code.is_success() {
            return Err(ActorError::unchecked(
                ret.exit_code,
                format!("market rejected storage update for sector {}", params.sector_number),
            ));
        }

        log::debug!("miner {} committed sector {}", rt.message().receiver(), params.sector_number);
        Ok(())
    }

    /// Returns the committed power in raw big integer form.
    pub fn get_power(rt: &mut impl Runtime) -> Result<RawBytes, ActorError> {
        let st: State = rt.state()?;
        Ok(RawBytes::new(bigint_to_bytes(&st.power)))
    }
}

fn check_sector_size(policy: &Policy, sector_size: SectorSize) -> Result<(), ActorError> {
    if !policy.is_supported_sector_size(sector_size) {
        return Err(actor_error!(illegal_argument; "unsupported sector size {}", sector_size));
    }
    Ok(())
}

fn check_peer_id(policy: &Policy, peer_id: &[u8]) -> Result<(), ActorError> {
    if peer_id.len() > policy.max_peer_id_length {
        return Err(actor_error!(
            illegal_argument;
            "peer ID size of {} exceeds maximum size of {}",
            peer_id.len(),
            policy.max_peer_id_length
        ));
    }
    Ok(())
}

impl ActorCode for Actor {
    type Methods = Method;

    fn name() -> &'static str {
        "StorageMiner"
    }

    actor_dispatch! {
        Constructor => constructor,
        CommitSector => commit_sector,
        GetPower => get_power [verbatim],
    }
}
