// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use num_derive::FromPrimitive;

use storage_actors_runtime::runtime::{ActorCode, Runtime};
use storage_actors_runtime::cbor::{serialize, EMPTY_PARAMS};
use storage_actors_runtime::{
    actor_dispatch, actor_error, address_from_return, bigint_to_bytes, ActorError, INIT_ACTOR_ADDR,
    METHOD_CONSTRUCTOR, MINER_ACTOR_CODE_ID, SYSTEM_ACTOR_ADDR,
};

pub use self::state::*;
pub use self::types::*;

#[doc(hidden)]
pub mod ext;
pub mod testing;

mod state;
mod types;

/// Storage market actor methods available.
/// Numbers 2 (SlashConsensusFault) and 7 (StorageCollateralForSize) are reserved.
#[derive(FromPrimitive)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    CreateStorageMiner = 1,
    UpdateStorage = 3,
    GetTotalStorage = 4,
    PowerLookup = 5,
    IsMiner = 6,
}

/// Storage Market Actor
pub struct Actor;

impl Actor {
    pub fn constructor(rt: &mut impl Runtime) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(std::iter::once(&SYSTEM_ACTOR_ADDR))?;

        let st = State::new(rt.store())?;
        rt.create(&st)?;
        Ok(())
    }

    /// Creates a miner actor through the Init actor and registers it.
    /// The value sent with this message is forwarded to the new miner.
    /// Returns the raw bytes of the new miner's ID address.
    pub fn create_storage_miner(
        rt: &mut impl Runtime,
        params: CreateStorageMinerParams,
    ) -> Result<RawBytes, ActorError> {
        if !rt.policy().is_supported_sector_size(params.sector_size) {
            log::warn!("rejected miner with unsupported sector size {}", params.sector_size);
            return Err(actor_error!(unsupported;
                "sector size {} is not supported", params.sector_size));
        }

        let ctor_params = serialize(
            &ext::miner::MinerConstructorParams {
                owner: params.owner,
                worker: params.worker,
                sector_size: params.sector_size,
                peer_id: params.peer_id,
            },
            "miner constructor params",
        )?;
        let exec_params = serialize(
            &ext::init::ExecParams { code_cid: *MINER_ACTOR_CODE_ID, constructor_params: ctor_params },
            "exec params",
        )?;

        let value = rt.message().value_received();
        let ret = rt
            .send(&INIT_ACTOR_ADDR, ext::init::EXEC_METHOD, exec_params, value)
            .map_err(|e| e.wrap("failed to exec miner actor"))?;
        if !ret.exit_code.is_success() {
            log::warn!("init actor rejected miner creation with {}", ret.exit_code);
            return Err(actor_error!(downstream_rejected;
                "init actor exec failed with exit code {}", ret.exit_code));
        }
        let miner: Address = address_from_return(&ret, "exec return")?;

        rt.transaction(|st: &mut State, rt| {
            if !st.add_miner(rt.store(), &miner)? {
                return Err(actor_error!(illegal_state; "miner {} already registered", miner));
            }
            Ok(())
        })?;

        log::debug!("created storage miner {}", miner);
        Ok(RawBytes::new(miner.to_bytes()))
    }

    /// Applies a change in the calling miner's committed storage to the total.
    pub fn update_storage(
        rt: &mut impl Runtime,
        params: UpdateStorageParams,
    ) -> Result<(), ActorError> {
        let caller = rt.message().caller();
        rt.transaction(|st: &mut State, rt| {
            if !st.is_miner(rt.store(), &caller)? {
                return Err(actor_error!(unsupported;
                    "caller {} is not a registered miner", caller));
            }
            st.add_storage(&params.delta);
            Ok(())
        })?;
        log::trace!("miner {} updated storage by {}", caller, params.delta);
        Ok(())
    }

    /// Returns the total in raw big integer form.
    pub fn get_total_storage(rt: &mut impl Runtime) -> Result<RawBytes, ActorError> {
        let st: State = rt.state()?;
        Ok(RawBytes::new(bigint_to_bytes(&st.total_storage)))
    }

    /// Queries a registered miner for its power.
    /// The miner's return bytes are relayed unchanged; a rejection is relayed with its code.
    pub fn power_lookup(
        rt: &mut impl Runtime,
        params: PowerLookupParams,
    ) -> Result<RawBytes, ActorError> {
        let st: State = rt.state()?;
        if !st.is_miner(rt.store(), &params.miner)? {
            return Err(actor_error!(unsupported;
                "power lookup for {} which is not a registered miner", params.miner));
        }

        let ret = rt.send(
            &params.miner,
            ext::miner::GET_POWER_METHOD,
            EMPTY_PARAMS.clone(),
            TokenAmount::default(),
        )?;
        if !ret.exit_code.is_success() {
            return Err(ActorError::unchecked(
                ret.exit_code,
                format!("power lookup on {} failed", params.miner),
            ));
        }
        Ok(ret.return_data)
    }

    pub fn is_miner(rt: &mut impl Runtime, params: IsMinerParams) -> Result<bool, ActorError> {
        let st: State = rt.state()?;
        st.is_miner(rt.store(), &params.addr)
    }
}

impl ActorCode for Actor {
    type Methods = Method;

    fn name() -> &'static str {
        "StorageMarket"
    }

    actor_dispatch! {
        Constructor => constructor,
        CreateStorageMiner => create_storage_miner [verbatim],
        UpdateStorage => update_storage,
        GetTotalStorage => get_total_storage [verbatim],
        PowerLookup => power_lookup [verbatim],
        IsMiner => is_miner,
    }
}
