// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::ActorID;
use num_derive::FromPrimitive;
use storage_actors_runtime::runtime::{ActorCode, Runtime};
use storage_actors_runtime::{
    actor_dispatch, ActorError, METHOD_CONSTRUCTOR, SYSTEM_ACTOR_ADDR,
};

pub use self::state::State;
pub use self::types::*;

mod state;
mod types;

/// Init actor methods available
#[derive(FromPrimitive)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    Exec = 1,
}

/// Init actor
pub struct Actor;

impl Actor {
    /// Init actor constructor
    pub fn constructor(
        rt: &mut impl Runtime,
        params: ConstructorParams,
    ) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(std::iter::once(&SYSTEM_ACTOR_ADDR))?;
        rt.create(&State::new(params.network_name))?;
        Ok(())
    }

    /// Creates a new actor of the requested code and runs its constructor, forwarding the
    /// value received. Returns the raw bytes of the new actor's ID address.
    pub fn exec(rt: &mut impl Runtime, params: ExecParams) -> Result<RawBytes, ActorError> {
        log::trace!("called exec; params.code_cid: {:?}", &params.code_cid);

        // Allocate an ID for this actor.
        let id: ActorID = rt.transaction(|st: &mut State, _| Ok(st.allocate_id()))?;

        // Create an empty actor
        rt.create_actor(params.code_cid, id)?;

        // Invoke constructor
        let id_address = Address::new_id(id);
        let value = rt.message().value_received();
        let ret = rt
            .send(&id_address, METHOD_CONSTRUCTOR, params.constructor_params, value)
            .map_err(|err| err.wrap("constructor failed"))?;
        if !ret.exit_code.is_success() {
            return Err(ActorError::unchecked(
                ret.exit_code,
                format!("constructor of {} failed", id_address),
            ));
        }

        log::debug!("created actor {} with code {}", id_address, params.code_cid);
        Ok(RawBytes::new(id_address.to_bytes()))
    }
}

impl ActorCode for Actor {
    type Methods = Method;

    fn name() -> &'static str {
        "Init"
    }

    actor_dispatch! {
        Constructor => constructor,
        Exec => exec [verbatim],
    }
}
