use std::ops::Add;
use std::rc::Rc;

use cid::Cid;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::{ActorID, MethodNum};
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde::Serialize;

use storage_actor_init::Actor as InitActor;
use storage_actor_market::Actor as MarketActor;
use storage_actor_miner::Actor as MinerActor;
use storage_actors_runtime::runtime::{
    ActorCode, MessageInfo, Policy, Response, Runtime, RuntimePolicy, EMPTY_ARR_CID,
};
use storage_actors_runtime::test_blockstores::MemoryBlockstore;
use storage_actors_runtime::{
    actor_error, ActorError, ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_ADDR, INIT_ACTOR_CODE_ID,
    METHOD_CONSTRUCTOR, MINER_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_CODE_ID,
};

use crate::{actor, TestVM};

#[derive(Clone, Debug)]
pub struct InternalMessage {
    pub from: Address,
    pub to: Address,
    pub value: TokenAmount,
    pub method: MethodNum,
    pub params: RawBytes,
}

/// The runtime handed to an actor for a single invocation.
pub struct InvocationCtx<'invocation> {
    v: &'invocation TestVM,
    msg: InternalMessage,
    in_transaction: bool,
    caller_validated: bool,
}

impl MessageInfo for InvocationCtx<'_> {
    fn caller(&self) -> Address {
        self.msg.from
    }
    fn receiver(&self) -> Address {
        self.msg.to
    }
    fn value_received(&self) -> TokenAmount {
        self.msg.value.clone()
    }
}

impl<'invocation> InvocationCtx<'invocation> {
    pub fn new(v: &'invocation TestVM, msg: InternalMessage) -> Self {
        InvocationCtx { v, msg, in_transaction: false, caller_validated: false }
    }

    /// Transfers the message value and runs the receiver's method.
    /// On any failure the actor table is rolled back to where it was before the transfer.
    pub fn invoke(&mut self) -> Result<RawBytes, ActorError> {
        let prior_root = self.v.checkpoint()?;
        let res = self.transfer_and_call();
        if res.is_err() {
            self.v.rollback(&prior_root)?;
        }
        res
    }

    fn transfer_and_call(&mut self) -> Result<RawBytes, ActorError> {
        // Transfer funds
        let mut from_actor = self.v.actor(&self.msg.from)?.ok_or_else(|| {
            ActorError::unchecked(
                ExitCode::SYS_SENDER_INVALID,
                format!("sender {} does not exist", self.msg.from),
            )
        })?;
        if self.msg.value.is_negative() {
            return Err(ActorError::unchecked(
                ExitCode::SYS_ASSERTION_FAILED,
                "attempt to transfer negative value".to_string(),
            ));
        }
        if from_actor.balance < self.msg.value {
            return Err(ActorError::unchecked(
                ExitCode::SYS_INSUFFICIENT_FUNDS,
                "insufficient balance to transfer".to_string(),
            ));
        }

        // Load, deduct, store from actor before loading to actor to handle self-send case
        from_actor.balance -= &self.msg.value;
        self.v.set_actor(&self.msg.from, from_actor)?;

        let mut to_actor = self.v.actor(&self.msg.to)?.ok_or_else(|| {
            ActorError::unchecked(
                ExitCode::SYS_INVALID_RECEIVER,
                format!("receiver {} does not exist", self.msg.to),
            )
        })?;
        to_actor.balance = to_actor.balance.add(&self.msg.value);
        let code = to_actor.code;
        self.v.set_actor(&self.msg.to, to_actor)?;

        // call target actor
        let method = self.msg.method;
        let params = self.msg.params.clone();
        if code == *INIT_ACTOR_CODE_ID {
            InitActor::invoke_method(self, method, &params)
        } else if code == *STORAGE_MARKET_ACTOR_CODE_ID {
            MarketActor::invoke_method(self, method, &params)
        } else if code == *MINER_ACTOR_CODE_ID {
            MinerActor::invoke_method(self, method, &params)
        } else if code == *ACCOUNT_ACTOR_CODE_ID && method == METHOD_CONSTRUCTOR {
            // A plain value transfer.
            Ok(RawBytes::default())
        } else {
            Err(actor_error!(unhandled_message;
                "actor {} does not handle method {}", self.msg.to, method))
        }
    }

    fn receiver_actor(&self) -> Result<crate::ActorState, ActorError> {
        self.v
            .actor(&self.msg.to)?
            .ok_or_else(|| actor_error!(illegal_state; "receiver {} does not exist", self.msg.to))
    }
}

impl Runtime for InvocationCtx<'_> {
    type Blockstore = Rc<MemoryBlockstore>;

    fn message(&self) -> &dyn MessageInfo {
        self
    }

    fn validate_immediate_caller_is<'a, I>(&mut self, addresses: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Address>,
    {
        if self.caller_validated {
            return Err(actor_error!(assertion_failed; "caller double validated"));
        }
        self.caller_validated = true;
        if addresses.into_iter().any(|a| *a == self.msg.from) {
            return Ok(());
        }
        Err(actor_error!(forbidden; "immediate caller {} forbidden", self.msg.from))
    }

    fn current_balance(&self) -> TokenAmount {
        match self.receiver_actor() {
            Ok(actor) => actor.balance,
            Err(e) => {
                log::error!("failed to read balance of {}: {}", self.msg.to, e);
                TokenAmount::zero()
            }
        }
    }

    fn store(&self) -> &Rc<MemoryBlockstore> {
        &self.v.store
    }

    fn get_head(&self) -> Result<Cid, ActorError> {
        Ok(self.receiver_actor()?.head)
    }

    fn commit(&mut self, old: &Cid, new: &Cid) -> Result<(), ActorError> {
        let mut act = self.receiver_actor()?;
        if act.head != *old {
            return Err(actor_error!(head_mismatch;
                "failed to commit state of {}: expected head {}, current head {}",
                self.msg.to, old, act.head));
        }
        act.head = *new;
        self.v.set_actor(&self.msg.to, act)
    }

    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>,
    {
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "nested transaction"));
        }
        let old = self.get_head()?;
        let mut st: S = self.get(&old)?;
        self.in_transaction = true;
        let result = f(&mut st, self);
        self.in_transaction = false;
        let ret = result?;
        let new = self.put(&st)?;
        self.commit(&old, &new)?;
        Ok(ret)
    }

    fn send(
        &self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<Response, ActorError> {
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "side-effect within transaction"));
        }

        let msg = InternalMessage { from: self.msg.to, to: *to, value, method, params };
        let mut new_ctx = InvocationCtx::new(self.v, msg);
        match new_ctx.invoke() {
            Ok(ret) => Ok(Response::ok(ret)),
            Err(e) if e.is_fault() => Err(e),
            Err(e) => {
                log::debug!("send to {} method {} rejected: {}", to, method, e);
                Ok(Response { exit_code: e.exit_code(), return_data: RawBytes::default() })
            }
        }
    }

    fn create_actor(&mut self, code_id: Cid, actor_id: ActorID) -> Result<(), ActorError> {
        if self.msg.to != INIT_ACTOR_ADDR {
            return Err(actor_error!(assertion_failed;
                "create_actor called by {}, not the init actor", self.msg.to));
        }
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "side-effect within transaction"));
        }
        let addr = Address::new_id(actor_id);
        if self.v.actor(&addr)?.is_some() {
            return Err(actor_error!(forbidden;
                "attempt to create new actor at existing address {}", addr));
        }
        self.v.set_actor(&addr, actor(code_id, *EMPTY_ARR_CID, 0, TokenAmount::zero()))
    }
}

impl RuntimePolicy for InvocationCtx<'_> {
    fn policy(&self) -> &Policy {
        self.v.policy()
    }
}
