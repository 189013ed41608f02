use std::cell::RefCell;
use std::rc::Rc;

use cid::Cid;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::{CborStore, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::MethodNum;
use multihash::Code;
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use storage_actor_init::{ConstructorParams as InitConstructorParams, State as InitState};
use storage_actors_runtime::cbor::serialize;
use storage_actors_runtime::runtime::{Policy, EMPTY_ARR_CID};
use storage_actors_runtime::test_blockstores::MemoryBlockstore;
use storage_actors_runtime::{
    ActorError, AsActorError, FaultKind, Map, Outcome, ACCOUNT_ACTOR_CODE_ID,
    DEFAULT_HAMT_CONFIG, INIT_ACTOR_ADDR, INIT_ACTOR_CODE_ID, METHOD_CONSTRUCTOR,
    STORAGE_MARKET_ACTOR_ADDR, STORAGE_MARKET_ACTOR_CODE_ID, SYSTEM_ACTOR_ADDR,
    SYSTEM_ACTOR_CODE_ID,
};

pub use self::messaging::{InternalMessage, InvocationCtx};

mod messaging;

pub const TEST_VM_NETWORK_NAME: &str = "testvm";

type ActorMap = Map<Rc<MemoryBlockstore>, Address, ActorState>;

/// An in-memory VM which executes the storage actors natively.
///
/// Every invocation checkpoints the actor table first and rolls back to the checkpoint if the
/// invocation fails, so a rejected or faulted call leaves no trace in state.
pub struct TestVM {
    pub store: Rc<MemoryBlockstore>,
    state_root: RefCell<Cid>,
    actors: RefCell<ActorMap>,
    policy: Policy,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, PartialEq, Eq, Debug)]
pub struct ActorState {
    pub code: Cid,
    pub head: Cid,
    pub call_seq: u64,
    pub balance: TokenAmount,
}

pub fn actor(code: Cid, head: Cid, call_seq: u64, balance: TokenAmount) -> ActorState {
    ActorState { code, head, call_seq, balance }
}

#[derive(Error, Debug)]
pub enum VMError {
    #[error("actor {0} not found")]
    ActorNotFound(Address),
    #[error("genesis message to {0} failed with {1:?}")]
    Genesis(Address, Outcome),
    #[error(transparent)]
    State(#[from] ActorError),
}

impl TestVM {
    pub fn new(policy: Policy) -> Result<TestVM, VMError> {
        let store = Rc::new(MemoryBlockstore::new());
        let mut actors = ActorMap::empty(store.clone(), DEFAULT_HAMT_CONFIG, "actors");
        let state_root = actors.flush()?;
        Ok(TestVM {
            store,
            state_root: RefCell::new(state_root),
            actors: RefCell::new(actors),
            policy,
        })
    }

    /// Creates a VM holding the system, init and storage market singletons, with the init and
    /// market actors constructed by messages from the system actor.
    pub fn new_with_singletons(policy: Policy) -> Result<TestVM, VMError> {
        let v = TestVM::new(policy)?;
        let empty = *EMPTY_ARR_CID;
        for (addr, code) in [
            (SYSTEM_ACTOR_ADDR, *SYSTEM_ACTOR_CODE_ID),
            (INIT_ACTOR_ADDR, *INIT_ACTOR_CODE_ID),
            (STORAGE_MARKET_ACTOR_ADDR, *STORAGE_MARKET_ACTOR_CODE_ID),
        ] {
            v.set_actor(&addr, actor(code, empty, 0, TokenAmount::zero()))?;
        }
        v.checkpoint()?;

        let init_params = serialize(
            &InitConstructorParams { network_name: TEST_VM_NETWORK_NAME.to_string() },
            "init constructor params",
        )?;
        let genesis =
            [(INIT_ACTOR_ADDR, init_params), (STORAGE_MARKET_ACTOR_ADDR, RawBytes::default())];
        for (to, params) in genesis {
            let outcome = v.apply_message(
                &SYSTEM_ACTOR_ADDR,
                &to,
                &TokenAmount::zero(),
                METHOD_CONSTRUCTOR,
                params,
            )?;
            if !outcome.is_ok() {
                return Err(VMError::Genesis(to, outcome));
            }
        }
        Ok(v)
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn actor(&self, addr: &Address) -> Result<Option<ActorState>, ActorError> {
        Ok(self.actors.borrow().get(addr)?.cloned())
    }

    // blindly overwrite the actor at this address whether it previously existed or not
    pub fn set_actor(&self, addr: &Address, a: ActorState) -> Result<(), ActorError> {
        self.actors.borrow_mut().set(addr, a)?;
        Ok(())
    }

    pub fn balance(&self, addr: &Address) -> Result<TokenAmount, VMError> {
        Ok(self.actor(addr)?.ok_or(VMError::ActorNotFound(*addr))?.balance)
    }

    /// Flushes the actor table, returning the new state root.
    pub fn checkpoint(&self) -> Result<Cid, ActorError> {
        let root = self.actors.borrow_mut().flush()?;
        self.state_root.replace(root);
        Ok(root)
    }

    /// Restores the actor table to a previously checkpointed root.
    pub fn rollback(&self, root: &Cid) -> Result<(), ActorError> {
        let actors = ActorMap::load(self.store.clone(), root, DEFAULT_HAMT_CONFIG, "actors")?;
        self.actors.replace(actors);
        self.state_root.replace(*root);
        Ok(())
    }

    pub fn state_root(&self) -> Cid {
        *self.state_root.borrow()
    }

    /// Loads the state object at the head of an actor.
    pub fn get_state<T: DeserializeOwned>(&self, addr: &Address) -> Result<T, VMError> {
        let a = self.actor(addr)?.ok_or(VMError::ActorNotFound(*addr))?;
        let st = self
            .store
            .get_cbor(&a.head)
            .context_fault(FaultKind::Serialization, "failed to decode actor state")?
            .with_context_fault(FaultKind::IllegalState, || format!("no state for {}", addr))?;
        Ok(st)
    }

    /// Replaces the state object of an actor, outside of any invocation.
    pub fn put_state<T: Serialize>(&self, addr: &Address, obj: &T) -> Result<(), VMError> {
        let mut a = self.actor(addr)?.ok_or(VMError::ActorNotFound(*addr))?;
        a.head = self
            .store
            .put_cbor(obj, Code::Blake2b256)
            .context_fault(FaultKind::StoreIo, "failed to write actor state")?;
        self.set_actor(addr, a)?;
        Ok(())
    }

    /// Creates an account actor with the given balance, registering its ID with the init actor.
    pub fn add_account(&self, balance: TokenAmount) -> Result<Address, VMError> {
        let mut init: InitState = self.get_state(&INIT_ACTOR_ADDR)?;
        let addr = Address::new_id(init.allocate_id());
        self.put_state(&INIT_ACTOR_ADDR, &init)?;
        self.set_actor(&addr, actor(*ACCOUNT_ACTOR_CODE_ID, *EMPTY_ARR_CID, 0, balance))?;
        self.checkpoint()?;
        Ok(addr)
    }

    /// Applies a top-level message. Any failure rolls back every state change made while
    /// handling it, including those of nested sends.
    pub fn apply_message(
        &self,
        from: &Address,
        to: &Address,
        value: &TokenAmount,
        method: MethodNum,
        params: RawBytes,
    ) -> Result<Outcome, VMError> {
        let mut a = self.actor(from)?.ok_or(VMError::ActorNotFound(*from))?;
        a.call_seq += 1;
        self.set_actor(from, a)?;

        let prior_root = self.checkpoint()?;

        let msg = InternalMessage { from: *from, to: *to, value: value.clone(), method, params };
        let mut ctx = InvocationCtx::new(self, msg);
        let res = ctx.invoke();

        if res.is_err() {
            self.rollback(&prior_root)?;
        } else {
            self.checkpoint()?;
        }
        Ok(Outcome::from(res))
    }
}
