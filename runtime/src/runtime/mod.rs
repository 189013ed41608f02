// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{CborStore, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::{ActorID, MethodNum};
use multihash::Code;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use self::actor_code::*;
pub use self::empty::EMPTY_ARR_CID;
pub use self::policy::*;
use crate::{actor_error, ActorError, AsActorError, FaultKind};

mod actor_code;
mod empty;
pub mod policy;

/// Runtime is the VM's internal runtime object.
/// this is everything that is accessible to actors, beyond parameters.
pub trait Runtime: RuntimePolicy {
    type Blockstore: Blockstore;

    /// Information related to the current message being executed.
    fn message(&self) -> &dyn MessageInfo;

    /// Validates the caller against a list of permitted addresses.
    /// Fails with `USR_FORBIDDEN` if the immediate caller is not one of them.
    fn validate_immediate_caller_is<'a, I>(&mut self, addresses: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Address>;

    /// The balance of the receiver.
    fn current_balance(&self) -> TokenAmount;

    /// Returns reference to blockstore
    fn store(&self) -> &Self::Blockstore;

    /// The digest of the receiver's current state.
    fn get_head(&self) -> Result<Cid, ActorError>;

    /// Advances the receiver's head from `old` to `new`.
    /// Fails with a head-mismatch fault if `old` is no longer the current head, leaving the
    /// head where it is.
    fn commit(&mut self, old: &Cid, new: &Cid) -> Result<(), ActorError>;

    /// Loads and decodes the object stored under `cid`.
    fn get<T: DeserializeOwned>(&self, cid: &Cid) -> Result<T, ActorError> {
        self.store()
            .get_cbor(cid)
            .with_context_fault(FaultKind::Serialization, || format!("failed to decode {}", cid))?
            .with_context_fault(FaultKind::StoreIo, || format!("no block for {}", cid))
    }

    /// Encodes `obj` and interns it in the store, returning its digest.
    /// Equal values always yield the same digest.
    fn put<T: Serialize>(&self, obj: &T) -> Result<Cid, ActorError> {
        self.store()
            .put_cbor(obj, Code::Blake2b256)
            .context_fault(FaultKind::StoreIo, "failed to write object")
    }

    /// Initializes the state object.
    /// This is only valid when the state has not yet been initialized.
    fn create<T: Serialize>(&mut self, obj: &T) -> Result<(), ActorError> {
        let root = self.get_head()?;
        if root != *EMPTY_ARR_CID {
            return Err(
                actor_error!(illegal_state; "failed to create state; expected empty array CID, got: {}", root),
            );
        }
        let new_root = self.put(obj)?;
        self.commit(&root, &new_root)
    }

    /// Loads a readonly copy of the state of the receiver.
    fn state<T: DeserializeOwned>(&self) -> Result<T, ActorError> {
        self.get(&self.get_head()?)
    }

    /// Loads a mutable copy of the state of the receiver, passes it to `f`,
    /// and after `f` completes puts the state object back to the store and commits it
    /// from the head it was read at.
    ///
    /// During the call to `f`, execution is protected from side-effects, (including message send).
    /// If `f` fails nothing is written.
    ///
    /// Returns the result of `f`.
    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>;

    /// Sends a message to another actor, returning the exit code and return value envelope.
    /// If the invoked method does not return successfully, its state changes
    /// (and that of any messages it sent in turn) will be rolled back.
    /// An `Err` is a fault, which must abort the caller too.
    fn send(
        &self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<Response, ActorError>;

    /// Creates an actor with code `codeID`, an empty state and id `actor_id`.
    /// May only be called by Init actor.
    fn create_actor(&mut self, code_id: Cid, actor_id: ActorID) -> Result<(), ActorError>;
}

/// Message information available to the actor about executing message.
pub trait MessageInfo {
    /// The address of the immediate calling actor.
    fn caller(&self) -> Address;

    /// The address of the actor receiving the message.
    fn receiver(&self) -> Address;

    /// The value attached to the message being processed, implicitly
    /// added to current_balance() before method invocation.
    fn value_received(&self) -> TokenAmount;
}

/// The envelope returned by [`Runtime::send`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub exit_code: ExitCode,
    pub return_data: RawBytes,
}

impl Response {
    pub fn ok(return_data: RawBytes) -> Self {
        Self { exit_code: ExitCode::OK, return_data }
    }
}
