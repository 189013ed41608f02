// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use core::fmt;
use std::cell::RefCell;
use std::collections::VecDeque;

use cid::Cid;
use fvm_ipld_encoding::de::DeserializeOwned;
use fvm_ipld_encoding::{CborStore, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::{ActorID, MethodNum};
use multihash::Code;
use serde::Serialize;

use crate::runtime::{
    ActorCode, MessageInfo, Policy, Response, Runtime, RuntimePolicy, EMPTY_ARR_CID,
};
use crate::test_blockstores::MemoryBlockstore;
use crate::{actor_error, ActorError, FaultKind};

/// Installs a logger for test output, once per process. Controlled by `RUST_LOG`.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub struct MockRuntime {
    pub receiver: Address,
    pub caller: Address,
    pub caller_type: Cid,
    pub value_received: TokenAmount,

    // Actor State
    pub head: Cid,
    pub balance: RefCell<TokenAmount>,

    // VM Impl
    pub in_call: bool,
    pub store: MemoryBlockstore,
    pub in_transaction: bool,

    // Expectations
    pub expectations: RefCell<Expectations>,

    // policy
    pub policy: Policy,
}

#[derive(Default)]
pub struct Expectations {
    pub expect_validate_caller_addr: Option<Vec<Address>>,
    pub expect_sends: VecDeque<ExpectedMessage>,
    pub expect_create_actor: Option<ExpectCreateActor>,
}

impl Expectations {
    fn reset(&mut self) {
        *self = Default::default();
    }

    fn verify(&mut self) {
        assert!(
            self.expect_validate_caller_addr.is_none(),
            "expected ValidateCallerAddr {:?}, not received",
            self.expect_validate_caller_addr
        );
        assert!(
            self.expect_sends.is_empty(),
            "expected all message to be send, unsent messages {:?}",
            self.expect_sends
        );
        assert!(
            self.expect_create_actor.is_none(),
            "expected actor to be created, uncreated actor: {:?}",
            self.expect_create_actor
        );
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            receiver: Address::new_id(0),
            caller: Address::new_id(0),
            caller_type: Default::default(),
            value_received: Default::default(),
            head: *EMPTY_ARR_CID,
            balance: Default::default(),
            in_call: Default::default(),
            store: Default::default(),
            in_transaction: Default::default(),
            expectations: Default::default(),
            policy: Default::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExpectCreateActor {
    pub code_id: Cid,
    pub actor_id: ActorID,
}

#[derive(Clone, Debug)]
pub struct ExpectedMessage {
    pub to: Address,
    pub method: MethodNum,
    pub params: RawBytes,
    pub value: TokenAmount,

    // returns from applying expectedMessage
    pub send_return: RawBytes,
    pub exit_code: ExitCode,
    // a fault raised by the callee instead of returning
    pub send_fault: Option<FaultKind>,
}

pub fn expect_empty(res: RawBytes) {
    assert_eq!(res, RawBytes::default());
}

pub fn expect_abort_contains_message<T: fmt::Debug>(
    expect_exit_code: ExitCode,
    expect_msg: &str,
    res: Result<T, ActorError>,
) {
    let err = res.expect_err(&format!(
        "expected abort with exit code {}, but call succeeded",
        expect_exit_code
    ));
    assert_eq!(
        err.exit_code(),
        expect_exit_code,
        "expected failure with exit code {}, but failed with exit code {}; error message: {}",
        expect_exit_code,
        err.exit_code(),
        err.msg(),
    );
    assert!(!err.is_fault(), "expected a rejection but got a fault: {}", err);
    let err_msg = err.msg();
    assert!(
        err.msg().contains(expect_msg),
        "expected err message '{}' to contain '{}'",
        err_msg,
        expect_msg,
    );
}

/// Asserts that `res` is a rejection with the given exit code.
pub fn expect_abort<T: fmt::Debug>(exit_code: ExitCode, res: Result<T, ActorError>) {
    expect_abort_contains_message(exit_code, "", res);
}

/// Asserts that `res` is a fault of the given kind.
pub fn expect_fault<T: fmt::Debug>(kind: FaultKind, res: Result<T, ActorError>) {
    let err = res.expect_err(&format!("expected {} fault, but call succeeded", kind));
    assert_eq!(
        err.fault_kind(),
        Some(kind),
        "expected {} fault, but failed with {:?}; error message: {}",
        kind,
        err.fault_kind(),
        err.msg(),
    );
}

impl MockRuntime {
    ///// Runtime access for tests /////

    pub fn get_state<T: DeserializeOwned>(&self) -> T {
        self.store_get(&self.head)
    }

    pub fn replace_state<T: Serialize>(&mut self, obj: &T) {
        self.head = self.store_put(obj);
    }

    pub fn set_balance(&mut self, amount: TokenAmount) {
        *self.balance.get_mut() = amount;
    }

    pub fn set_value(&mut self, value: TokenAmount) {
        self.value_received = value;
    }

    pub fn set_caller(&mut self, code_id: Cid, address: Address) {
        self.caller = address;
        self.caller_type = code_id;
    }

    /// Invokes a method of actor `A`, as the VM would: on failure the head is restored to
    /// what it was before the call.
    pub fn call<A: ActorCode>(
        &mut self,
        method_num: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError> {
        self.in_call = true;
        let prev_head = self.head;
        let res = A::invoke_method(self, method_num, params);

        if res.is_err() {
            self.head = prev_head;
        }
        self.in_call = false;
        res
    }

    /// Verifies that all mock expectations have been met.
    pub fn verify(&mut self) {
        self.expectations.borrow_mut().verify()
    }

    /// Clears all mock expectations.
    pub fn reset(&mut self) {
        self.expectations.borrow_mut().reset();
    }

    ///// Mock expectations /////

    pub fn expect_validate_caller_addr(&mut self, addr: Vec<Address>) {
        assert!(!addr.is_empty(), "addrs must be non-empty");
        self.expectations.get_mut().expect_validate_caller_addr = Some(addr);
    }

    pub fn expect_send(
        &mut self,
        to: Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
        send_return: RawBytes,
        exit_code: ExitCode,
    ) {
        self.expectations.borrow_mut().expect_sends.push_back(ExpectedMessage {
            to,
            method,
            params,
            value,
            send_return,
            exit_code,
            send_fault: None,
        })
    }

    /// Expects a send whose callee faults.
    pub fn expect_send_fault(
        &mut self,
        to: Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
        fault: FaultKind,
    ) {
        self.expectations.borrow_mut().expect_sends.push_back(ExpectedMessage {
            to,
            method,
            params,
            value,
            send_return: RawBytes::default(),
            exit_code: fault.exit_code(),
            send_fault: Some(fault),
        })
    }

    pub fn expect_create_actor(&mut self, code_id: Cid, actor_id: ActorID) {
        let a = ExpectCreateActor { code_id, actor_id };
        self.expectations.borrow_mut().expect_create_actor = Some(a);
    }

    ///// Private helpers /////

    fn require_in_call(&self) {
        assert!(self.in_call, "invalid runtime invocation outside of method call")
    }

    fn store_put<T: Serialize>(&self, o: &T) -> Cid {
        self.store.put_cbor(&o, Code::Blake2b256).unwrap()
    }

    fn store_get<T: DeserializeOwned>(&self, cid: &Cid) -> T {
        self.store.get_cbor(cid).unwrap().unwrap()
    }
}

impl MessageInfo for MockRuntime {
    fn caller(&self) -> Address {
        self.caller
    }
    fn receiver(&self) -> Address {
        self.receiver
    }
    fn value_received(&self) -> TokenAmount {
        self.value_received.clone()
    }
}

impl Runtime for MockRuntime {
    type Blockstore = MemoryBlockstore;

    fn message(&self) -> &dyn MessageInfo {
        self.require_in_call();
        self
    }

    fn validate_immediate_caller_is<'a, I>(&mut self, addresses: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Address>,
    {
        self.require_in_call();

        let addrs: Vec<Address> = addresses.into_iter().cloned().collect();

        let mut expectations = self.expectations.borrow_mut();
        let expected_addrs = expectations
            .expect_validate_caller_addr
            .take()
            .expect("unexpected validate caller addrs");
        assert_eq!(
            &addrs, &expected_addrs,
            "unexpected validate caller addrs {:?}, expected {:?}",
            addrs, expected_addrs
        );

        if addrs.contains(&self.caller) {
            return Ok(());
        }
        Err(actor_error!(forbidden;
                "caller address {:?} forbidden, allowed: {:?}",
                self.caller, &addrs
        ))
    }

    fn current_balance(&self) -> TokenAmount {
        self.require_in_call();
        self.balance.borrow().clone()
    }

    fn store(&self) -> &MemoryBlockstore {
        &self.store
    }

    fn get_head(&self) -> Result<Cid, ActorError> {
        Ok(self.head)
    }

    fn commit(&mut self, old: &Cid, new: &Cid) -> Result<(), ActorError> {
        if *old != self.head {
            return Err(actor_error!(head_mismatch;
                "failed to commit state: expected head {}, current head {}", old, self.head));
        }
        self.head = *new;
        Ok(())
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
        let ret = f(&mut st, self);
        self.in_transaction = false;
        let ret = ret?;
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
        self.require_in_call();
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "side-effect within transaction"));
        }

        let expected_msg = self.expectations.borrow_mut().expect_sends.pop_front();
        let expected_msg = expected_msg.unwrap_or_else(|| {
            panic!(
                "unexpected message to: {:?} method: {:?}, value: {:?}, params: {:?}",
                to, method, value, params
            )
        });

        assert!(
            expected_msg.to == *to
                && expected_msg.method == method
                && expected_msg.params == params
                && expected_msg.value == value,
            "message being sent does not match expectation.\n\
             Message  - to: {:?}, method: {:?}, value: {:?}, params: {:?}\n\
             Expected - to: {:?}, method: {:?}, value: {:?}, params: {:?}",
            to,
            method,
            value,
            params,
            expected_msg.to,
            expected_msg.method,
            expected_msg.value,
            expected_msg.params,
        );

        if let Some(kind) = expected_msg.send_fault {
            return Err(ActorError::fault(kind, format!("expected fault in {}", to)));
        }

        {
            let mut balance = self.balance.borrow_mut();
            if value > *balance {
                return Ok(Response {
                    exit_code: ExitCode::SYS_INSUFFICIENT_FUNDS,
                    return_data: RawBytes::default(),
                });
            }
            if expected_msg.exit_code.is_success() {
                *balance -= value;
            }
        }

        Ok(Response { exit_code: expected_msg.exit_code, return_data: expected_msg.send_return })
    }

    fn create_actor(&mut self, code_id: Cid, actor_id: ActorID) -> Result<(), ActorError> {
        self.require_in_call();
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "side-effect within transaction"));
        }
        let expect_create_actor = self
            .expectations
            .borrow_mut()
            .expect_create_actor
            .take()
            .expect("unexpected call to create actor");

        assert!(expect_create_actor.code_id == code_id && expect_create_actor.actor_id == actor_id, "unexpected actor being created, expected code: {:?} address: {:?}, actual code: {:?} address: {:?}", expect_create_actor.code_id, expect_create_actor.actor_id, code_id, actor_id);
        Ok(())
    }
}

impl RuntimePolicy for MockRuntime {
    fn policy(&self) -> &Policy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_ipld_encoding::tuple::*;

    #[derive(Serialize_tuple, Deserialize_tuple, Debug, PartialEq, Default)]
    struct Counter {
        n: u64,
    }

    fn runtime_with_counter() -> MockRuntime {
        let mut rt = MockRuntime::default();
        rt.replace_state(&Counter::default());
        rt.in_call = true;
        rt
    }

    #[test]
    fn transaction_commits_on_success() {
        let mut rt = runtime_with_counter();
        rt.transaction(|st: &mut Counter, _| {
            st.n += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(rt.get_state::<Counter>(), Counter { n: 1 });
    }

    #[test]
    fn transaction_writes_nothing_on_error() {
        let mut rt = runtime_with_counter();
        let before = rt.head;
        let res = rt.transaction(|st: &mut Counter, _| -> Result<(), ActorError> {
            st.n += 1;
            Err(actor_error!(unsupported; "no"))
        });
        expect_abort(crate::ERR_UNSUPPORTED, res);
        assert_eq!(rt.head, before);
    }

    #[test]
    fn send_inside_transaction_is_a_fault() {
        let mut rt = runtime_with_counter();
        let res = rt.transaction(|_: &mut Counter, rt| {
            rt.send(&Address::new_id(1), 1, RawBytes::default(), TokenAmount::default())
        });
        expect_fault(FaultKind::Assertion, res);
    }

    #[test]
    fn stale_commit_is_head_mismatch() {
        let mut rt = runtime_with_counter();
        let stale = rt.head;
        let moved = rt.put(&Counter { n: 5 }).unwrap();
        rt.commit(&stale, &moved).unwrap();

        let other = rt.put(&Counter { n: 9 }).unwrap();
        expect_fault(FaultKind::HeadMismatch, rt.commit(&stale, &other));
        assert_eq!(rt.head, moved);
    }

    #[test]
    fn create_requires_empty_head() {
        let mut rt = MockRuntime { in_call: true, ..Default::default() };
        rt.create(&Counter::default()).unwrap();
        expect_fault(FaultKind::IllegalState, rt.create(&Counter::default()));
    }
}
