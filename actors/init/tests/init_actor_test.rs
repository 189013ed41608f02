// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use storage_actor_init::{Actor as InitActor, ConstructorParams, ExecParams, Method, State};
use storage_actors_runtime::test_utils::*;
use storage_actors_runtime::{
    FaultKind, ACCOUNT_ACTOR_CODE_ID, FIRST_NON_SINGLETON_ADDR, INIT_ACTOR_ADDR,
    METHOD_CONSTRUCTOR, MINER_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR,
    STORAGE_MARKET_ACTOR_CODE_ID, SYSTEM_ACTOR_ADDR, SYSTEM_ACTOR_CODE_ID,
};

fn construct_runtime() -> MockRuntime {
    init_logging();
    MockRuntime {
        receiver: INIT_ACTOR_ADDR,
        caller: SYSTEM_ACTOR_ADDR,
        caller_type: *SYSTEM_ACTOR_CODE_ID,
        ..Default::default()
    }
}

fn construct_and_verify(rt: &mut MockRuntime) {
    rt.expect_validate_caller_addr(vec![SYSTEM_ACTOR_ADDR]);
    let params = ConstructorParams { network_name: "localnet".to_string() };
    let ret = rt
        .call::<InitActor>(Method::Constructor as u64, &RawBytes::serialize(params).unwrap())
        .unwrap();
    expect_empty(ret);
    rt.verify();

    let state: State = rt.get_state();
    assert_eq!(state.next_id, FIRST_NON_SINGLETON_ADDR);
    assert_eq!(state.network_name, "localnet");
}

fn exec_params(ctor: &[u8]) -> ExecParams {
    ExecParams { code_cid: *MINER_ACTOR_CODE_ID, constructor_params: RawBytes::new(ctor.to_vec()) }
}

#[test]
fn constructor_only_by_system() {
    let mut rt = construct_runtime();
    rt.set_caller(*ACCOUNT_ACTOR_CODE_ID, Address::new_id(1000));
    rt.expect_validate_caller_addr(vec![SYSTEM_ACTOR_ADDR]);
    let params = ConstructorParams { network_name: "localnet".to_string() };
    expect_abort(
        ExitCode::USR_FORBIDDEN,
        rt.call::<InitActor>(Method::Constructor as u64, &RawBytes::serialize(params).unwrap()),
    );
    rt.verify();
}

#[test]
fn exec_creates_actor_and_forwards_value() {
    let mut rt = construct_runtime();
    construct_and_verify(&mut rt);

    rt.set_caller(*STORAGE_MARKET_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR);
    rt.set_value(TokenAmount::from_atto(100));
    rt.set_balance(TokenAmount::from_atto(100));

    let expected = Address::new_id(FIRST_NON_SINGLETON_ADDR);
    rt.expect_create_actor(*MINER_ACTOR_CODE_ID, FIRST_NON_SINGLETON_ADDR);
    rt.expect_send(
        expected,
        METHOD_CONSTRUCTOR,
        RawBytes::new(b"ctor".to_vec()),
        TokenAmount::from_atto(100),
        RawBytes::default(),
        ExitCode::OK,
    );

    let ret = rt
        .call::<InitActor>(Method::Exec as u64, &RawBytes::serialize(exec_params(b"ctor")).unwrap())
        .unwrap();
    rt.verify();

    let addr = Address::from_bytes(ret.bytes()).unwrap();
    assert_eq!(addr, expected);
    assert_eq!(rt.get_state::<State>().next_id, FIRST_NON_SINGLETON_ADDR + 1);
}

#[test]
fn ids_are_sequential() {
    let mut rt = construct_runtime();
    construct_and_verify(&mut rt);
    rt.set_caller(*STORAGE_MARKET_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR);

    for i in 0..3 {
        let id = FIRST_NON_SINGLETON_ADDR + i;
        rt.expect_create_actor(*MINER_ACTOR_CODE_ID, id);
        rt.expect_send(
            Address::new_id(id),
            METHOD_CONSTRUCTOR,
            RawBytes::default(),
            TokenAmount::default(),
            RawBytes::default(),
            ExitCode::OK,
        );
        let ret = rt
            .call::<InitActor>(Method::Exec as u64, &RawBytes::serialize(exec_params(b"")).unwrap())
            .unwrap();
        rt.verify();
        assert_eq!(ret.to_vec(), Address::new_id(id).to_bytes());
    }
}

#[test]
fn failed_constructor_rolls_back_id() {
    let mut rt = construct_runtime();
    construct_and_verify(&mut rt);
    rt.set_caller(*STORAGE_MARKET_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR);
    let head = rt.head;

    rt.expect_create_actor(*MINER_ACTOR_CODE_ID, FIRST_NON_SINGLETON_ADDR);
    rt.expect_send(
        Address::new_id(FIRST_NON_SINGLETON_ADDR),
        METHOD_CONSTRUCTOR,
        RawBytes::default(),
        TokenAmount::default(),
        RawBytes::default(),
        ExitCode::USR_ILLEGAL_ARGUMENT,
    );
    expect_abort(
        ExitCode::USR_ILLEGAL_ARGUMENT,
        rt.call::<InitActor>(Method::Exec as u64, &RawBytes::serialize(exec_params(b"")).unwrap()),
    );
    rt.verify();
    assert_eq!(rt.head, head);
}

#[test]
fn constructor_fault_propagates() {
    let mut rt = construct_runtime();
    construct_and_verify(&mut rt);
    rt.set_caller(*STORAGE_MARKET_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR);

    rt.expect_create_actor(*MINER_ACTOR_CODE_ID, FIRST_NON_SINGLETON_ADDR);
    rt.expect_send_fault(
        Address::new_id(FIRST_NON_SINGLETON_ADDR),
        METHOD_CONSTRUCTOR,
        RawBytes::default(),
        TokenAmount::default(),
        FaultKind::Serialization,
    );
    expect_fault(
        FaultKind::Serialization,
        rt.call::<InitActor>(Method::Exec as u64, &RawBytes::serialize(exec_params(b"")).unwrap()),
    );
    rt.verify();
}
