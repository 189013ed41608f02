use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::sector::StoragePower;
use num_traits::Zero;

use storage_actor_init::State as InitState;
use storage_actor_market::testing::check_state_invariants;
use storage_actor_market::{
    CreateStorageMinerParams, IsMinerParams, Method as MarketMethod,
    PowerLookupParams, State as MarketState, UpdateStorageParams,
};
use storage_actor_miner::{CommitSectorParams, Method as MinerMethod, State as MinerState};
use storage_actors_runtime::runtime::{Policy, Runtime};
use storage_actors_runtime::test_utils::init_logging;
use storage_actors_runtime::{
    bigint_from_bytes, FaultKind, Outcome, ERR_DOWNSTREAM_REJECTED, ERR_UNSUPPORTED,
    INIT_ACTOR_ADDR, MINER_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR,
};
use storage_test_vm::{InternalMessage, InvocationCtx, TestVM};

struct Setup {
    v: TestVM,
    owner: Address,
    worker: Address,
    stranger: Address,
}

fn setup() -> Setup {
    init_logging();
    let v = TestVM::new_with_singletons(Policy::default()).unwrap();
    let owner = v.add_account(TokenAmount::from_atto(1_000)).unwrap();
    let worker = v.add_account(TokenAmount::zero()).unwrap();
    let stranger = v.add_account(TokenAmount::zero()).unwrap();
    Setup { v, owner, worker, stranger }
}

fn create_miner_params(s: &Setup, sector_size: u64, peer_id: Vec<u8>) -> RawBytes {
    RawBytes::serialize(CreateStorageMinerParams {
        owner: s.owner,
        worker: s.worker,
        sector_size,
        peer_id,
    })
    .unwrap()
}

fn create_miner(s: &Setup, value: TokenAmount) -> Address {
    let outcome = s
        .v
        .apply_message(
            &s.owner,
            &STORAGE_MARKET_ACTOR_ADDR,
            &value,
            MarketMethod::CreateStorageMiner as u64,
            create_miner_params(s, 1024, b"peer".to_vec()),
        )
        .unwrap();
    assert!(outcome.is_ok(), "create miner failed: {:?}", outcome);
    Address::from_bytes(outcome.return_data().bytes()).unwrap()
}

fn total_storage(s: &Setup) -> StoragePower {
    let outcome = s
        .v
        .apply_message(
            &s.stranger,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            MarketMethod::GetTotalStorage as u64,
            RawBytes::default(),
        )
        .unwrap();
    bigint_from_bytes(outcome.return_data().bytes()).unwrap()
}

fn commit_sector(s: &Setup, miner: &Address, sector_number: u64) -> Outcome {
    s.v.apply_message(
        &s.worker,
        miner,
        &TokenAmount::zero(),
        MinerMethod::CommitSector as u64,
        RawBytes::serialize(CommitSectorParams { sector_number }).unwrap(),
    )
    .unwrap()
}

fn check_market(s: &Setup) {
    let st: MarketState = s.v.get_state(&STORAGE_MARKET_ACTOR_ADDR).unwrap();
    let (_, acc) = check_state_invariants(&st, &*s.v.store);
    acc.assert_empty();
}

#[test]
fn create_miner_commit_sector_and_look_up_power() {
    let s = setup();

    let miner = create_miner(&s, TokenAmount::from_atto(100));
    let miner_actor = s.v.actor(&miner).unwrap().unwrap();
    assert_eq!(*MINER_ACTOR_CODE_ID, miner_actor.code);
    assert_eq!(TokenAmount::from_atto(100), miner_actor.balance);
    assert_eq!(TokenAmount::from_atto(900), s.v.balance(&s.owner).unwrap());

    let is_miner = s
        .v
        .apply_message(
            &s.stranger,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            MarketMethod::IsMiner as u64,
            RawBytes::serialize(IsMinerParams { addr: miner }).unwrap(),
        )
        .unwrap();
    assert!(is_miner.return_data().deserialize::<bool>().unwrap());

    assert!(commit_sector(&s, &miner, 1).is_ok());
    assert_eq!(StoragePower::from(1024), total_storage(&s));

    let lookup = s
        .v
        .apply_message(
            &s.stranger,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            MarketMethod::PowerLookup as u64,
            RawBytes::serialize(PowerLookupParams { miner }).unwrap(),
        )
        .unwrap();
    assert!(lookup.is_ok());
    assert_eq!(vec![0, 4, 0], lookup.return_data().to_vec());
    let power = bigint_from_bytes(lookup.return_data().bytes()).unwrap();
    assert_eq!(StoragePower::from(1024), power);

    // The lookup relays the miner's own return bytes.
    let direct = s
        .v
        .apply_message(
            &s.stranger,
            &miner,
            &TokenAmount::zero(),
            MinerMethod::GetPower as u64,
            RawBytes::default(),
        )
        .unwrap();
    assert_eq!(direct.return_data(), lookup.return_data());

    check_market(&s);
}

#[test]
fn stranger_update_is_rejected_and_rolled_back() {
    let s = setup();
    let miner = create_miner(&s, TokenAmount::zero());
    assert!(commit_sector(&s, &miner, 1).is_ok());

    let market_head = s.v.actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap().head;
    let outcome = s
        .v
        .apply_message(
            &s.stranger,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            MarketMethod::UpdateStorage as u64,
            RawBytes::serialize(UpdateStorageParams { delta: StoragePower::from(5) }).unwrap(),
        )
        .unwrap();
    assert_eq!(Outcome::Rejected(ERR_UNSUPPORTED), outcome);
    assert_eq!(market_head, s.v.actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap().head);
    assert_eq!(StoragePower::from(1024), total_storage(&s));
}

#[test]
fn rejected_miner_constructor_rolls_back_exec() {
    let s = setup();
    let init_before: InitState = s.v.get_state(&INIT_ACTOR_ADDR).unwrap();
    let market_head = s.v.actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap().head;

    let peer_id = vec![0; s.v.policy().max_peer_id_length + 1];
    let outcome = s
        .v
        .apply_message(
            &s.owner,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::from_atto(100),
            MarketMethod::CreateStorageMiner as u64,
            create_miner_params(&s, 1024, peer_id),
        )
        .unwrap();
    assert_eq!(Outcome::Rejected(ERR_DOWNSTREAM_REJECTED), outcome);

    let init_after: InitState = s.v.get_state(&INIT_ACTOR_ADDR).unwrap();
    assert_eq!(init_before.next_id, init_after.next_id);
    assert!(s.v.actor(&Address::new_id(init_before.next_id)).unwrap().is_none());
    assert_eq!(market_head, s.v.actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap().head);
    assert_eq!(TokenAmount::from_atto(1_000), s.v.balance(&s.owner).unwrap());
}

#[test]
fn unsupported_sector_size_sends_nothing() {
    let s = setup();
    let init_before: InitState = s.v.get_state(&INIT_ACTOR_ADDR).unwrap();

    let outcome = s
        .v
        .apply_message(
            &s.owner,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            MarketMethod::CreateStorageMiner as u64,
            create_miner_params(&s, 2048, b"peer".to_vec()),
        )
        .unwrap();
    assert_eq!(Outcome::Rejected(ERR_UNSUPPORTED), outcome);

    let init_after: InitState = s.v.get_state(&INIT_ACTOR_ADDR).unwrap();
    assert_eq!(init_before, init_after);
}

#[test]
fn insufficient_value_is_rejected() {
    let s = setup();
    let outcome = s
        .v
        .apply_message(
            &s.owner,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::from_atto(5_000),
            MarketMethod::CreateStorageMiner as u64,
            create_miner_params(&s, 1024, b"peer".to_vec()),
        )
        .unwrap();
    assert_eq!(Outcome::Rejected(ExitCode::SYS_INSUFFICIENT_FUNDS), outcome);
    assert_eq!(TokenAmount::from_atto(1_000), s.v.balance(&s.owner).unwrap());
}

#[test]
fn market_fault_aborts_nested_commit() {
    let s = setup();
    let miner = create_miner(&s, TokenAmount::zero());
    let root = s.v.state_root();

    // Corrupt the market's state so that the miner's storage update faults.
    s.v.put_state(&STORAGE_MARKET_ACTOR_ADDR, &"not a market state").unwrap();
    s.v.checkpoint().unwrap();

    let outcome = commit_sector(&s, &miner, 1);
    assert_eq!(Outcome::Fault(FaultKind::Serialization), outcome);

    // The miner's own commit was undone along with the failed send.
    let st: MinerState = s.v.get_state(&miner).unwrap();
    assert!(st.power.is_zero());
    assert!(!st.has_sector(&*s.v.store, 1).unwrap());

    s.v.rollback(&root).unwrap();
    assert!(commit_sector(&s, &miner, 1).is_ok());
}

#[test]
fn duplicate_sector_leaves_total_unchanged() {
    let s = setup();
    let miner = create_miner(&s, TokenAmount::zero());
    assert!(commit_sector(&s, &miner, 7).is_ok());
    assert_eq!(Outcome::Rejected(ExitCode::USR_ILLEGAL_ARGUMENT), commit_sector(&s, &miner, 7));
    assert_eq!(StoragePower::from(1024), total_storage(&s));
    check_market(&s);
}

#[test]
fn unknown_method_is_unhandled() {
    let s = setup();
    let outcome = s
        .v
        .apply_message(
            &s.owner,
            &STORAGE_MARKET_ACTOR_ADDR,
            &TokenAmount::zero(),
            2,
            RawBytes::default(),
        )
        .unwrap();
    assert_eq!(Outcome::Rejected(ExitCode::USR_UNHANDLED_MESSAGE), outcome);
}

fn ctx_message(to: Address) -> InternalMessage {
    InternalMessage {
        from: STORAGE_MARKET_ACTOR_ADDR,
        to,
        value: TokenAmount::zero(),
        method: 0,
        params: RawBytes::default(),
    }
}

#[test]
fn current_balance_reads_receiver() {
    let s = setup();
    let ctx = InvocationCtx::new(&s.v, ctx_message(s.owner));
    assert_eq!(TokenAmount::from_atto(1_000), ctx.current_balance());
}

#[test]
fn current_balance_of_missing_receiver_is_zero() {
    let s = setup();
    let ctx = InvocationCtx::new(&s.v, ctx_message(Address::new_id(9_999)));
    assert!(ctx.current_balance().is_zero());
}
