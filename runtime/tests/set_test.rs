// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::Address;
use storage_actors_runtime::test_blockstores::MemoryBlockstore;
use storage_actors_runtime::{Set, DEFAULT_HAMT_CONFIG};

#[test]
fn put() {
    let store = MemoryBlockstore::new();
    let mut set = Set::empty(&store, DEFAULT_HAMT_CONFIG, "t");

    let key = Address::new_id(101);
    assert!(!set.has(&key).unwrap());

    assert!(set.put(&key).unwrap());
    assert!(set.has(&key).unwrap());

    // Second insert is a no-op
    assert!(!set.put(&key).unwrap());
    assert_eq!(set.collect_keys().unwrap(), [key]);
}

#[test]
fn collect_keys() {
    let store = MemoryBlockstore::new();
    let mut set = Set::<_, u64>::empty(&store, DEFAULT_HAMT_CONFIG, "t");

    set.put(&0u64).unwrap();

    assert_eq!(set.collect_keys().unwrap(), [0u64]);

    set.put(&1u64).unwrap();
    set.put(&2u64).unwrap();
    set.put(&3u64).unwrap();

    assert_eq!(set.collect_keys().unwrap().len(), 4);
}

#[test]
fn delete() {
    let store = MemoryBlockstore::new();
    let mut set = Set::empty(&store, DEFAULT_HAMT_CONFIG, "t");

    let key = 0u64;

    assert!(!set.has(&key).unwrap());
    set.put(&key).unwrap();
    assert!(set.has(&key).unwrap());
    set.delete(&key).unwrap();
    assert!(!set.has(&key).unwrap());

    // Test delete when doesn't exist doesn't error
    set.delete(&key).unwrap();
}

#[test]
fn root_independent_of_insertion_order() {
    let store = MemoryBlockstore::new();
    let addrs: Vec<Address> = (100..120).map(Address::new_id).collect();

    let mut forward = Set::empty(&store, DEFAULT_HAMT_CONFIG, "forward");
    for a in &addrs {
        forward.put(a).unwrap();
    }
    let mut backward = Set::empty(&store, DEFAULT_HAMT_CONFIG, "backward");
    for a in addrs.iter().rev() {
        backward.put(a).unwrap();
    }
    assert_eq!(forward.flush().unwrap(), backward.flush().unwrap());
}

#[test]
fn reload_from_root() {
    let store = MemoryBlockstore::new();
    let mut set = Set::empty(&store, DEFAULT_HAMT_CONFIG, "t");
    set.put(&Address::new_id(7)).unwrap();
    let root = set.flush().unwrap();

    let loaded = Set::<_, Address>::load(&store, &root, DEFAULT_HAMT_CONFIG, "t").unwrap();
    assert!(loaded.has(&Address::new_id(7)).unwrap());
    assert!(!loaded.has(&Address::new_id(8)).unwrap());
}
