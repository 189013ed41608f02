use crate::builtin::HAMT_BIT_WIDTH;
use crate::{ActorError, AsActorError, FaultKind};
use anyhow::anyhow;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_hamt as hamt;
use fvm_shared::address::Address;
use integer_encoding::VarInt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Hash function used to place keys in every HAMT in actor state.
pub type Hasher = hamt::Sha256;

/// Wraps a HAMT to provide a convenient map API.
/// Any errors are returned as faults: a HAMT that cannot be read or traversed means the
/// actor's state is corrupt, and one that cannot be flushed means the store failed.
/// The name is not persisted in state, but adorns any error messages.
pub struct Map<BS, K, V>
where
    BS: Blockstore,
    K: MapKey,
    V: DeserializeOwned + Serialize,
{
    hamt: hamt::Hamt<BS, V, hamt::BytesKey, Hasher>,
    name: &'static str,
    key_type: PhantomData<K>,
}

pub trait MapKey: Sized + Debug {
    fn from_bytes(b: &[u8]) -> Result<Self, String>;
    fn to_bytes(&self) -> Result<Vec<u8>, String>;
}

pub type Config = hamt::Config;

pub const DEFAULT_HAMT_CONFIG: Config =
    Config { bit_width: HAMT_BIT_WIDTH, min_data_depth: 0, max_array_width: 3 };

impl<BS, K, V> Map<BS, K, V>
where
    BS: Blockstore,
    K: MapKey,
    V: DeserializeOwned + Serialize,
{
    /// Creates a new, empty map.
    pub fn empty(store: BS, config: Config, name: &'static str) -> Self {
        Self {
            hamt: hamt::Hamt::new_with_config(store, config),
            name,
            key_type: Default::default(),
        }
    }

    /// Creates a new empty map and flushes it to the store.
    /// Returns the CID of the empty map root.
    pub fn flush_empty(store: BS, config: Config) -> Result<Cid, ActorError> {
        Self::empty(store, config, "empty").flush()
    }

    /// Loads a map from the store.
    // The caller must know the configuration to interpret the HAMT correctly.
    pub fn load(
        store: BS,
        root: &Cid,
        config: Config,
        name: &'static str,
    ) -> Result<Self, ActorError> {
        Ok(Self {
            hamt: hamt::Hamt::load_with_config(root, store, config)
                .with_context_fault(FaultKind::IllegalState, || {
                    format!("failed to load HAMT '{}'", name)
                })?,
            name,
            key_type: Default::default(),
        })
    }

    /// Flushes the map's contents to the store.
    /// Returns the root node CID.
    pub fn flush(&mut self) -> Result<Cid, ActorError> {
        self.hamt.flush().with_context_fault(FaultKind::StoreIo, || {
            format!("failed to flush HAMT '{}'", self.name)
        })
    }

    /// Returns whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.hamt.is_empty()
    }

    /// Returns a reference to the value associated with a key, if present.
    pub fn get(&self, key: &K) -> Result<Option<&V>, ActorError> {
        let k = key.to_bytes().context_fault(FaultKind::Assertion, "invalid key")?;
        self.hamt.get(&k).with_context_fault(FaultKind::IllegalState, || {
            format!("failed to get key {key:?} from HAMT '{}'", self.name)
        })
    }

    pub fn contains_key(&self, key: &K) -> Result<bool, ActorError> {
        let k = key.to_bytes().context_fault(FaultKind::Assertion, "invalid key")?;
        self.hamt.contains_key(&k).with_context_fault(FaultKind::IllegalState, || {
            format!("failed to check key {key:?} in HAMT '{}'", self.name)
        })
    }

    /// Inserts a key-value pair into the map.
    /// Returns any value previously associated with the key.
    pub fn set(&mut self, key: &K, value: V) -> Result<Option<V>, ActorError>
    where
        V: PartialEq,
    {
        let k = key.to_bytes().context_fault(FaultKind::Assertion, "invalid key")?;
        self.hamt.set(k.into(), value).with_context_fault(FaultKind::IllegalState, || {
            format!("failed to set key {key:?} in HAMT '{}'", self.name)
        })
    }

    /// Inserts a key-value pair only if the key does not already exist.
    /// Returns whether the map was modified (i.e. key was absent).
    pub fn set_if_absent(&mut self, key: &K, value: V) -> Result<bool, ActorError>
    where
        V: PartialEq,
    {
        let k = key.to_bytes().context_fault(FaultKind::Assertion, "invalid key")?;
        self.hamt.set_if_absent(k.into(), value).with_context_fault(FaultKind::IllegalState, || {
            format!("failed to set key {key:?} in HAMT '{}'", self.name)
        })
    }

    pub fn delete(&mut self, key: &K) -> Result<Option<V>, ActorError> {
        let k = key
            .to_bytes()
            .with_context_fault(FaultKind::Assertion, || format!("invalid key {key:?}"))?;
        self.hamt
            .delete(&k)
            .map(|delete_result| delete_result.map(|(_k, v)| v))
            .with_context_fault(FaultKind::IllegalState, || {
                format!("failed to delete key {key:?} from HAMT '{}'", self.name)
            })
    }

    /// Iterates over all key-value pairs in the map.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), ActorError>
    where
        // The implementation will extract and propagate any ActorError
        // wrapped in a hamt::Error::Dynamic.
        F: FnMut(K, &V) -> Result<(), ActorError>,
    {
        self.hamt
            .for_each(|k, v| {
                let key = K::from_bytes(k).context_fault(FaultKind::IllegalState, "invalid key")?;
                f(key, v).map_err(|e| anyhow!(e))
            })
            .map_err(|hamt_err| match hamt_err {
                hamt::Error::Dynamic(e) => match e.downcast::<ActorError>() {
                    Ok(ae) => ae,
                    Err(e) => ActorError::illegal_state(format!(
                        "error in callback traversing HAMT {}: {}",
                        self.name, e
                    )),
                },
                e => {
                    ActorError::illegal_state(format!("error traversing HAMT {}: {}", self.name, e))
                }
            })
    }
}

impl MapKey for Vec<u8> {
    fn from_bytes(b: &[u8]) -> Result<Self, String> {
        Ok(b.to_vec())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, String> {
        Ok(self.clone())
    }
}

impl MapKey for u64 {
    fn from_bytes(b: &[u8]) -> Result<Self, String> {
        if let Some((result, size)) = VarInt::decode_var(b) {
            if size != b.len() {
                return Err(format!("trailing bytes after varint in {:?}", b));
            }
            Ok(result)
        } else {
            Err(format!("failed to decode varint in {:?}", b))
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>, String> {
        Ok(self.encode_var_vec())
    }
}

impl MapKey for Address {
    fn from_bytes(b: &[u8]) -> Result<Self, String> {
        Address::from_bytes(b).map_err(|e| e.to_string())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, String> {
        Ok(Address::to_bytes(*self))
    }
}
