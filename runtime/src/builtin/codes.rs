use cid::multihash::Multihash;
use cid::Cid;

const IPLD_RAW: u64 = 0x55;
const IDENTITY_HASH: u64 = 0;

/// Returns an identity CID for bz.
pub fn make_builtin(bz: &[u8]) -> Result<Cid, cid::multihash::Error> {
    Ok(Cid::new_v1(IPLD_RAW, Multihash::wrap(IDENTITY_HASH, bz)?))
}

lazy_static::lazy_static! {
    pub static ref SYSTEM_ACTOR_CODE_ID: Cid = builtin_code(b"fil/1/system");
    pub static ref INIT_ACTOR_CODE_ID: Cid = builtin_code(b"fil/1/init");
    pub static ref ACCOUNT_ACTOR_CODE_ID: Cid = builtin_code(b"fil/1/account");
    pub static ref STORAGE_MARKET_ACTOR_CODE_ID: Cid = builtin_code(b"fil/1/storagemarket");
    pub static ref MINER_ACTOR_CODE_ID: Cid = builtin_code(b"fil/1/storageminer");
}

// Names are compile-time constants well below the identity digest limit.
fn builtin_code(name: &'static [u8]) -> Cid {
    make_builtin(name).expect("builtin code name too long")
}
