use cid::Cid;
use multihash::{Code, MultihashDigest};

use fvm_ipld_encoding::DAG_CBOR;

// The encoding of an empty CBOR list, the state every actor starts with.
const EMPTY_ARR: [u8; 1] = [0x80];

lazy_static::lazy_static! {
    /// The CID of an empty CBOR list, the head of every freshly created actor.
    pub static ref EMPTY_ARR_CID: Cid = Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(&EMPTY_ARR));
}

#[test]
fn test_empty_arr_cid() {
    use fvm_ipld_encoding::to_vec;
    assert_eq!(to_vec::<[(); 0]>(&[]).unwrap(), EMPTY_ARR);
    assert_eq!(EMPTY_ARR_CID.codec(), DAG_CBOR);
}
