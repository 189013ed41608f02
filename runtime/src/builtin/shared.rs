// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::Address;
use fvm_shared::bigint::{BigInt, Sign};
use fvm_shared::MethodNum;

use crate::runtime::Response;
use crate::{actor_error, ActorError};

pub const HAMT_BIT_WIDTH: u32 = 5;

/// Method number of every actor's constructor.
pub const METHOD_CONSTRUCTOR: MethodNum = 0;

/// Raw byte form of a big integer: a sign byte (0 positive, 1 negative) followed by the
/// big-endian magnitude. Zero is the empty byte string.
pub fn bigint_to_bytes(n: &BigInt) -> Vec<u8> {
    let (sign, mut bz) = n.to_bytes_be();
    match sign {
        Sign::NoSign => return Vec::new(),
        Sign::Plus => bz.insert(0, 0),
        Sign::Minus => bz.insert(0, 1),
    }
    bz
}

/// Parses the raw byte form produced by [`bigint_to_bytes`].
/// An unknown sign byte is a malformed-bytes fault.
pub fn bigint_from_bytes(bz: &[u8]) -> Result<BigInt, ActorError> {
    match bz.split_first() {
        None => Ok(BigInt::default()),
        Some((&0, mag)) => Ok(BigInt::from_bytes_be(Sign::Plus, mag)),
        Some((&1, mag)) => Ok(BigInt::from_bytes_be(Sign::Minus, mag)),
        Some((b, _)) => Err(actor_error!(malformed_bytes; "invalid big integer sign byte {}", b)),
    }
}

/// Parses the raw address bytes returned by a successful send.
/// Bytes that are not an address are a malformed-bytes fault: the callee broke its contract.
pub fn address_from_return(ret: &Response, desc: &str) -> Result<Address, ActorError> {
    Address::from_bytes(ret.return_data.bytes())
        .map_err(|e| actor_error!(malformed_bytes; "failed to parse {}: {}", desc, e))
}
