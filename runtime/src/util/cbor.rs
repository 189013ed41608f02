use fvm_ipld_encoding::{to_vec, RawBytes};
use serde::{de, ser};

use crate::ActorError;

/// Encoded form of an empty parameter list.
pub const EMPTY_PARAMS_BYTES: &[u8] = &[0x80];

lazy_static::lazy_static! {
    /// Pre-serialized payload for methods that take no parameters.
    pub static ref EMPTY_PARAMS: RawBytes = RawBytes::new(EMPTY_PARAMS_BYTES.to_vec());
}

/// Whether `params` is an acceptable payload for a method that takes no parameters.
pub fn is_empty_params(params: &[u8]) -> bool {
    params.is_empty() || params == EMPTY_PARAMS_BYTES
}

/// Serializes a structure as a CBOR vector of bytes, returning a serialization fault on error.
/// `desc` is a noun phrase for the object being serialized, included in any error message.
pub fn serialize_vec<T>(value: &T, desc: &str) -> Result<Vec<u8>, ActorError>
where
    T: ser::Serialize + ?Sized,
{
    to_vec(value)
        .map_err(|e| ActorError::serialization(format!("failed to serialize {}: {}", desc, e)))
}

/// Serializes a structure as CBOR bytes, returning a serialization fault on error.
pub fn serialize<T>(value: &T, desc: &str) -> Result<RawBytes, ActorError>
where
    T: ser::Serialize + ?Sized,
{
    Ok(RawBytes::new(serialize_vec(value, desc)?))
}

/// Deserialises CBOR-encoded bytes as a structure, returning a serialization fault on error.
pub fn deserialize<O: de::DeserializeOwned>(v: &RawBytes, desc: &str) -> Result<O, ActorError> {
    v.deserialize()
        .map_err(|e| ActorError::serialization(format!("failed to deserialize {}: {}", desc, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FaultKind;
    use fvm_shared::address::Address;
    use fvm_shared::bigint::{bigint_ser, BigInt};

    #[test]
    fn empty_params_is_encoded_empty_list() {
        assert_eq!(to_vec(&Vec::<u8>::new()).unwrap(), vec![0x80]);
        assert!(is_empty_params(&[]));
        assert!(is_empty_params(&EMPTY_PARAMS));
        assert!(!is_empty_params(&[0x80, 0x00]));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = Address::new_id(1234);
        let first = serialize(&a, "address").unwrap();
        let second = serialize(&Address::new_id(1234), "address").unwrap();
        assert_eq!(first, second);
        let back: Address = deserialize(&first, "address").unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn bigint_keeps_sign() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Wrapped(#[serde(with = "bigint_ser")] BigInt);

        let neg = serialize(&Wrapped(BigInt::from(-5)), "delta").unwrap();
        let pos = serialize(&Wrapped(BigInt::from(5)), "delta").unwrap();
        assert_ne!(neg, pos);
        let back: Wrapped = deserialize(&neg, "delta").unwrap();
        assert_eq!(back, Wrapped(BigInt::from(-5)));
    }

    #[test]
    fn invalid_input_is_a_serialization_fault() {
        let err = deserialize::<Address>(&RawBytes::new(vec![0x42]), "address").unwrap_err();
        assert_eq!(err.fault_kind(), Some(FaultKind::Serialization));
    }
}
