pub mod market {
    use fvm_ipld_encoding::tuple::*;
    use fvm_shared::bigint::bigint_ser;
    use fvm_shared::sector::StoragePower;

    pub const UPDATE_STORAGE_METHOD: u64 = 3;

    #[derive(Serialize_tuple, Deserialize_tuple)]
    pub struct UpdateStorageParams {
        #[serde(with = "bigint_ser")]
        pub delta: StoragePower,
    }
}
