use cid::Cid;
use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;

use storage_actors_runtime::SectorSize;

pub mod init {
    use super::*;
    use fvm_ipld_encoding::RawBytes;

    pub const EXEC_METHOD: u64 = 1;

    /// Init actor Exec Params
    #[derive(Serialize_tuple, Deserialize_tuple)]
    pub struct ExecParams {
        pub code_cid: Cid,
        pub constructor_params: RawBytes,
    }
}

pub mod miner {
    use super::*;

    pub const GET_POWER_METHOD: u64 = 9;

    #[derive(Serialize_tuple, Deserialize_tuple)]
    pub struct MinerConstructorParams {
        pub owner: Address,
        pub worker: Address,
        pub sector_size: SectorSize,
        #[serde(with = "strict_bytes")]
        pub peer_id: Vec<u8>,
    }
}
