// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::tuple::*;
use fvm_shared::ActorID;
use storage_actors_runtime::FIRST_NON_SINGLETON_ADDR;

/// State is responsible for handing out actor IDs.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub next_id: ActorID,
    pub network_name: String,
}

impl State {
    pub fn new(network_name: String) -> Self {
        Self { next_id: FIRST_NON_SINGLETON_ADDR, network_name }
    }

    /// Allocates a new actor ID.
    pub fn allocate_id(&mut self) -> ActorID {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
