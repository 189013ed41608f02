// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::codes::*;
pub use self::sector::*;
pub use self::shared::*;
pub use self::singletons::*;

mod codes;
mod sector;
mod shared;
mod singletons;
