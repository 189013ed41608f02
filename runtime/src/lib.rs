// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::actor_error::*;
pub use self::builtin::*;
pub use self::outcome::Outcome;
pub use self::runtime::*;
pub use self::util::*;
pub use dispatch::{dispatch, dispatch_verbatim, Dispatch, DispatchVerbatim, Dispatcher};

pub mod actor_error;
pub mod builtin;
mod dispatch;
mod outcome;
pub mod runtime;
pub mod util;

pub mod test_blockstores;

#[cfg(feature = "test_utils")]
pub mod test_utils;
