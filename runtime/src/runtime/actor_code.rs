// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use fvm_shared::MethodNum;

use crate::{ActorError, Runtime};

/// Interface for invoking methods on an Actor
pub trait ActorCode {
    type Methods;

    /// A name for the actor type, used in debugging.
    fn name() -> &'static str;

    /// Invokes method with runtime on the actor's code. Method number will match one
    /// defined by the Actor, and parameters will be serialized and used in execution
    fn invoke_method<RT>(
        rt: &mut RT,
        method: MethodNum,
        args: &RawBytes,
    ) -> Result<RawBytes, ActorError>
    where
        RT: Runtime;
}
