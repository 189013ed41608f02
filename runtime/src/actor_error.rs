// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt::{self, Display};

use fvm_shared::error::ExitCode;
use thiserror::Error;

/// Rejection code for unsupported input: a bad sector size, a caller that is not a registered
/// miner or a lookup of a non-member.
pub const ERR_UNSUPPORTED: ExitCode = ExitCode::new(1);

/// Rejection code for a downstream actor refusing an Exec on our behalf.
pub const ERR_DOWNSTREAM_REJECTED: ExitCode = ExitCode::new(2);

/// Kinds of VM-level faults. A fault aborts the whole top-level message and rolls back
/// every nested state change, unlike a rejection which only carries an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A value could not be encoded, or stored bytes could not be decoded.
    Serialization,
    /// The blockstore failed to read or write a block.
    StoreIo,
    /// A commit named an old head that is no longer the actor's current head.
    HeadMismatch,
    /// Bytes returned by another actor did not parse as the expected value.
    MalformedBytes,
    /// Actor state is missing or internally inconsistent.
    IllegalState,
    /// The runtime contract was violated, e.g. a send inside a transaction.
    Assertion,
}

impl FaultKind {
    /// Exit code a VM reports for a message aborted by this kind of fault.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            FaultKind::Serialization | FaultKind::MalformedBytes => ExitCode::USR_SERIALIZATION,
            FaultKind::StoreIo | FaultKind::HeadMismatch | FaultKind::IllegalState => {
                ExitCode::USR_ILLEGAL_STATE
            }
            FaultKind::Assertion => ExitCode::USR_ASSERTION_FAILED,
        }
    }
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::Serialization => "serialization",
            FaultKind::StoreIo => "store i/o",
            FaultKind::HeadMismatch => "head mismatch",
            FaultKind::MalformedBytes => "malformed bytes",
            FaultKind::IllegalState => "illegal state",
            FaultKind::Assertion => "assertion failed",
        };
        f.write_str(s)
    }
}

/// The error type returned by actor method calls.
///
/// An error is either a domain rejection, identified only by its exit code, or a VM fault
/// which additionally carries a [`FaultKind`]. The message is for logs; it never reaches the
/// chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ActorError(exit_code: {exit_code:?}, fault: {fault:?}, msg: {msg})")]
pub struct ActorError {
    exit_code: ExitCode,
    fault: Option<FaultKind>,
    msg: String,
}

impl ActorError {
    /// Creates a rejection with an arbitrary exit code, e.g. one forwarded from a callee.
    pub fn unchecked(code: ExitCode, msg: String) -> Self {
        Self { exit_code: code, fault: None, msg }
    }

    /// Creates a fault of the given kind.
    pub fn fault(kind: FaultKind, msg: String) -> Self {
        Self { exit_code: kind.exit_code(), fault: Some(kind), msg }
    }

    pub fn unsupported(msg: String) -> Self {
        Self::unchecked(ERR_UNSUPPORTED, msg)
    }
    pub fn downstream_rejected(msg: String) -> Self {
        Self::unchecked(ERR_DOWNSTREAM_REJECTED, msg)
    }
    pub fn illegal_argument(msg: String) -> Self {
        Self::unchecked(ExitCode::USR_ILLEGAL_ARGUMENT, msg)
    }
    pub fn forbidden(msg: String) -> Self {
        Self::unchecked(ExitCode::USR_FORBIDDEN, msg)
    }
    pub fn not_found(msg: String) -> Self {
        Self::unchecked(ExitCode::USR_NOT_FOUND, msg)
    }
    pub fn insufficient_funds(msg: String) -> Self {
        Self::unchecked(ExitCode::USR_INSUFFICIENT_FUNDS, msg)
    }
    pub fn unhandled_message(msg: String) -> Self {
        Self::unchecked(ExitCode::USR_UNHANDLED_MESSAGE, msg)
    }

    pub fn serialization(msg: String) -> Self {
        Self::fault(FaultKind::Serialization, msg)
    }
    pub fn store_io(msg: String) -> Self {
        Self::fault(FaultKind::StoreIo, msg)
    }
    pub fn head_mismatch(msg: String) -> Self {
        Self::fault(FaultKind::HeadMismatch, msg)
    }
    pub fn malformed_bytes(msg: String) -> Self {
        Self::fault(FaultKind::MalformedBytes, msg)
    }
    pub fn illegal_state(msg: String) -> Self {
        Self::fault(FaultKind::IllegalState, msg)
    }
    pub fn assertion_failed(msg: String) -> Self {
        Self::fault(FaultKind::Assertion, msg)
    }

    /// Returns the exit code of the error.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Returns the fault kind, or `None` for a domain rejection.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        self.fault
    }

    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Error message of the actor error.
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Prefix error message with a string message.
    pub fn wrap(mut self, msg: impl AsRef<str>) -> Self {
        self.msg = format!("{}: {}", msg.as_ref(), self.msg);
        self
    }
}

/// Converts a raw encoding error into a serialization fault.
impl From<fvm_ipld_encoding::Error> for ActorError {
    fn from(e: fvm_ipld_encoding::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

/// Convenience macro for generating Actor Errors
#[macro_export]
macro_rules! actor_error {
    // Error with only one stringable expression
    ( $code:ident; $msg:expr ) => { $crate::ActorError::$code($msg.to_string()) };

    // String with positional arguments
    ( $code:ident; $msg:literal $(, $ex:expr)+ ) => {
        $crate::ActorError::$code(format!($msg, $($ex,)*))
    };

    // Error with only one stringable expression, with comma separator
    ( $code:ident, $msg:expr ) => { $crate::actor_error!($code; $msg) };

    // String with positional arguments, with comma separator
    ( $code:ident, $msg:literal $(, $ex:expr)+ ) => {
        $crate::actor_error!($code; $msg $(, $ex)*)
    };
}

// Adds context to an actor error's descriptive message.
pub trait ActorContext<T> {
    fn context<C>(self, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static;

    fn with_context<C, F>(self, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C;
}

impl<T> ActorContext<T> for Result<T, ActorError> {
    fn context<C>(self, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.map_err(|err| err.wrap(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|err| err.wrap(f().to_string()))
    }
}

// Adapts a target into an actor error.
// The `*_code` methods produce rejections, the `*_fault` methods produce faults.
pub trait AsActorError<T>: Sized {
    fn exit_code(self, code: ExitCode) -> Result<T, ActorError>;

    fn context_code<C>(self, code: ExitCode, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static;

    fn with_context_code<C, F>(self, code: ExitCode, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C;

    fn context_fault<C>(self, kind: FaultKind, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static;

    fn with_context_fault<C, F>(self, kind: FaultKind, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C;
}

// Note: E should be std::error::Error, revert to this after anyhow:Error is no longer used.
impl<T, E: Display> AsActorError<T> for Result<T, E> {
    fn exit_code(self, code: ExitCode) -> Result<T, ActorError> {
        self.map_err(|err| ActorError::unchecked(code, err.to_string()))
    }

    fn context_code<C>(self, code: ExitCode, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.map_err(|err| ActorError::unchecked(code, format!("{}: {}", context, err)))
    }

    fn with_context_code<C, F>(self, code: ExitCode, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|err| ActorError::unchecked(code, format!("{}: {}", f(), err)))
    }

    fn context_fault<C>(self, kind: FaultKind, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.map_err(|err| ActorError::fault(kind, format!("{}: {}", context, err)))
    }

    fn with_context_fault<C, F>(self, kind: FaultKind, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|err| ActorError::fault(kind, format!("{}: {}", f(), err)))
    }
}

impl<T> AsActorError<T> for Option<T> {
    fn exit_code(self, code: ExitCode) -> Result<T, ActorError> {
        self.ok_or_else(|| ActorError::unchecked(code, "None".to_string()))
    }

    fn context_code<C>(self, code: ExitCode, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.ok_or_else(|| ActorError::unchecked(code, context.to_string()))
    }

    fn with_context_code<C, F>(self, code: ExitCode, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| ActorError::unchecked(code, f().to_string()))
    }

    fn context_fault<C>(self, kind: FaultKind, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.ok_or_else(|| ActorError::fault(kind, context.to_string()))
    }

    fn with_context_fault<C, F>(self, kind: FaultKind, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| ActorError::fault(kind, f().to_string()))
    }
}
