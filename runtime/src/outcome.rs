use fvm_ipld_encoding::RawBytes;
use fvm_shared::error::ExitCode;

use crate::{ActorError, FaultKind};

/// The result of invoking an actor method, as seen from outside the actor.
///
/// Return bytes are only present on success. Rejections keep the callee's state untouched
/// but let the caller continue; faults abort the whole top-level message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(RawBytes),
    Rejected(ExitCode),
    Fault(FaultKind),
}

impl Outcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Ok(_) => ExitCode::OK,
            Outcome::Rejected(code) => *code,
            Outcome::Fault(kind) => kind.exit_code(),
        }
    }

    /// Return payload; empty unless the call succeeded.
    pub fn return_data(&self) -> RawBytes {
        match self {
            Outcome::Ok(bytes) => bytes.clone(),
            _ => RawBytes::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }
}

impl From<Result<RawBytes, ActorError>> for Outcome {
    fn from(res: Result<RawBytes, ActorError>) -> Self {
        match res {
            Ok(bytes) => Outcome::Ok(bytes),
            Err(e) => match e.fault_kind() {
                Some(kind) => {
                    log::error!("fault during invocation: {}", e);
                    Outcome::Fault(kind)
                }
                None => {
                    log::debug!("invocation rejected: {}", e);
                    Outcome::Rejected(e.exit_code())
                }
            },
        }
    }
}
