use castaway::cast;
use std::marker::PhantomData;

use fvm_ipld_encoding::RawBytes;
use serde::{Deserialize, Serialize};

use crate::util::cbor::is_empty_params;
use crate::ActorError;

/// Implement actor method dispatch:
///
/// ```ignore
/// type Actor;
/// #[derive(FromPrimitive)]
/// #[repr(u64)]
/// enum Method {
///     Constructor = 0,
/// }
/// impl ActorCode for Actor {
///     type Methods = Method;
///     actor_dispatch! {
///         Constructor => constructor,
///     }
/// }
/// ```
///
/// A method tagged `[verbatim]` returns `RawBytes` which are passed back unchanged.
/// Method numbers without a variant are rejected with `USR_UNHANDLED_MESSAGE` before any
/// actor code runs.
#[macro_export]
macro_rules! actor_dispatch {
    ($($(#[$m:meta])* $($method:ident)|* => $func:ident $([$tag:ident])?,)*) => {
        fn invoke_method<RT>(
            rt: &mut RT,
            method: fvm_shared::MethodNum,
            args: &fvm_ipld_encoding::RawBytes,
        ) -> Result<fvm_ipld_encoding::RawBytes, $crate::ActorError>
        where
            RT: $crate::runtime::Runtime,
        {
            match <Self::Methods as num_traits::FromPrimitive>::from_u64(method) {
                $($(#[$m])*
                  Some($(Self::Methods::$method)|*) =>
                  $crate::actor_dispatch!(@target rt args $func $($tag)?),)*
                None => Err($crate::actor_error!(unhandled_message; "invalid method: {}", method)),
            }
        }
    };
    (@target $rt:ident $args:ident $func:ident verbatim) => {
        $crate::dispatch_verbatim($rt, Self::$func, $args)
    };
    (@target $rt:ident $args:ident $func:ident) => {
        $crate::dispatch($rt, Self::$func, $args)
    };
}

pub trait Dispatch<'de, RT> {
    fn call(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError>;
}

pub struct Dispatcher<F, A> {
    func: F,
    _marker: PhantomData<fn(A)>,
}

impl<F, A> Dispatcher<F, A> {
    const fn new(f: F) -> Self {
        Dispatcher { func: f, _marker: PhantomData }
    }
}

/// Dispatch an actor method, deserializing the input and re-serializing the output.
///
/// This method automatically handles:
///
/// - Requiring an empty payload (no bytes, or the encoded empty list) for methods with no
///   parameters, and a decodable payload for methods with one.
/// - Returning empty bytes if the return type is `Result<(), ActorError>`.
#[doc(hidden)]
pub fn dispatch<'de, F, A, RT>(
    rt: &mut RT,
    func: F,
    arg: &'de RawBytes,
) -> Result<RawBytes, ActorError>
where
    Dispatcher<F, A>: Dispatch<'de, RT>,
{
    Dispatcher::new(func).call(rt, arg)
}

/// Like [`dispatch`], but the method's return bytes are passed through without re-encoding.
/// Used by methods whose return value has a raw byte form, or that relay another actor's.
#[doc(hidden)]
pub fn dispatch_verbatim<'de, F, A, RT>(
    rt: &mut RT,
    func: F,
    arg: &'de RawBytes,
) -> Result<RawBytes, ActorError>
where
    Dispatcher<F, A>: DispatchVerbatim<'de, RT>,
{
    Dispatcher::new(func).call_verbatim(rt, arg)
}

pub trait DispatchVerbatim<'de, RT> {
    fn call_verbatim(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError>;
}

/// Convert the passed value into return bytes, or empty bytes if it's `()`.
fn maybe_into_bytes<T: Serialize>(v: T) -> Result<RawBytes, ActorError> {
    if cast!(&v, &()).is_ok() {
        Ok(RawBytes::default())
    } else {
        Ok(RawBytes::serialize(&v)?)
    }
}

impl<'de, F, R, RT> Dispatch<'de, RT> for Dispatcher<F, ()>
where
    F: FnOnce(&mut RT) -> Result<R, ActorError>,
    R: Serialize,
{
    fn call(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError> {
        if is_empty_params(args) {
            maybe_into_bytes((self.func)(rt)?)
        } else {
            Err(ActorError::illegal_argument("method expects no arguments".into()))
        }
    }
}

impl<'de, F, A, R, RT> Dispatch<'de, RT> for Dispatcher<F, (A,)>
where
    F: FnOnce(&mut RT, A) -> Result<R, ActorError>,
    A: Deserialize<'de>,
    R: Serialize,
{
    fn call(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError> {
        if args.is_empty() {
            return Err(ActorError::illegal_argument("method expects arguments".into()));
        }
        let arg = fvm_ipld_encoding::from_slice(args)?;
        maybe_into_bytes((self.func)(rt, arg)?)
    }
}

impl<'de, F, RT> DispatchVerbatim<'de, RT> for Dispatcher<F, ()>
where
    F: FnOnce(&mut RT) -> Result<RawBytes, ActorError>,
{
    fn call_verbatim(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError> {
        if is_empty_params(args) {
            (self.func)(rt)
        } else {
            Err(ActorError::illegal_argument("method expects no arguments".into()))
        }
    }
}

impl<'de, F, A, RT> DispatchVerbatim<'de, RT> for Dispatcher<F, (A,)>
where
    F: FnOnce(&mut RT, A) -> Result<RawBytes, ActorError>,
    A: Deserialize<'de>,
{
    fn call_verbatim(self, rt: &mut RT, args: &'de RawBytes) -> Result<RawBytes, ActorError> {
        if args.is_empty() {
            return Err(ActorError::illegal_argument("method expects arguments".into()));
        }
        (self.func)(rt, fvm_ipld_encoding::from_slice(args)?)
    }
}

#[test]
fn test_dispatch() {
    use crate::util::cbor::EMPTY_PARAMS;
    use crate::{ActorError, FaultKind};
    use fvm_ipld_encoding::tuple::*;
    use fvm_shared::error::ExitCode;

    #[derive(Serialize_tuple, Deserialize_tuple)]
    struct SomeArgs {
        foo: String,
    }

    trait Runtime {}
    struct MockRuntime;
    impl Runtime for MockRuntime {}

    fn with_arg(_: &mut impl Runtime, foo: SomeArgs) -> Result<(), ActorError> {
        assert_eq!(foo.foo, "foo");
        Ok(())
    }

    fn with_arg_ret(_: &mut impl Runtime, foo: SomeArgs) -> Result<SomeArgs, ActorError> {
        Ok(foo)
    }

    fn without_arg(_: &mut impl Runtime) -> Result<(), ActorError> {
        Ok(())
    }

    fn relay(_: &mut impl Runtime, _: SomeArgs) -> Result<RawBytes, ActorError> {
        Ok(RawBytes::new(b"7".to_vec()))
    }

    fn raw_total(_: &mut impl Runtime) -> Result<RawBytes, ActorError> {
        Ok(RawBytes::new(vec![0, 5]))
    }

    let mut rt = MockRuntime;
    let arg = RawBytes::serialize(SomeArgs { foo: "foo".into() })
        .expect("failed to serialize arguments");

    // Correct dispatch
    assert!(dispatch(&mut rt, with_arg, &arg).expect("failed to dispatch").is_empty());
    assert!(dispatch(&mut rt, without_arg, &RawBytes::default())
        .expect("failed to dispatch")
        .is_empty());
    assert!(dispatch(&mut rt, without_arg, &EMPTY_PARAMS).expect("failed to dispatch").is_empty());
    assert_eq!(dispatch(&mut rt, with_arg_ret, &arg).expect("failed to dispatch"), arg);
    let ret = dispatch_verbatim(&mut rt, relay, &arg).expect("failed to dispatch");
    assert_eq!(ret.to_vec(), b"7".to_vec());
    let ret = dispatch_verbatim(&mut rt, raw_total, &EMPTY_PARAMS).expect("failed to dispatch");
    assert_eq!(ret.to_vec(), vec![0, 5]);

    // Incorrect dispatch
    let err = dispatch(&mut rt, with_arg, &RawBytes::default())
        .expect_err("should have required an argument");
    assert_eq!(err.exit_code(), ExitCode::USR_ILLEGAL_ARGUMENT);
    let _ = dispatch(&mut rt, without_arg, &arg).expect_err("should have rejected an argument");
    let err = dispatch_verbatim(&mut rt, raw_total, &arg)
        .expect_err("should have rejected an argument");
    assert_eq!(err.exit_code(), ExitCode::USR_ILLEGAL_ARGUMENT);
    let _ = dispatch_verbatim(&mut rt, relay, &RawBytes::default())
        .expect_err("should have required an argument");

    // Undecodable arguments are a serialization fault
    let err = dispatch(&mut rt, with_arg, &RawBytes::new(vec![0xff, 0x00]))
        .expect_err("should have failed to decode");
    assert_eq!(err.fault_kind(), Some(FaultKind::Serialization));
}
