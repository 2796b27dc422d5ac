//! Error translation.
//!
//! Every failure inside sqlbridge leaves through [`translate`] or
//! [`translate_with_cause`]. The caller decides which error type comes out by
//! supplying an [`ErrorFactory`]; sqlbridge never names that type itself.
//!
//! Any closure `Fn(String, Option<DriverError>) -> E` is a factory:
//!
//! ```
//! use sqlbridge::core::{translate, DriverError};
//!
//! #[derive(Debug)]
//! struct StoreError {
//!     message: String,
//!     cause: Option<DriverError>,
//! }
//!
//! let factory = |message, cause| StoreError { message, cause };
//! let err = translate(&factory, "out of disk").into_translated().unwrap();
//! assert_eq!(err.message, "out of disk");
//! assert!(err.cause.is_none());
//! ```

use crate::core::error::{AccessError, ConstructionError, DriverError};
use std::any::type_name;
use std::marker::PhantomData;
use tracing::error;

/// Builds the caller's error kind from a message, or a message and a cause.
pub trait ErrorFactory {
    type Error;

    fn with_message(&self, message: String) -> Result<Self::Error, ConstructionError>;

    fn with_cause(&self, message: String, cause: DriverError)
        -> Result<Self::Error, ConstructionError>;
}

impl<E, F> ErrorFactory for F
where
    F: Fn(String, Option<DriverError>) -> E,
{
    type Error = E;

    fn with_message(&self, message: String) -> Result<E, ConstructionError> {
        Ok(self(message, None))
    }

    fn with_cause(&self, message: String, cause: DriverError) -> Result<E, ConstructionError> {
        Ok(self(message, Some(cause)))
    }
}

/// Factory for error kinds that only accept a message.
///
/// Asking it for the causal form is a construction failure, mirroring an
/// error type without a `(message, cause)` constructor.
pub struct MessageOnly<F, E> {
    build: F,
    _kind: PhantomData<fn() -> E>,
}

impl<F, E> MessageOnly<F, E>
where
    F: Fn(String) -> E,
{
    pub fn new(build: F) -> Self {
        Self {
            build,
            _kind: PhantomData,
        }
    }
}

impl<F, E> ErrorFactory for MessageOnly<F, E>
where
    F: Fn(String) -> E,
{
    type Error = E;

    fn with_message(&self, message: String) -> Result<E, ConstructionError> {
        Ok((self.build)(message))
    }

    fn with_cause(&self, _message: String, _cause: DriverError) -> Result<E, ConstructionError> {
        Err(ConstructionError::NoCauseConstructor {
            kind: type_name::<E>(),
        })
    }
}

/// Factory whose construction may itself fail.
pub struct Fallible<F, E> {
    build: F,
    _kind: PhantomData<fn() -> E>,
}

impl<F, E> Fallible<F, E>
where
    F: Fn(String, Option<DriverError>) -> Result<E, ConstructionError>,
{
    pub fn new(build: F) -> Self {
        Self {
            build,
            _kind: PhantomData,
        }
    }
}

impl<F, E> ErrorFactory for Fallible<F, E>
where
    F: Fn(String, Option<DriverError>) -> Result<E, ConstructionError>,
{
    type Error = E;

    fn with_message(&self, message: String) -> Result<E, ConstructionError> {
        (self.build)(message, None)
    }

    fn with_cause(&self, message: String, cause: DriverError) -> Result<E, ConstructionError> {
        (self.build)(message, Some(cause))
    }
}

/// Factory for error kinds that can only be built with a cause.
///
/// The counterpart of [`MessageOnly`]: asking it for the message-only form
/// is a construction failure.
pub struct CauseOnly<F, E> {
    build: F,
    _kind: PhantomData<fn() -> E>,
}

impl<F, E> CauseOnly<F, E>
where
    F: Fn(String, DriverError) -> E,
{
    pub fn new(build: F) -> Self {
        Self {
            build,
            _kind: PhantomData,
        }
    }
}

impl<F, E> ErrorFactory for CauseOnly<F, E>
where
    F: Fn(String, DriverError) -> E,
{
    type Error = E;

    fn with_message(&self, _message: String) -> Result<E, ConstructionError> {
        Err(ConstructionError::NoMessageConstructor {
            kind: type_name::<E>(),
        })
    }

    fn with_cause(&self, message: String, cause: DriverError) -> Result<E, ConstructionError> {
        Ok((self.build)(message, cause))
    }
}

/// Translates a failure that has no underlying cause.
pub fn translate<F: ErrorFactory>(
    factory: &F,
    message: impl Into<String>,
) -> AccessError<F::Error> {
    let message = message.into();
    match factory.with_message(message.clone()) {
        Ok(err) => AccessError::Translated(err),
        Err(source) => {
            error!(%message, error = %source, "could not construct caller error");
            AccessError::Untranslated {
                message,
                source,
                cause: None,
            }
        }
    }
}

/// Translates a failure caused by a driver error.
///
/// The factory consumes the cause, so a second copy is kept for the
/// untranslated outcome.
pub fn translate_with_cause<F: ErrorFactory>(
    factory: &F,
    message: impl Into<String>,
    cause: DriverError,
) -> AccessError<F::Error> {
    let message = message.into();
    let retained = cause.detach();
    match factory.with_cause(message.clone(), cause) {
        Ok(err) => AccessError::Translated(err),
        Err(source) => {
            error!(
                %message,
                cause = %retained,
                error = %source,
                "could not construct caller error"
            );
            AccessError::Untranslated {
                message,
                source,
                cause: Some(retained),
            }
        }
    }
}
