//! Failure taxonomy.
//!
//! Operation failures are the caller's own error type and pass through
//! untouched. Only the failures this workspace manufactures itself get a type
//! here: timeouts raised by an attempt's timer, and the aggregate raised when
//! every input of `any` rejects.

use std::time::Duration;

use thiserror::Error;

/// An attempt's timer fired before the operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Timeout: attempt did not settle within {}ms", .after.as_millis())]
pub struct TimeoutError {
    /// The timeout the attempt was armed with.
    pub after: Duration,
}

impl TimeoutError {
    #[must_use]
    pub const fn new(after: Duration) -> Self {
        Self { after }
    }
}

/// Every input rejected; the reasons are kept in input order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("All promises were rejected")]
pub struct AggregateError<E> {
    errors: Vec<E>,
}

impl<E> AggregateError<E> {
    #[must_use]
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The failure of the last attempt of a retry sequence.
///
/// The kind is preserved: a timed-out final attempt surfaces as `Timeout`,
/// an operation that rejected surfaces its own error unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error("{0}")]
    Operation(E),
}

impl<E> RetryError<E> {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    #[must_use]
    pub const fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Timeout(_) => None,
        }
    }

    #[must_use]
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Timeout(_) => None,
        }
    }
}
