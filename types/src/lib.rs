//! Core types for settle.
//!
//! This crate contains pure types with no IO, no async, and minimal dependencies:
//! the failure taxonomy surfaced by combinators and retry, the outcome records
//! produced by `all_settled`, and the resolved retry policy.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod errors;
mod policy;
mod settlement;

pub use errors::{AggregateError, RetryError, TimeoutError};
pub use policy::{
    DEFAULT_DELAY, DEFAULT_RETRIES, DEFAULT_TIMEOUT, PolicyError, RetryPolicy,
};
pub use settlement::{PromiseState, Settlement};
