//! HTTP block fetching with outcome classification and backoff.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration
//! - [`core`] - Pure transformations (backoff, payload validation)
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! Retry orchestration is left to the caller; this crate only answers
//! "what happened" for one request and "how long to wait" for one attempt.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{BackoffPolicy, Payload, Record, normalize, retry_delay};
pub use data::FetchOptions;
pub use effects::{BlockFetcher, FetchOutcome, HttpClient, HttpResponse, block_url};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result, ValidationError};
