//! Pure transformations: backoff arithmetic and payload validation.

mod retry;
mod validation;

pub use retry::{BackoffPolicy, retry_delay};
pub use validation::{Payload, Record, normalize};
