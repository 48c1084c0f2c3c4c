//! Cooperative cancellation with cleanup guarantees.

mod token;

pub use token::{CancelObserver, CancellationToken};
