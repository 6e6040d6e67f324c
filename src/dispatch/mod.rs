//! Request queue & dispatcher.
//!
//! This module provides:
//! * [`Dispatcher`] — FIFO, single-flight submission handle.
//! * [`RateWindow`] — rolling transmission counter (55 per 60 s by default).
//! * [`RetryPolicy`] — linear backoff for transient failures.
//! * [`DispatchStatus`] — advisory status broadcast for the UI.
//!
//! Every submission settles with a [`NormalizedResult`](crate::llm::NormalizedResult):
//! usable text, structured data, or an explicit failure marker.

pub mod queue;
pub mod rate;
pub mod retry;
pub mod status;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use queue::Dispatcher;
pub use rate::RateWindow;
pub use retry::RetryPolicy;
pub use status::DispatchStatus;
