//! Runway pool and leases.
//!
//! The pool is plain bookkeeping guarded by the tower's critical section.
//! A `RunwayLease` is handed to the operation that took a runway:
//! - `RunwayLease::complete()` returns the runway and records a completion
//! - dropping the lease without completing returns the runway as interrupted

mod lease;
mod pool;

pub use lease::RunwayLease;
pub use pool::{RunwayId, RunwayPool};
