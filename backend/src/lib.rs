//! Care agency scheduling core.
//!
//! Shift scheduling with conflict detection, shift swaps, gated time clock
//! attendance, weekly overtime buckets and recurring appointment generation.
//! Services live in [`domain`] and depend only on port traits; Diesel
//! adapters live in [`outbound`].

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
