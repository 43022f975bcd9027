//! Test doubles shared by unit tests and the integration suites in `tests/`.
//!
//! Compiled for `cargo test` and behind the `test-support` feature.

mod clock;
mod memory_store;

pub use clock::MutableClock;
pub use memory_store::MemoryStore;
