//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//!
//! Adapters are thin translators between domain types and storage rows. Every
//! check-then-act invariant the services rely on is backed by a constraint
//! declared in the migrations.

pub mod persistence;
