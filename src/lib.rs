//! Orioz Seed Library
//!
//! Idempotent bootstrap of the Orioz community database: the application
//! user, the collections, and the default administrator.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{connect, run, run_into, run_with, status, StoreStatus};
