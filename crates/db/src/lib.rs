//! Database session handles for the bootstrap.
//!
//! [`Store`] is the explicit handle every step receives. [`MongoStore`] talks
//! to a live server; [`MemoryStore`] backs dry runs and tests.

pub mod error;
pub mod memory;
pub mod mongo;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{AppUser, Ensured, Store};
