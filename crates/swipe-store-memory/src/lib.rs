//! In-process backend for the Swipe answer store.
//!
//! Everything lives behind one async mutex, so every answer mutation and its
//! aggregate adjustment happen under the same lock acquisition. Nothing
//! survives a restart; use it for demos and tests.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::MemoryStore;
