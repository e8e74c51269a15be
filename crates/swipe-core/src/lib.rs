//! Core types and trait definitions for the Swipe answer-aggregation service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::SwipeStore`]; the HTTP layer calls the
//! validated operations in [`ballot`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod answer;
pub mod ballot;
pub mod error;
pub mod room;
pub mod store;
pub mod tally;

pub use error::{Error, Result};
