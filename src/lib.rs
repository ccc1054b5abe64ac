//! plzcache - build output cache and cleaner
//!
//! Caches build outputs behind an asynchronous store queue and removes
//! output trees, per target or wholesale.

pub mod build;
pub mod cache;
pub mod clean;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{PlzError, PlzResult};
