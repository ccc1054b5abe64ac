//! Build model consumed by the cache and clean layers
//!
//! Labels, targets, build metadata and the read-only target graph.

pub mod graph;
pub mod label;
pub mod paths;
pub mod state;
pub mod target;

pub use graph::{BuildGraph, Package};
pub use label::BuildLabel;
pub use state::{BuildState, OutputLayout};
pub use target::{BuildMetadata, BuildTarget};
