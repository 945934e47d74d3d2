//! Analytics over the in-memory vacancy snapshot.

pub mod aggregator;

pub use aggregator::*;
