//! Analysis modules.
//!
//! `stats` holds the numeric primitives; `aggregator` builds the grouped
//! tables from them.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
