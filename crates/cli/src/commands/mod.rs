//! CLI command implementations.

pub mod geocode;
pub mod matching;
pub mod migrate;
