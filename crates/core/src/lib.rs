//! Foodcart Core - Shared types library.
//!
//! This crate provides common types used across the Foodcart components:
//! - `dispatch` - Order dispatch backend (eligibility and distance ranking)
//! - `cli` - Command-line tools for migrations and one-off matching passes
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, coordinates, distances, prices and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
