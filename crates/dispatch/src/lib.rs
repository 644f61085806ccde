//! Foodcart Dispatch library.
//!
//! Decides which restaurants can prepare each unassigned order and ranks
//! them by distance from the delivery address.
//!
//! # Pipeline
//!
//! ```text
//! menu items ──> MenuAvailabilityIndex ──┐
//! addresses  ──> GeocodeCache ───────────┼──> OrderFulfillmentMatcher ──> dispatch board
//! coordinates ─> great-circle distance ──┘
//! ```
//!
//! The library is split so the binary and the CLI share the same
//! configuration, repositories and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod geocoder;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
