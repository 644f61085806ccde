//! Core types for Foodcart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod price;
pub mod status;

pub use geo::{Coordinates, CoordinatesError, Distance};
pub use id::*;
pub use price::{NegativePrice, Price};
pub use status::*;
