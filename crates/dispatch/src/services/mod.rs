//! Business logic services for dispatch.
//!
//! # Services
//!
//! - `dispatch` - Builds the staff dispatch board and the menu availability grid

pub mod dispatch;

pub use dispatch::{
    AvailabilityBoard, DispatchError, DispatchRow, DispatchService, RestaurantColumn,
};
