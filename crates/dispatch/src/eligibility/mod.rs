//! Restaurant eligibility and distance ranking.
//!
//! - [`menu`] - which products each restaurant has in stock
//! - [`distance`] - great-circle distance between two coordinates
//! - [`matcher`] - ranks eligible restaurants for every unassigned order

pub mod distance;
pub mod matcher;
pub mod menu;

pub use distance::{distance, great_circle_km};
pub use matcher::{
    Assignment, EligibilityReport, OrderEligibility, OrderFulfillmentMatcher, RankedRestaurant,
};
pub use menu::{MenuAvailabilityIndex, ProductAvailability, availability_matrix};
