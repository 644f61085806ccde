//! Domain records supplied by the persistence layer.

pub mod location;
pub mod order;
pub mod restaurant;

pub use location::Location;
pub use order::{Order, OrderLine};
pub use restaurant::{MenuItem, Product, Restaurant};
