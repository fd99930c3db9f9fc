mod collection;
mod color;
mod day_plan;
pub mod ids;
mod item;
mod migration;
mod trip;

pub use collection::TripCollection;
pub use color::{color_for, PALETTE};
pub use day_plan::DayPlan;
pub use item::ItineraryItem;
pub use migration::{migrate_trip, migrate_value, MigrationError, TripRecord};
pub use trip::{date_range, Trip, TripError};
