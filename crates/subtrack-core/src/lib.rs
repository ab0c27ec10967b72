//! subtrack core — domain models, error taxonomy, repository traits and
//! the billing aggregation engine shared by every other crate.

pub mod aggregation;
pub mod clock;
pub mod error;
pub mod models;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{SubtrackError, SubtrackResult};
