//! Common structs for churn records shared across crates.

mod error;
mod feature;
mod model;
mod raw;
mod schema;

pub use error::*;
pub use feature::*;
pub use model::*;
pub use raw::*;
pub use schema::*;
