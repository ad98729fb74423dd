//! Vote module split into types and ballot validation

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::validate_ballot;
