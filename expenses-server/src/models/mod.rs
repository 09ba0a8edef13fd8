//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod expense;

pub use validation::ValidationError;
pub use expense::ExpenseDraft;
