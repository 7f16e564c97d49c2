//! Input validation and error reporting

pub mod data;
pub mod error;

pub use data::DataValidator;
pub use error::{ErrorReporter, ErrorSeverity, PlacementError};
