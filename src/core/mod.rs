//! Core types and constants for the AR placement engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
