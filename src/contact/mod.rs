//! Contact surface module

pub mod tagging;
pub mod types;

pub use tagging::*;
pub use types::*;
