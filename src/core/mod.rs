//! Core types and constants for cell tower positioning

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
