//! Configuration

pub mod config;

pub use config::{
    ConfigError, DisplayMode, EstimatorConfig, LookupConfig, ResolutionMode, ValidationResult,
};
