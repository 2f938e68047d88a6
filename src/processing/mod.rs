//! Tower location resolution

pub mod cache;
pub mod resolver;

pub use cache::{CacheStatistics, LocationCache};
pub use resolver::TowerLocationResolver;
