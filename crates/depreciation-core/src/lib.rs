pub mod calendar;
pub mod config;
pub mod depreciation;
pub mod error;
pub mod types;

#[cfg(feature = "reporting")]
pub mod reporting;

pub use config::EngineConfig;
pub use depreciation::engine::DepreciationEngine;
pub use error::DepreciationError;
pub use types::*;

/// Standard result type for all depreciation operations
pub type DepreciationResult<T> = Result<T, DepreciationError>;
