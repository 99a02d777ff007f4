use serde::{Deserialize, Serialize};

use crate::depreciation::improvement::SalvagePolicy;
use crate::depreciation::method::MethodPolicy;
use crate::error::DepreciationError;
use crate::DepreciationResult;

const DEFAULT_DECIMAL_PLACES: u32 = 2;
const MAX_DECIMAL_PLACES: u32 = 8;
const DEFAULT_MAX_QUERY_YEARS: u32 = 200;

/// Engine-wide settings. Every field has a default so partial config files
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Precision of emitted schedule values
    pub decimal_places: u32,
    /// What to do with an unrecognised method string
    pub method_policy: MethodPolicy,
    /// How salvage value is carried across a capital improvement
    pub salvage_policy: SalvagePolicy,
    /// Point-in-time queries further than this many years from the
    /// in-service date are rejected
    pub max_query_years: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            decimal_places: DEFAULT_DECIMAL_PLACES,
            method_policy: MethodPolicy::default(),
            salvage_policy: SalvagePolicy::default(),
            max_query_years: DEFAULT_MAX_QUERY_YEARS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> DepreciationResult<()> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(DepreciationError::InvalidInput {
                field: "decimal_places".into(),
                reason: format!("Precision must be at most {MAX_DECIMAL_PLACES} decimal places"),
            });
        }
        if self.max_query_years == 0 {
            return Err(DepreciationError::InvalidInput {
                field: "max_query_years".into(),
                reason: "Query bound must be at least one year".into(),
            });
        }
        Ok(())
    }
}
