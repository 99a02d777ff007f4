//! Fixed-asset depreciation engine.
//!
//! Turns an asset's cost, in-service date, useful life, salvage floor and
//! method into annual and monthly schedules and point-in-time book values,
//! and re-bases the asset when a capital improvement lands mid-life.
//!
//! The free functions below run with `EngineConfig::default()`; use
//! [`engine::DepreciationEngine`] to choose precision and policies.

pub mod engine;
pub mod improvement;
pub mod input;
pub mod method;
pub mod plan;
pub mod record;
pub mod schedule;

use chrono::NaiveDate;

pub use engine::DepreciationEngine;
pub use improvement::{AssetHistory, ImprovementOutcome, Rebasing, SalvagePolicy};
pub use input::{AssetPayload, AssetTerms, CapitalImprovement, DepreciationInput};
pub use method::{validate_method, DepreciationMethod, MethodPolicy};
pub use record::{AssetRecord, NormalizedAsset};
pub use schedule::ScheduleEntry;

use crate::types::Money;
use crate::DepreciationResult;

/// Annual schedule, one entry per calendar year of the life.
pub fn compute_annual_schedule(input: &DepreciationInput) -> DepreciationResult<Vec<ScheduleEntry>> {
    DepreciationEngine::default().annual_schedule(input)
}

/// Monthly schedule through the end of the life or `horizon`, whichever
/// comes first.
pub fn compute_monthly_schedule(
    input: &DepreciationInput,
    horizon: Option<NaiveDate>,
) -> DepreciationResult<Vec<ScheduleEntry>> {
    DepreciationEngine::default().monthly_schedule(input, horizon)
}

/// Book value as of `as_of`.
pub fn book_value_at(input: &DepreciationInput, as_of: NaiveDate) -> DepreciationResult<Money> {
    DepreciationEngine::default().book_value_at(input, as_of)
}

/// Re-base `input` for a capital improvement, carrying salvage forward.
pub fn apply_improvement(
    input: &DepreciationInput,
    prior_schedule: &[ScheduleEntry],
    improvement: &CapitalImprovement,
    new_remaining_useful_life_months: u32,
) -> DepreciationResult<Rebasing> {
    DepreciationEngine::default().apply_improvement(
        input,
        prior_schedule,
        improvement,
        new_remaining_useful_life_months,
    )
}
