//! Capital improvement re-basing.
//!
//! An improvement never edits an existing input or schedule. It produces a
//! new input whose basis is the book value at the improvement month plus the
//! improvement cost, and the caller splices the two schedules at that month.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::input::{AssetTerms, CapitalImprovement, DepreciationInput, MAX_MONEY};
use super::schedule::ScheduleEntry;
use crate::calendar;
use crate::error::DepreciationError;
use crate::types::Money;
use crate::DepreciationResult;

/// How the salvage floor is set on the re-based input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalvagePolicy {
    /// Keep the prior salvage value unchanged.
    #[default]
    CarryForward,
    /// Apply the prior residual percentage to the new depreciable cost.
    RecomputeFromResidual,
}

/// Result of applying one improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rebasing {
    pub improvement: CapitalImprovement,
    /// Book value of the prior basis when the improvement lands
    pub book_value_at_improvement: Money,
    pub rebased_input: DepreciationInput,
    /// Prior schedule entries strictly before the improvement month
    pub retained_history: Vec<ScheduleEntry>,
}

impl Rebasing {
    /// Join the retained history with a schedule computed from
    /// `rebased_input`. Retained entries are copied untouched; forward
    /// entries are renumbered to continue the period index.
    pub fn splice(&self, forward: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
        let offset = self.retained_history.len() as u32;
        let mut spliced = self.retained_history.clone();
        spliced.extend(forward.iter().enumerate().map(|(i, entry)| ScheduleEntry {
            period_index: offset + i as u32 + 1,
            ..entry.clone()
        }));
        spliced
    }
}

/// A re-basing together with the schedules spliced from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementOutcome {
    pub rebasing: Rebasing,
    /// Retained prior months followed by the re-based months
    pub monthly: Vec<ScheduleEntry>,
    pub annual: Vec<ScheduleEntry>,
}

/// One basis period in an asset's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySegment {
    pub input: DepreciationInput,
    /// Improvement that opened this segment; `None` for the original basis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement: Option<CapitalImprovement>,
    /// Book value of the previous basis when this segment opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_value_at_improvement: Option<Money>,
}

/// Full depreciation history of an asset across its improvements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHistory {
    pub segments: Vec<HistorySegment>,
    /// Spliced monthly schedule. Accumulated depreciation is relative to the
    /// segment basis each entry belongs to.
    pub monthly: Vec<ScheduleEntry>,
    pub annual: Vec<ScheduleEntry>,
}

impl AssetHistory {
    /// Input governing the asset today (the last segment).
    pub fn current_input(&self) -> Option<&DepreciationInput> {
        self.segments.last().map(|s| &s.input)
    }
}

// ---------------------------------------------------------------------------
// Re-basing
// ---------------------------------------------------------------------------

pub(crate) fn validate_improvement(
    input: &DepreciationInput,
    improvement: &CapitalImprovement,
    new_remaining_useful_life_months: u32,
) -> DepreciationResult<()> {
    if new_remaining_useful_life_months == 0 {
        return Err(DepreciationError::invalid(
            "new_remaining_useful_life_months",
            "Remaining useful life must be greater than zero",
        ));
    }
    if improvement.improvement_date < input.in_service_date() {
        return Err(DepreciationError::invalid(
            "improvement_date",
            format!(
                "Improvement date {} precedes in-service date {}",
                improvement.improvement_date,
                input.in_service_date()
            ),
        ));
    }
    if improvement.cost <= Decimal::ZERO {
        return Err(DepreciationError::invalid(
            "cost",
            "Improvement cost must be positive",
        ));
    }
    if improvement.cost > MAX_MONEY {
        return Err(DepreciationError::invalid(
            "cost",
            format!("Improvement cost must not exceed {MAX_MONEY}"),
        ));
    }
    Ok(())
}

/// Build the re-based input from the book value at the improvement month.
pub(crate) fn rebased_input(
    input: &DepreciationInput,
    improvement: &CapitalImprovement,
    book_value_at_improvement: Money,
    new_remaining_useful_life_months: u32,
    policy: SalvagePolicy,
) -> DepreciationResult<DepreciationInput> {
    let depreciable_cost = book_value_at_improvement + improvement.cost;
    let salvage_value = match policy {
        SalvagePolicy::CarryForward => input.salvage_value(),
        SalvagePolicy::RecomputeFromResidual => {
            let pct = input.residual_percentage().ok_or_else(|| {
                DepreciationError::invalid(
                    "residual_percentage",
                    "Recomputing salvage requires the asset's residual percentage",
                )
            })?;
            depreciable_cost * pct / dec!(100)
        }
    };

    DepreciationInput::try_from(AssetTerms {
        acquisition_cost: input.acquisition_cost(),
        depreciable_cost: Some(depreciable_cost),
        in_service_date: improvement.improvement_date,
        useful_life_months: new_remaining_useful_life_months,
        salvage_value: Some(salvage_value),
        residual_percentage: input.residual_percentage(),
        method: input.method(),
    })
}

/// Prior entries that fall strictly before the improvement month. Annual
/// entries survive only if their whole year precedes the improvement.
pub(crate) fn retain_before(prior: &[ScheduleEntry], date: NaiveDate) -> Vec<ScheduleEntry> {
    let cutoff = (date.year(), date.month());
    prior
        .iter()
        .filter(|entry| match entry.month {
            Some(month) => (entry.year, month) < cutoff,
            None => entry.year < cutoff.0,
        })
        .cloned()
        .collect()
}

/// Months of the current basis still unexpired at `date`.
pub fn remaining_life_at(
    input: &DepreciationInput,
    date: NaiveDate,
) -> DepreciationResult<u32> {
    let elapsed = calendar::months_between(input.first_accrual_month(), date).max(0);
    let remaining = i64::from(input.useful_life_months()) - elapsed;
    if remaining <= 0 {
        return Err(DepreciationError::invalid(
            "remaining_useful_life_months",
            format!(
                "Useful life is exhausted at {date}; a remaining useful life must be given"
            ),
        ));
    }
    Ok(remaining as u32)
}
