//! Schedule emission: monthly entries, the annual roll-up and point-in-time
//! book values.
//!
//! Each emitted period carries the rounded *cumulative* depreciation; its
//! expense is the difference from the previous period. Monthly expenses
//! therefore telescope exactly to the annual figures and to the depreciable
//! amount over the whole life.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::input::DepreciationInput;
use super::plan::DepreciationPlan;
use crate::calendar;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One emitted period of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-indexed position in the schedule
    pub period_index: u32,
    pub year: i32,
    /// Calendar month (1-12); `None` for annual entries
    pub month: Option<u32>,
    pub depreciation_expense: Money,
    pub accumulated_depreciation: Money,
    /// Depreciable cost less accumulated depreciation
    pub book_value: Money,
}

impl ScheduleEntry {
    /// `(year, month)` sort key; annual entries sort as month 12.
    pub fn period_key(&self) -> (i32, u32) {
        (self.year, self.month.unwrap_or(12))
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

pub(crate) fn round_money(value: Money, decimal_places: u32) -> Money {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Accumulated depreciation as emitted after `months` whole months. Never
/// exceeds the depreciable amount and lands on it exactly at life end.
pub(crate) fn emitted_accumulated(
    plan: &DepreciationPlan,
    months: u32,
    decimal_places: u32,
) -> Money {
    if months >= plan.useful_life_months {
        return plan.depreciable_amount;
    }
    round_money(plan.accumulated_after(months), decimal_places).min(plan.depreciable_amount)
}

/// Book value after `months` whole months of accrual.
pub(crate) fn book_value_after(
    input: &DepreciationInput,
    plan: &DepreciationPlan,
    months: u32,
    decimal_places: u32,
) -> Money {
    input.depreciable_cost() - emitted_accumulated(plan, months, decimal_places)
}

/// Emit the first `month_count` months of the schedule.
pub(crate) fn monthly_entries(
    input: &DepreciationInput,
    plan: &DepreciationPlan,
    month_count: u32,
    decimal_places: u32,
) -> Vec<ScheduleEntry> {
    let start = input.first_accrual_month();
    let count = month_count.min(plan.useful_life_months);
    let mut entries = Vec::with_capacity(count as usize);
    let mut previous = Decimal::ZERO;

    for m in 0..count {
        let accumulated = emitted_accumulated(plan, m + 1, decimal_places);
        let (year, month) = calendar::year_month(start, m);
        entries.push(ScheduleEntry {
            period_index: m + 1,
            year,
            month: Some(month),
            depreciation_expense: accumulated - previous,
            accumulated_depreciation: accumulated,
            book_value: input.depreciable_cost() - accumulated,
        });
        previous = accumulated;
    }

    entries
}

/// Collapse monthly entries into one entry per calendar year: expenses are
/// summed, accumulated depreciation and book value are taken from the
/// year's last month.
pub fn roll_up_annual(monthly: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
    let mut annual: Vec<ScheduleEntry> = Vec::new();

    for entry in monthly {
        match annual.last_mut() {
            Some(current) if current.year == entry.year => {
                current.depreciation_expense += entry.depreciation_expense;
                current.accumulated_depreciation = entry.accumulated_depreciation;
                current.book_value = entry.book_value;
            }
            _ => {
                let period_index = annual.len() as u32 + 1;
                annual.push(ScheduleEntry {
                    period_index,
                    year: entry.year,
                    month: None,
                    depreciation_expense: entry.depreciation_expense,
                    accumulated_depreciation: entry.accumulated_depreciation,
                    book_value: entry.book_value,
                });
            }
        }
    }

    annual
}

/// Sum of the depreciation expense across `entries`.
pub fn total_expense(entries: &[ScheduleEntry]) -> Money {
    entries.iter().map(|e| e.depreciation_expense).sum()
}
