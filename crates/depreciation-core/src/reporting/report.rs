//! Single-asset depreciation report wrapped in the standard output envelope.

use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::depreciation::engine::DepreciationEngine;
use crate::depreciation::input::DepreciationInput;
use crate::depreciation::method::DepreciationMethod;
use crate::depreciation::schedule::{self, ScheduleEntry};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::DepreciationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Last month to include in the monthly schedule
    pub horizon: Option<NaiveDate>,
    /// Include the monthly schedule in the output
    pub include_monthly: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationReport {
    pub method: DepreciationMethod,
    pub depreciable_cost: Money,
    pub salvage_value: Money,
    pub depreciable_amount: Money,
    pub useful_life_months: u32,
    /// First day after the final depreciation month
    pub life_end_date: NaiveDate,
    pub total_depreciation: Money,
    pub final_book_value: Money,
    pub annual_schedule: Vec<ScheduleEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monthly_schedule: Vec<ScheduleEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn depreciation_report(
    engine: &DepreciationEngine,
    input: &DepreciationInput,
    options: &ReportOptions,
) -> DepreciationResult<ComputationOutput<DepreciationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = engine.plan(input);
    if input.method().is_declining() {
        if let (Some(first), Some(last)) = (plan.annual_expenses.first(), plan.annual_expenses.last()) {
            if plan.annual_expenses.len() > 1 && last > first {
                warnings.push(format!(
                    "Declining balance leaves {} to true up in the final depreciation year",
                    last.round_dp(2)
                ));
            }
        }
    }

    let annual_schedule = engine.annual_schedule(input)?;
    let monthly_schedule = if options.include_monthly || options.horizon.is_some() {
        engine.monthly_schedule(input, options.horizon)?
    } else {
        Vec::new()
    };
    if let Some(horizon) = options.horizon {
        if (monthly_schedule.len() as u32) < input.useful_life_months() {
            warnings.push(format!("Monthly schedule truncated at horizon {horizon}"));
        }
    }

    let total_depreciation = schedule::total_expense(&annual_schedule);
    let final_book_value = annual_schedule
        .last()
        .map(|e| e.book_value)
        .unwrap_or_else(|| input.depreciable_cost());

    let report = DepreciationReport {
        method: input.method(),
        depreciable_cost: input.depreciable_cost(),
        salvage_value: input.salvage_value(),
        depreciable_amount: input.depreciable_amount(),
        useful_life_months: input.useful_life_months(),
        life_end_date: input.life_end_date()?,
        total_depreciation,
        final_book_value,
        annual_schedule,
        monthly_schedule,
    };

    let assumptions = json!({
        "convention": "full_month",
        "decimal_places": engine.config().decimal_places,
        "in_service_date": input.in_service_date(),
        "useful_life_years": input.useful_life_years(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(input.method()),
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

fn methodology(method: DepreciationMethod) -> &'static str {
    match method {
        DepreciationMethod::StraightLine => {
            "Straight-line: depreciable amount spread evenly over the useful life in months"
        }
        DepreciationMethod::DecliningBalance => {
            "Declining balance: 1/L of prior book value per year, floored at salvage"
        }
        DepreciationMethod::DoubleDecliningBalance => {
            "Double declining balance: 2/L of prior book value per year, floored at salvage"
        }
        DepreciationMethod::SumOfYearsDigits => {
            "Sum of years' digits: (L - y + 1) / (L(L+1)/2) of depreciable amount per year"
        }
    }
}
