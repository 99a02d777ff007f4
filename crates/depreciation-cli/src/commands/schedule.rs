use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use depreciation_core::depreciation::{AssetPayload, DepreciationInput};
use depreciation_core::reporting::{self, ReportOptions};
use depreciation_core::DepreciationEngine;

use crate::input;

/// Asset terms given on the command line instead of a JSON file
#[derive(Args)]
pub struct AssetFlags {
    /// Original cost basis
    #[arg(long)]
    pub cost: Option<Decimal>,

    /// Depreciable basis when it differs from cost
    #[arg(long)]
    pub depreciable_cost: Option<Decimal>,

    /// In-service date (YYYY-MM-DD)
    #[arg(long)]
    pub in_service: Option<NaiveDate>,

    /// Useful life in months
    #[arg(long)]
    pub life_months: Option<u32>,

    /// Salvage value
    #[arg(long)]
    pub salvage: Option<Decimal>,

    /// Salvage as a percentage of cost
    #[arg(long)]
    pub residual_pct: Option<Decimal>,

    /// Depreciation method (e.g. STRAIGHT_LINE, DDB)
    #[arg(long)]
    pub method: Option<String>,
}

impl AssetFlags {
    fn into_payload(self) -> Result<AssetPayload, Box<dyn std::error::Error>> {
        let acquisition_cost = self.cost.ok_or("--cost is required (or provide --input)")?;
        let in_service_date = self
            .in_service
            .ok_or("--in-service is required (or provide --input)")?;
        let useful_life_months = self
            .life_months
            .ok_or("--life-months is required (or provide --input)")?;

        Ok(AssetPayload {
            acquisition_cost,
            depreciable_cost: self.depreciable_cost,
            in_service_date,
            useful_life_months,
            salvage_value: self.salvage,
            residual_percentage: self.residual_pct,
            method: self.method,
        })
    }
}

/// Asset terms from `--input`, stdin or flags, in that order. Every source
/// resolves its method under the engine's policy.
fn load_asset(
    engine: &DepreciationEngine,
    path: Option<&str>,
    flags: AssetFlags,
) -> Result<DepreciationInput, Box<dyn std::error::Error>> {
    let payload: AssetPayload = if path.is_some() {
        input::load(path, "asset terms")?
    } else if let Some(payload) = input::stdin::read_stdin()? {
        payload
    } else {
        flags.into_payload()?
    };
    Ok(engine.input_from_payload(payload)?)
}

// ---------------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------------

/// Arguments for a depreciation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON asset terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub asset: AssetFlags,

    /// Include the monthly schedule
    #[arg(long)]
    pub monthly: bool,

    /// Last month of the monthly schedule (YYYY-MM-DD)
    #[arg(long)]
    pub horizon: Option<NaiveDate>,
}

pub fn run_schedule(
    engine: &DepreciationEngine,
    args: ScheduleArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let asset = load_asset(engine, args.input.as_deref(), args.asset)?;
    let options = ReportOptions {
        horizon: args.horizon,
        include_monthly: args.monthly,
    };
    let result = reporting::depreciation_report(engine, &asset, &options)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// book-value
// ---------------------------------------------------------------------------

/// Arguments for a book value lookup
#[derive(Args)]
pub struct BookValueArgs {
    /// Path to JSON asset terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub asset: AssetFlags,

    /// Date to value the asset on (YYYY-MM-DD)
    #[arg(long, conflicts_with = "year")]
    pub as_of: Option<NaiveDate>,

    /// Calendar year; alone it reports that year's expense and closing value
    #[arg(long)]
    pub year: Option<i32>,

    /// Calendar month (1-12), used with --year
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

pub fn run_book_value(
    engine: &DepreciationEngine,
    args: BookValueArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let asset = load_asset(engine, args.input.as_deref(), args.asset)?;

    match (args.as_of, args.year, args.month) {
        (Some(as_of), _, _) => Ok(json!({
            "as_of": as_of,
            "book_value": engine.book_value_at(&asset, as_of)?,
        })),
        (None, Some(year), Some(month)) => Ok(json!({
            "year": year,
            "month": month,
            "book_value": engine.book_value_for_period(&asset, year, month)?,
        })),
        (None, Some(year), None) => Ok(json!({
            "year": year,
            "depreciation_expense": engine.annual_expense_for_year(&asset, year)?,
            "book_value": engine.book_value_for_period(&asset, year, 12)?,
        })),
        (None, None, _) => Err("--as-of or --year is required".into()),
    }
}
