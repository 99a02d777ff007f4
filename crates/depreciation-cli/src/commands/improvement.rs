use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use depreciation_core::depreciation::{AssetPayload, AssetRecord, CapitalImprovement, ScheduleEntry};
use depreciation_core::DepreciationEngine;

use crate::input;

/// Payload for a single improvement.
#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub asset: AssetPayload,
    pub improvement: CapitalImprovement,
    /// Remaining life after the improvement; defaults to the months left
    /// on the current basis
    #[serde(default)]
    pub new_remaining_useful_life_months: Option<u32>,
    /// Monthly schedule already held for the asset; recomputed when absent
    #[serde(default)]
    pub prior_schedule: Option<Vec<ScheduleEntry>>,
}

/// Arguments for applying a capital improvement
#[derive(Args)]
pub struct ImproveArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_improve(
    engine: &DepreciationEngine,
    args: ImproveArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ImproveRequest = input::load(args.input.as_deref(), "capital improvement")?;

    let asset = engine.input_from_payload(request.asset)?;
    let outcome = engine.improve_and_splice(
        &asset,
        request.prior_schedule.as_deref(),
        &request.improvement,
        request.new_remaining_useful_life_months,
    )?;
    let rebasing = outcome.rebasing;

    Ok(json!({
        "book_value_at_improvement": rebasing.book_value_at_improvement,
        "rebased_input": rebasing.rebased_input,
        "retained_periods": rebasing.retained_history.len(),
        "annual_schedule": outcome.annual,
        "monthly_schedule": outcome.monthly,
    }))
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

/// Arguments for an asset history
#[derive(Args)]
pub struct HistoryArgs {
    /// Path to a JSON asset record with its improvements
    #[arg(long)]
    pub input: Option<String>,

    /// Also report the book value on this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_history(
    engine: &DepreciationEngine,
    args: HistoryArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record: AssetRecord = input::load(args.input.as_deref(), "asset history")?;
    let asset = record.normalize(engine.config().method_policy)?;
    for warning in &asset.warnings {
        tracing::warn!(asset_id = ?asset.asset_id, "{warning}");
    }

    let history = engine.asset_history(&asset.input, &asset.improvements)?;
    let book_value = match args.as_of {
        Some(as_of) => Some(engine.history_book_value_at(&history, as_of)?),
        None => None,
    };

    Ok(json!({
        "asset_id": asset.asset_id,
        "book_value": book_value,
        "as_of": args.as_of,
        "warnings": asset.warnings,
        "segments": history.segments,
        "annual_schedule": history.annual,
        "monthly_schedule": history.monthly,
    }))
}
