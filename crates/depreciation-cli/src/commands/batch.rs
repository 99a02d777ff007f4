use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use depreciation_core::depreciation::AssetRecord;
use depreciation_core::reporting;
use depreciation_core::DepreciationEngine;

use crate::input;

/// Arguments for a batch run over an asset register
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a JSON array of asset records
    #[arg(long)]
    pub input: Option<String>,

    /// Also report the combined book value on this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Leave per-asset schedules out of the output
    #[arg(long)]
    pub totals_only: bool,
}

pub fn run_batch(
    engine: &DepreciationEngine,
    args: BatchArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<AssetRecord> = input::load(args.input.as_deref(), "batch depreciation")?;
    tracing::info!(assets = records.len(), "running batch");

    let output = reporting::batch_report(engine, &records);
    let portfolio_book_value = match args.as_of {
        Some(as_of) => Some(reporting::portfolio_book_value_at(
            engine,
            &output.result.assets,
            as_of,
        )?),
        None => None,
    };

    let mut value = serde_json::to_value(&output)?;
    if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
        if let (Some(as_of), Some(total)) = (args.as_of, portfolio_book_value) {
            result.insert("as_of".into(), serde_json::to_value(as_of)?);
            result.insert("portfolio_book_value".into(), serde_json::to_value(total)?);
        }
        if args.totals_only {
            result.remove("assets");
        }
    }
    Ok(value)
}
