use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use serde_json::json;

use depreciation_core::depreciation::{
    AssetPayload, AssetRecord, CapitalImprovement, DepreciationInput, ScheduleEntry,
};
use depreciation_core::reporting::{self, ReportOptions};
use depreciation_core::{DepreciationEngine, EngineConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Engine from an optional JSON config; defaults when absent or empty.
fn engine_from(config_json: Option<String>) -> NapiResult<DepreciationEngine> {
    let config = match config_json.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_str::<EngineConfig>(raw).map_err(to_napi_error)?
        }
        _ => EngineConfig::default(),
    };
    DepreciationEngine::new(config).map_err(to_napi_error)
}

/// Asset terms JSON, with the method resolved under the engine's policy.
fn asset_from(engine: &DepreciationEngine, input_json: &str) -> NapiResult<DepreciationInput> {
    let payload: AssetPayload = serde_json::from_str(input_json).map_err(to_napi_error)?;
    engine.input_from_payload(payload).map_err(to_napi_error)
}

fn parse_date(raw: &str) -> NapiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleRequest {
    asset: AssetPayload,
    #[serde(default)]
    options: ReportOptions,
}

#[napi]
pub fn depreciation_schedule(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let request: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let asset = engine
        .input_from_payload(request.asset)
        .map_err(to_napi_error)?;
    let output = reporting::depreciation_report(&engine, &asset, &request.options)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn book_value_at(
    input_json: String,
    as_of: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let asset = asset_from(&engine, &input_json)?;
    let date = parse_date(&as_of)?;
    let value = engine.book_value_at(&asset, date).map_err(to_napi_error)?;
    serde_json::to_string(&json!({ "as_of": date, "book_value": value })).map_err(to_napi_error)
}

#[napi]
pub fn annual_expense_for_year(
    input_json: String,
    year: i32,
    config_json: Option<String>,
) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let asset = asset_from(&engine, &input_json)?;
    let expense = engine
        .annual_expense_for_year(&asset, year)
        .map_err(to_napi_error)?;
    serde_json::to_string(&json!({ "year": year, "depreciation_expense": expense }))
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Capital improvements
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ImprovementRequest {
    asset: AssetPayload,
    improvement: CapitalImprovement,
    #[serde(default)]
    new_remaining_useful_life_months: Option<u32>,
    #[serde(default)]
    prior_schedule: Option<Vec<ScheduleEntry>>,
}

#[napi]
pub fn apply_improvement(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let request: ImprovementRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;

    let asset = engine
        .input_from_payload(request.asset)
        .map_err(to_napi_error)?;
    let outcome = engine
        .improve_and_splice(
            &asset,
            request.prior_schedule.as_deref(),
            &request.improvement,
            request.new_remaining_useful_life_months,
        )
        .map_err(to_napi_error)?;

    serde_json::to_string(&json!({
        "rebasing": outcome.rebasing,
        "annual_schedule": outcome.annual,
        "monthly_schedule": outcome.monthly,
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn asset_history(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let record: AssetRecord = serde_json::from_str(&record_json).map_err(to_napi_error)?;
    let asset = record
        .normalize(engine.config().method_policy)
        .map_err(to_napi_error)?;
    let history = engine
        .asset_history(&asset.input, &asset.improvements)
        .map_err(to_napi_error)?;
    serde_json::to_string(&json!({
        "asset_id": asset.asset_id,
        "warnings": asset.warnings,
        "history": history,
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[napi]
pub fn batch_depreciation(records_json: String, config_json: Option<String>) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let records: Vec<AssetRecord> = serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let output = reporting::batch_report(&engine, &records);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn portfolio_book_value_at(
    records_json: String,
    as_of: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let engine = engine_from(config_json)?;
    let records: Vec<AssetRecord> = serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let date = parse_date(&as_of)?;
    let (requests, failures, warnings) = reporting::batch::requests_from_records(&engine, &records);
    let items = reporting::compute_batch(&engine, &requests);
    let total = reporting::portfolio_book_value_at(&engine, &items, date).map_err(to_napi_error)?;
    serde_json::to_string(&json!({
        "as_of": date,
        "portfolio_book_value": total,
        "skipped": failures.iter().map(|f| &f.asset_id).collect::<Vec<_>>(),
        "warnings": warnings,
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_method(method: String) -> NapiResult<String> {
    let method = depreciation_core::depreciation::validate_method(&method).map_err(to_napi_error)?;
    Ok(method.as_str().to_string())
}
