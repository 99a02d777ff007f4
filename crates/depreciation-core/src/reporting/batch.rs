//! Batch calls across many assets.
//!
//! Every asset is an independent calculation. A failure is recorded against
//! its asset and never aborts the rest of the batch. With the `parallel`
//! feature the assets fan out over rayon's global pool.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::depreciation::engine::DepreciationEngine;
use crate::depreciation::improvement::AssetHistory;
use crate::depreciation::input::{CapitalImprovement, DepreciationInput};
use crate::depreciation::record::AssetRecord;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::DepreciationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRequest {
    pub asset_id: String,
    pub input: DepreciationInput,
    #[serde(default)]
    pub improvements: Vec<CapitalImprovement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Computed { history: AssetHistory },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub asset_id: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchItem {
    pub fn history(&self) -> Option<&AssetHistory> {
        match &self.outcome {
            BatchOutcome::Computed { history } => Some(history),
            BatchOutcome::Failed { .. } => None,
        }
    }
}

/// Depreciation recognised across all assets in one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub depreciation_expense: Money,
    pub asset_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub computed: u32,
    pub failed: u32,
    pub annual_totals: Vec<YearTotal>,
    pub assets: Vec<BatchItem>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the full (improvement-spliced) history of every request.
pub fn compute_batch(engine: &DepreciationEngine, requests: &[AssetRequest]) -> Vec<BatchItem> {
    #[cfg(feature = "parallel")]
    let iter = requests.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = requests.iter();

    iter.map(|request| compute_one(engine, request)).collect()
}

fn compute_one(engine: &DepreciationEngine, request: &AssetRequest) -> BatchItem {
    let outcome = match engine.asset_history(&request.input, &request.improvements) {
        Ok(history) => BatchOutcome::Computed { history },
        Err(e) => {
            tracing::warn!(asset_id = %request.asset_id, error = %e, "asset calculation failed");
            BatchOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    BatchItem {
        asset_id: request.asset_id.clone(),
        outcome,
    }
}

/// Convert stored rows into requests. Rows that fail boundary validation
/// come back as failed items; rows without an id are named by position.
pub fn requests_from_records(
    engine: &DepreciationEngine,
    records: &[AssetRecord],
) -> (Vec<AssetRequest>, Vec<BatchItem>, Vec<String>) {
    let mut requests = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let asset_id = record
            .asset_id
            .clone()
            .unwrap_or_else(|| format!("row-{}", i + 1));
        match record.normalize(engine.config().method_policy) {
            Ok(asset) => {
                warnings.extend(asset.warnings.iter().map(|w| format!("{asset_id}: {w}")));
                requests.push(AssetRequest {
                    asset_id,
                    input: asset.input,
                    improvements: asset.improvements,
                });
            }
            Err(e) => failures.push(BatchItem {
                asset_id,
                outcome: BatchOutcome::Failed {
                    error: e.to_string(),
                },
            }),
        }
    }

    (requests, failures, warnings)
}

/// Sum annual expense by calendar year over every computed asset.
pub fn annual_totals(items: &[BatchItem]) -> Vec<YearTotal> {
    let mut by_year: BTreeMap<i32, YearTotal> = BTreeMap::new();
    for history in items.iter().filter_map(BatchItem::history) {
        for entry in &history.annual {
            let total = by_year.entry(entry.year).or_insert(YearTotal {
                year: entry.year,
                depreciation_expense: Decimal::ZERO,
                asset_count: 0,
            });
            total.depreciation_expense += entry.depreciation_expense;
            total.asset_count += 1;
        }
    }
    by_year.into_values().collect()
}

/// Combined book value of every computed asset at `as_of`.
pub fn portfolio_book_value_at(
    engine: &DepreciationEngine,
    items: &[BatchItem],
    as_of: NaiveDate,
) -> DepreciationResult<Money> {
    let mut total = Decimal::ZERO;
    for history in items.iter().filter_map(BatchItem::history) {
        total += engine.history_book_value_at(history, as_of)?;
    }
    Ok(total)
}

/// Normalise, compute and aggregate a set of stored rows.
pub fn batch_report(
    engine: &DepreciationEngine,
    records: &[AssetRecord],
) -> ComputationOutput<BatchReport> {
    let start = Instant::now();

    let (requests, mut failures, mut warnings) = requests_from_records(engine, records);
    let mut assets = compute_batch(engine, &requests);
    assets.append(&mut failures);

    let failed = assets
        .iter()
        .filter(|item| matches!(item.outcome, BatchOutcome::Failed { .. }))
        .count() as u32;
    if failed > 0 {
        warnings.push(format!("{failed} of {} assets could not be computed", assets.len()));
    }

    let report = BatchReport {
        computed: assets.len() as u32 - failed,
        failed,
        annual_totals: annual_totals(&assets),
        assets,
    };

    let assumptions = json!({
        "convention": "full_month",
        "decimal_places": engine.config().decimal_places,
        "method_policy": engine.config().method_policy,
        "salvage_policy": engine.config().salvage_policy,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Per-asset depreciation histories with capital improvements spliced in, totalled by calendar year",
        &assumptions,
        warnings,
        elapsed,
        report,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depreciation::input::AssetTerms;
    use crate::depreciation::method::DepreciationMethod;
    use rust_decimal_macros::dec;

    fn request(id: &str, cost: Money, months: u32) -> AssetRequest {
        AssetRequest {
            asset_id: id.to_string(),
            input: DepreciationInput::try_from(AssetTerms {
                acquisition_cost: cost,
                depreciable_cost: None,
                in_service_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                useful_life_months: months,
                salvage_value: None,
                residual_percentage: None,
                method: DepreciationMethod::StraightLine,
            })
            .unwrap(),
            improvements: Vec::new(),
        }
    }

    #[test]
    fn test_batch_keeps_request_order() {
        let engine = DepreciationEngine::default();
        let items = compute_batch(
            &engine,
            &[request("a", dec!(1200), 12), request("b", dec!(2400), 24)],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].asset_id, "a");
        assert_eq!(items[1].asset_id, "b");
        assert!(items.iter().all(|i| i.history().is_some()));
    }

    #[test]
    fn test_failed_asset_does_not_abort_batch() {
        let engine = DepreciationEngine::default();
        let mut bad = request("bad", dec!(1200), 12);
        bad.improvements.push(CapitalImprovement {
            improvement_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            cost: dec!(100),
            remaining_useful_life_months: Some(12),
        });
        let items = compute_batch(&engine, &[bad, request("ok", dec!(1200), 12)]);
        assert!(matches!(items[0].outcome, BatchOutcome::Failed { .. }));
        assert!(items[1].history().is_some());
    }

    #[test]
    fn test_annual_totals_by_year() {
        let engine = DepreciationEngine::default();
        let items = compute_batch(
            &engine,
            &[request("a", dec!(1200), 12), request("b", dec!(2400), 24)],
        );
        let totals = annual_totals(&items);
        assert_eq!(
            totals,
            vec![
                YearTotal {
                    year: 2020,
                    depreciation_expense: dec!(2400),
                    asset_count: 2
                },
                YearTotal {
                    year: 2021,
                    depreciation_expense: dec!(1200),
                    asset_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_portfolio_book_value() {
        let engine = DepreciationEngine::default();
        let items = compute_batch(
            &engine,
            &[request("a", dec!(1200), 12), request("b", dec!(2400), 24)],
        );
        let as_of = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap();
        // a: 1200 - 6*100 = 600; b: 2400 - 6*100 = 1800
        assert_eq!(portfolio_book_value_at(&engine, &items, as_of).unwrap(), dec!(2400));
    }

    #[test]
    fn test_batch_report_from_records() {
        let engine = DepreciationEngine::default();
        let records: Vec<AssetRecord> = serde_json::from_str(
            r#"[
                {"asset_id": "PR-1", "acquisition_cost": "1200", "in_service_date": "2020-01-01",
                 "useful_life_months": 12, "method": "STRAIGHT_LINE"},
                {"acquisition_cost": "900", "in_service_date": "2020-01-01",
                 "useful_life_months": 12, "method": "UNITS_OF_PRODUCTION"}
            ]"#,
        )
        .unwrap();
        let out = batch_report(&engine, &records);
        assert_eq!(out.result.computed, 1);
        assert_eq!(out.result.failed, 1);
        assert_eq!(out.result.assets[1].asset_id, "row-2");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.annual_totals[0].depreciation_expense, dec!(1200));
    }
}
