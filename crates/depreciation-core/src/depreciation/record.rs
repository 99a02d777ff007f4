//! Boundary conversion from loosely typed asset rows.
//!
//! Stored asset rows arrive with numbers as strings, blanks and nulls for
//! missing values, useful life in months or years and salvage either as an
//! amount or a percentage. `AssetRecord` accepts all of that and
//! `AssetRecord::normalize` turns it into a validated `DepreciationInput`
//! exactly once, before any formula runs.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::input::{AssetTerms, CapitalImprovement, DepreciationInput};
use super::method::{resolve_method, MethodPolicy};
use crate::error::DepreciationError;
use crate::DepreciationResult;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// An asset row as stored by the persistence layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub asset_id: Option<String>,
    #[serde(default, alias = "unit_cost", deserialize_with = "lenient_decimal")]
    pub acquisition_cost: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub depreciable_cost: Option<Decimal>,
    #[serde(default, alias = "siv_date", deserialize_with = "lenient_string")]
    pub in_service_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub useful_life_months: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub useful_life_years: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub salvage_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub residual_percentage: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub improvements: Vec<ImprovementRecord>,
}

/// A capital improvement row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImprovementRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub improvement_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cost: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub remaining_useful_life_months: Option<Decimal>,
}

/// A record after boundary conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAsset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub input: DepreciationInput,
    pub improvements: Vec<CapitalImprovement>,
    /// Lossy conversions applied along the way
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

impl AssetRecord {
    pub fn normalize(&self, policy: MethodPolicy) -> DepreciationResult<NormalizedAsset> {
        let mut warnings = Vec::new();

        let acquisition_cost = self.acquisition_cost.ok_or_else(|| {
            DepreciationError::invalid("acquisition_cost", "Acquisition cost is required")
        })?;
        let in_service_date = parse_date(
            "in_service_date",
            self.in_service_date.as_deref().ok_or_else(|| {
                DepreciationError::invalid("in_service_date", "In-service date is required")
            })?,
        )?;
        let useful_life_months = self.useful_life_in_months(&mut warnings)?;

        if self.salvage_value.is_some() && self.residual_percentage.is_some() {
            warnings.push(
                "Both salvage_value and residual_percentage given; salvage_value used".into(),
            );
        }

        let resolution = resolve_method(self.method.as_deref(), policy)?;
        if let Some(w) = resolution.warning {
            warnings.push(w);
        }

        let input = DepreciationInput::try_from(AssetTerms {
            acquisition_cost,
            depreciable_cost: self.depreciable_cost,
            in_service_date,
            useful_life_months,
            salvage_value: self.salvage_value,
            residual_percentage: self.residual_percentage,
            method: resolution.method,
        })?;

        let improvements = self
            .improvements
            .iter()
            .enumerate()
            .map(|(i, record)| record.normalize(i))
            .collect::<DepreciationResult<Vec<_>>>()?;

        for w in &warnings {
            tracing::warn!(asset_id = ?self.asset_id, "{}", w);
        }

        Ok(NormalizedAsset {
            asset_id: self.asset_id.clone(),
            input,
            improvements,
            warnings,
        })
    }

    /// Months take precedence; years are converted at 12 months each.
    fn useful_life_in_months(&self, warnings: &mut Vec<String>) -> DepreciationResult<u32> {
        let (field, months) = match (self.useful_life_months, self.useful_life_years) {
            (Some(months), _) => ("useful_life_months", months),
            (None, Some(years)) => ("useful_life_years", years * Decimal::from(12)),
            (None, None) => {
                return Err(DepreciationError::invalid(
                    "useful_life_months",
                    "Useful life is required (months or years)",
                ))
            }
        };
        whole_months(field, months, warnings)
    }
}

impl ImprovementRecord {
    fn normalize(&self, index: usize) -> DepreciationResult<CapitalImprovement> {
        let field = format!("improvements[{index}]");
        let improvement_date = parse_date(
            &field,
            self.improvement_date.as_deref().ok_or_else(|| {
                DepreciationError::invalid(&field, "Improvement date is required")
            })?,
        )?;
        let cost = self
            .cost
            .ok_or_else(|| DepreciationError::invalid(&field, "Improvement cost is required"))?;
        let mut ignored = Vec::new();
        let remaining_useful_life_months = self
            .remaining_useful_life_months
            .map(|months| whole_months(&field, months, &mut ignored))
            .transpose()?;

        Ok(CapitalImprovement {
            improvement_date,
            cost,
            remaining_useful_life_months,
        })
    }
}

fn whole_months(field: &str, months: Decimal, warnings: &mut Vec<String>) -> DepreciationResult<u32> {
    if months <= Decimal::ZERO {
        return Err(DepreciationError::invalid(field, "Useful life must be greater than zero"));
    }
    let rounded = months.round();
    if rounded != months {
        warnings.push(format!("{field} of {months} months rounded to {rounded}"));
    }
    rounded
        .to_u32()
        .filter(|m| *m > 0)
        .ok_or_else(|| DepreciationError::invalid(field, format!("{months} is not a usable number of months")))
}

/// Parse ISO, slash-separated or US-style dates; a trailing time component
/// (`2021-03-01T00:00:00Z`) is ignored.
pub fn parse_date(field: &str, raw: &str) -> DepreciationResult<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| DepreciationError::invalid(field, format!("'{raw}' is not a recognised date")))
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid number {n}"))),
        Some(Value::String(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            parse_decimal(&cleaned)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("'{s}' is not a number")))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depreciation::method::DepreciationMethod;
    use rust_decimal_macros::dec;

    fn record(json: &str) -> AssetRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_string_numbers_and_unit_cost_alias() {
        let rec = record(
            r#"{
                "asset_id": "LAP-0042",
                "unit_cost": "1,250.00",
                "in_service_date": "2022-04-18",
                "useful_life_years": "3",
                "residual_percentage": 10,
                "method": "straight-line"
            }"#,
        );
        let asset = rec.normalize(MethodPolicy::Reject).unwrap();
        assert_eq!(asset.asset_id.as_deref(), Some("LAP-0042"));
        assert_eq!(asset.input.acquisition_cost(), dec!(1250.00));
        assert_eq!(asset.input.useful_life_months(), 36);
        assert_eq!(asset.input.salvage_value(), dec!(125));
        assert_eq!(asset.input.method(), DepreciationMethod::StraightLine);
        assert!(asset.warnings.is_empty());
    }

    #[test]
    fn test_blank_and_null_fields_are_missing() {
        let rec = record(
            r#"{
                "acquisition_cost": 5000,
                "depreciable_cost": "",
                "in_service_date": "2021-03-01T00:00:00Z",
                "useful_life_months": 60,
                "salvage_value": null,
                "method": "DDB",
                "improvements": null
            }"#,
        );
        let asset = rec.normalize(MethodPolicy::Reject).unwrap();
        assert_eq!(asset.input.depreciable_cost(), dec!(5000));
        assert_eq!(asset.input.salvage_value(), Decimal::ZERO);
        assert_eq!(
            asset.input.in_service_date(),
            NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()
        );
        assert!(asset.improvements.is_empty());
    }

    #[test]
    fn test_missing_method_rejected_by_default() {
        let rec = record(
            r#"{"acquisition_cost": 100, "in_service_date": "2021-01-01", "useful_life_months": 12}"#,
        );
        let err = rec.normalize(MethodPolicy::Reject).unwrap_err();
        assert!(matches!(err, DepreciationError::UnsupportedMethod(_)));
    }

    #[test]
    fn test_missing_method_defaulted_with_warning() {
        let rec = record(
            r#"{"acquisition_cost": 100, "in_service_date": "2021-01-01", "useful_life_months": 12}"#,
        );
        let asset = rec.normalize(MethodPolicy::DefaultToStraightLine).unwrap();
        assert_eq!(asset.input.method(), DepreciationMethod::StraightLine);
        assert_eq!(asset.warnings.len(), 1);
    }

    #[test]
    fn test_fractional_years_rounded_with_warning() {
        let rec = record(
            r#"{"acquisition_cost": 100, "in_service_date": "2021-01-01",
                "useful_life_years": 2.51, "method": "SL"}"#,
        );
        let asset = rec.normalize(MethodPolicy::Reject).unwrap();
        assert_eq!(asset.input.useful_life_months(), 30);
        assert!(asset.warnings[0].contains("rounded"));
    }

    #[test]
    fn test_negative_life_rejected() {
        let rec = record(
            r#"{"acquisition_cost": 100, "in_service_date": "2021-01-01",
                "useful_life_months": "-12", "method": "SL"}"#,
        );
        match rec.normalize(MethodPolicy::Reject).unwrap_err() {
            DepreciationError::InvalidInput { field, .. } => assert_eq!(field, "useful_life_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_improvements_converted() {
        let rec = record(
            r#"{"acquisition_cost": 100000, "in_service_date": "01/15/2020",
                "useful_life_months": 240, "method": "STRAIGHT_LINE",
                "improvements": [
                    {"improvement_date": "2023/06/01", "cost": "25000", "remaining_useful_life_months": 120}
                ]}"#,
        );
        let asset = rec.normalize(MethodPolicy::Reject).unwrap();
        assert_eq!(asset.improvements.len(), 1);
        assert_eq!(asset.improvements[0].cost, dec!(25000));
        assert_eq!(asset.improvements[0].remaining_useful_life_months, Some(120));
        assert_eq!(
            asset.improvements[0].improvement_date,
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_date_and_bad_number() {
        assert!(parse_date("in_service_date", "next tuesday").is_err());
        assert!(serde_json::from_str::<AssetRecord>(r#"{"acquisition_cost": "abc"}"#).is_err());
        assert!(serde_json::from_str::<AssetRecord>(r#"{"acquisition_cost": true}"#).is_err());
    }
}
