//! Validated input record for every engine call.
//!
//! `AssetTerms` is the plain serde shape callers fill in; `DepreciationInput`
//! can only be obtained from it through `TryFrom`, so the formulas never see
//! an unvalidated record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::method::DepreciationMethod;
use crate::calendar;
use crate::error::DepreciationError;
use crate::types::{Money, Rate};
use crate::DepreciationResult;

/// Longest useful life accepted (100 years).
pub const MAX_USEFUL_LIFE_MONTHS: u32 = 1200;

/// Largest monetary amount accepted (1e20). Recurrences multiply amounts by
/// month and year counts, which must stay inside `Decimal`'s range.
pub const MAX_MONEY: Money = Decimal::from_parts(1_661_992_960, 1_808_227_885, 5, false, 0);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Unvalidated asset terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTerms {
    /// Original cost basis
    pub acquisition_cost: Money,
    /// Basis actually being depreciated (defaults to acquisition cost)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciable_cost: Option<Money>,
    /// First day of accrual
    pub in_service_date: NaiveDate,
    /// Total depreciable life in months
    pub useful_life_months: u32,
    /// Salvage floor; takes precedence over `residual_percentage`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<Money>,
    /// Salvage as a percentage (out of 100) of cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_percentage: Option<Rate>,
    pub method: DepreciationMethod,
}

/// Asset terms as received over JSON, with the method still a raw string.
/// The engine resolves the method under its configured policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPayload {
    pub acquisition_cost: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciable_cost: Option<Money>,
    pub in_service_date: NaiveDate,
    pub useful_life_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_percentage: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl AssetPayload {
    /// Terms with `method` in place of the raw method string.
    pub fn into_terms(self, method: DepreciationMethod) -> AssetTerms {
        AssetTerms {
            acquisition_cost: self.acquisition_cost,
            depreciable_cost: self.depreciable_cost,
            in_service_date: self.in_service_date,
            useful_life_months: self.useful_life_months,
            salvage_value: self.salvage_value,
            residual_percentage: self.residual_percentage,
            method,
        }
    }
}

/// Validated, immutable depreciation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssetTerms", into = "AssetTerms")]
pub struct DepreciationInput {
    acquisition_cost: Money,
    depreciable_cost: Money,
    in_service_date: NaiveDate,
    useful_life_months: u32,
    salvage_value: Money,
    residual_percentage: Option<Rate>,
    method: DepreciationMethod,
}

/// A post-acquisition expenditure added to the depreciable basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalImprovement {
    pub improvement_date: NaiveDate,
    pub cost: Money,
    /// Remaining life of the re-based asset; when absent the remaining
    /// months of the current basis are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_useful_life_months: Option<u32>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl TryFrom<AssetTerms> for DepreciationInput {
    type Error = DepreciationError;

    fn try_from(terms: AssetTerms) -> Result<Self, Self::Error> {
        if terms.acquisition_cost <= Decimal::ZERO {
            return Err(DepreciationError::invalid(
                "acquisition_cost",
                "Acquisition cost must be positive",
            ));
        }
        if terms.acquisition_cost > MAX_MONEY {
            return Err(DepreciationError::invalid(
                "acquisition_cost",
                format!("Acquisition cost must not exceed {MAX_MONEY}"),
            ));
        }
        let depreciable_cost = terms.depreciable_cost.unwrap_or(terms.acquisition_cost);
        if depreciable_cost <= Decimal::ZERO {
            return Err(DepreciationError::invalid(
                "depreciable_cost",
                "Depreciable cost must be positive",
            ));
        }
        if depreciable_cost > MAX_MONEY {
            return Err(DepreciationError::invalid(
                "depreciable_cost",
                format!("Depreciable cost must not exceed {MAX_MONEY}"),
            ));
        }
        if terms.useful_life_months == 0 {
            return Err(DepreciationError::invalid(
                "useful_life_months",
                "Useful life must be greater than zero",
            ));
        }
        if terms.useful_life_months > MAX_USEFUL_LIFE_MONTHS {
            return Err(DepreciationError::invalid(
                "useful_life_months",
                format!("Useful life must not exceed {MAX_USEFUL_LIFE_MONTHS} months"),
            ));
        }
        // The final accrual month must be representable.
        calendar::add_months(terms.in_service_date, terms.useful_life_months)?;

        if let Some(pct) = terms.residual_percentage {
            if pct < Decimal::ZERO || pct >= dec!(100) {
                return Err(DepreciationError::invalid(
                    "residual_percentage",
                    "Residual percentage must be in [0, 100)",
                ));
            }
        }
        let salvage_value = match (terms.salvage_value, terms.residual_percentage) {
            (Some(salvage), _) => salvage,
            (None, Some(pct)) => terms.acquisition_cost * pct / dec!(100),
            (None, None) => Decimal::ZERO,
        };
        if salvage_value < Decimal::ZERO {
            return Err(DepreciationError::invalid(
                "salvage_value",
                "Salvage value cannot be negative",
            ));
        }
        if salvage_value >= depreciable_cost {
            return Err(DepreciationError::invalid(
                "salvage_value",
                format!(
                    "Salvage value {salvage_value} must be below depreciable cost {depreciable_cost}"
                ),
            ));
        }

        Ok(DepreciationInput {
            acquisition_cost: terms.acquisition_cost,
            depreciable_cost,
            in_service_date: terms.in_service_date,
            useful_life_months: terms.useful_life_months,
            salvage_value,
            residual_percentage: terms.residual_percentage,
            method: terms.method,
        })
    }
}

impl From<DepreciationInput> for AssetTerms {
    fn from(input: DepreciationInput) -> Self {
        AssetTerms {
            acquisition_cost: input.acquisition_cost,
            depreciable_cost: Some(input.depreciable_cost),
            in_service_date: input.in_service_date,
            useful_life_months: input.useful_life_months,
            salvage_value: Some(input.salvage_value),
            residual_percentage: input.residual_percentage,
            method: input.method,
        }
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl DepreciationInput {
    pub fn acquisition_cost(&self) -> Money {
        self.acquisition_cost
    }

    pub fn depreciable_cost(&self) -> Money {
        self.depreciable_cost
    }

    pub fn in_service_date(&self) -> NaiveDate {
        self.in_service_date
    }

    pub fn useful_life_months(&self) -> u32 {
        self.useful_life_months
    }

    /// Useful life in whole years, rounded up.
    pub fn useful_life_years(&self) -> u32 {
        self.useful_life_months.div_ceil(12)
    }

    pub fn salvage_value(&self) -> Money {
        self.salvage_value
    }

    pub fn residual_percentage(&self) -> Option<Rate> {
        self.residual_percentage
    }

    pub fn method(&self) -> DepreciationMethod {
        self.method
    }

    /// Depreciable cost less salvage: the total to be expensed over the life.
    pub fn depreciable_amount(&self) -> Money {
        self.depreciable_cost - self.salvage_value
    }

    /// First day of the month in which accrual starts.
    pub fn first_accrual_month(&self) -> NaiveDate {
        calendar::month_start(self.in_service_date)
    }

    /// First day after the final depreciation month.
    pub fn life_end_date(&self) -> DepreciationResult<NaiveDate> {
        calendar::add_months(self.in_service_date, self.useful_life_months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_terms() -> AssetTerms {
        AssetTerms {
            acquisition_cost: dec!(12000),
            depreciable_cost: None,
            in_service_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            useful_life_months: 120,
            salvage_value: None,
            residual_percentage: None,
            method: DepreciationMethod::StraightLine,
        }
    }

    fn expect_invalid(terms: AssetTerms, expected_field: &str) {
        match DepreciationInput::try_from(terms).unwrap_err() {
            DepreciationError::InvalidInput { field, .. } => assert_eq!(field, expected_field),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_depreciable_cost_and_salvage() {
        let input = DepreciationInput::try_from(base_terms()).unwrap();
        assert_eq!(input.depreciable_cost(), dec!(12000));
        assert_eq!(input.salvage_value(), Decimal::ZERO);
        assert_eq!(input.useful_life_years(), 10);
        assert_eq!(input.depreciable_amount(), dec!(12000));
    }

    #[test]
    fn test_salvage_from_residual_percentage() {
        let mut terms = base_terms();
        terms.residual_percentage = Some(dec!(10));
        let input = DepreciationInput::try_from(terms).unwrap();
        assert_eq!(input.salvage_value(), dec!(1200));
    }

    #[test]
    fn test_explicit_salvage_wins_over_percentage() {
        let mut terms = base_terms();
        terms.salvage_value = Some(dec!(500));
        terms.residual_percentage = Some(dec!(10));
        let input = DepreciationInput::try_from(terms).unwrap();
        assert_eq!(input.salvage_value(), dec!(500));
        assert_eq!(input.residual_percentage(), Some(dec!(10)));
    }

    #[test]
    fn test_rejects_non_positive_cost() {
        let mut terms = base_terms();
        terms.acquisition_cost = Decimal::ZERO;
        expect_invalid(terms, "acquisition_cost");
    }

    #[test]
    fn test_rejects_zero_life() {
        let mut terms = base_terms();
        terms.useful_life_months = 0;
        expect_invalid(terms, "useful_life_months");
    }

    #[test]
    fn test_rejects_absurd_life() {
        let mut terms = base_terms();
        terms.useful_life_months = MAX_USEFUL_LIFE_MONTHS + 1;
        expect_invalid(terms, "useful_life_months");
    }

    #[test]
    fn test_max_money_is_1e20() {
        assert_eq!(MAX_MONEY, Decimal::from_i128_with_scale(10i128.pow(20), 0));
    }

    #[test]
    fn test_rejects_amounts_beyond_max_money() {
        let mut terms = base_terms();
        terms.acquisition_cost = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        expect_invalid(terms, "acquisition_cost");

        let mut terms = base_terms();
        terms.depreciable_cost = Some(MAX_MONEY + Decimal::ONE);
        expect_invalid(terms, "depreciable_cost");

        let mut terms = base_terms();
        terms.acquisition_cost = MAX_MONEY;
        assert!(DepreciationInput::try_from(terms).is_ok());
    }

    #[test]
    fn test_rejects_negative_salvage() {
        let mut terms = base_terms();
        terms.salvage_value = Some(dec!(-1));
        expect_invalid(terms, "salvage_value");
    }

    #[test]
    fn test_rejects_salvage_at_cost() {
        let mut terms = base_terms();
        terms.salvage_value = Some(dec!(12000));
        expect_invalid(terms, "salvage_value");
    }

    #[test]
    fn test_rejects_full_residual_percentage() {
        let mut terms = base_terms();
        terms.residual_percentage = Some(dec!(100));
        expect_invalid(terms, "residual_percentage");
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "acquisition_cost": "5000",
            "in_service_date": "2021-03-15",
            "useful_life_months": 0,
            "method": "STRAIGHT_LINE"
        }"#;
        assert!(serde_json::from_str::<DepreciationInput>(json).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut terms = base_terms();
        terms.residual_percentage = Some(dec!(5));
        let input = DepreciationInput::try_from(terms).unwrap();
        let json = serde_json::to_string(&input).unwrap();
        let back: DepreciationInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_life_end_date() {
        let mut terms = base_terms();
        terms.in_service_date = NaiveDate::from_ymd_opt(2020, 7, 20).unwrap();
        terms.useful_life_months = 60;
        let input = DepreciationInput::try_from(terms).unwrap();
        assert_eq!(
            input.life_end_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
    }
}
