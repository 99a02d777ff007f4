//! Depreciation method enum and the guard that turns method strings coming
//! from stored asset records into it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DepreciationError;
use crate::DepreciationResult;

/// Supported accounting methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum DepreciationMethod {
    StraightLine,
    DecliningBalance,
    DoubleDecliningBalance,
    SumOfYearsDigits,
}

impl DepreciationMethod {
    pub const ALL: [DepreciationMethod; 4] = [
        DepreciationMethod::StraightLine,
        DepreciationMethod::DecliningBalance,
        DepreciationMethod::DoubleDecliningBalance,
        DepreciationMethod::SumOfYearsDigits,
    ];

    /// Canonical upper-snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DepreciationMethod::StraightLine => "STRAIGHT_LINE",
            DepreciationMethod::DecliningBalance => "DECLINING_BALANCE",
            DepreciationMethod::DoubleDecliningBalance => "DOUBLE_DECLINING_BALANCE",
            DepreciationMethod::SumOfYearsDigits => "SUM_OF_YEARS_DIGITS",
        }
    }

    pub fn is_declining(&self) -> bool {
        matches!(
            self,
            DepreciationMethod::DecliningBalance | DepreciationMethod::DoubleDecliningBalance
        )
    }
}

impl fmt::Display for DepreciationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepreciationMethod {
    type Err = DepreciationError;

    /// Case-insensitive; spaces and hyphens are treated as underscores and
    /// the usual abbreviations (SL, DB, DDB, SYD, SOYD) are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "STRAIGHT_LINE" | "SL" => Ok(DepreciationMethod::StraightLine),
            "DECLINING_BALANCE" | "DB" => Ok(DepreciationMethod::DecliningBalance),
            "DOUBLE_DECLINING_BALANCE" | "DDB" => Ok(DepreciationMethod::DoubleDecliningBalance),
            "SUM_OF_YEARS_DIGITS" | "SUM_OF_THE_YEARS_DIGITS" | "SYD" | "SOYD" => {
                Ok(DepreciationMethod::SumOfYearsDigits)
            }
            _ => Err(DepreciationError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for DepreciationMethod {
    type Error = DepreciationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Policy for method strings that do not name a supported method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodPolicy {
    /// Fail with `UnsupportedMethod`.
    #[default]
    Reject,
    /// Fall back to straight-line and report a warning.
    DefaultToStraightLine,
}

/// Outcome of resolving a method string under a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResolution {
    pub method: DepreciationMethod,
    pub defaulted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Strict guard: any string that is not one of the four methods is
/// rejected.
pub fn validate_method(method: &str) -> DepreciationResult<DepreciationMethod> {
    method.parse()
}

/// Resolve an optional method string under `policy`. A missing or blank
/// method counts as unrecognised.
pub fn resolve_method(
    method: Option<&str>,
    policy: MethodPolicy,
) -> DepreciationResult<MethodResolution> {
    let raw = method.map(str::trim).unwrap_or_default();
    match validate_method(raw) {
        Ok(method) => Ok(MethodResolution {
            method,
            defaulted: false,
            warning: None,
        }),
        Err(err) => match policy {
            MethodPolicy::Reject => Err(err),
            MethodPolicy::DefaultToStraightLine => {
                let warning = if raw.is_empty() {
                    "No depreciation method given; defaulted to STRAIGHT_LINE".to_string()
                } else {
                    format!("Unsupported depreciation method '{raw}'; defaulted to STRAIGHT_LINE")
                };
                tracing::warn!(method = %raw, "{}", warning);
                Ok(MethodResolution {
                    method: DepreciationMethod::StraightLine,
                    defaulted: true,
                    warning: Some(warning),
                })
            }
        },
    }
}
