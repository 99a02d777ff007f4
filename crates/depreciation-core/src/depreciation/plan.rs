//! Per-method depreciation-year recurrences.
//!
//! A depreciation year is a 12-month window starting at the in-service
//! month; the last window holds whatever months of the life remain. The plan
//! stores each window's expense at full precision. Nothing here is rounded:
//! rounding happens only when schedule entries are emitted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::DepreciationInput;
use super::method::DepreciationMethod;
use crate::types::{Money, Rate};

/// Unrounded expense per depreciation year for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationPlan {
    pub method: DepreciationMethod,
    /// Depreciable cost less salvage
    pub depreciable_amount: Money,
    pub useful_life_months: u32,
    /// Number of depreciation years, `ceil(useful_life_months / 12)`
    pub useful_life_years: u32,
    /// Months in the final depreciation year (1..=12)
    pub final_year_months: u32,
    /// Expense of each depreciation year, index 0 = first year
    pub annual_expenses: Vec<Money>,
    /// `cumulative[k]` = expense of years `0..k`
    cumulative: Vec<Money>,
}

impl DepreciationPlan {
    pub fn build(input: &DepreciationInput) -> Self {
        let months = input.useful_life_months();
        let years = input.useful_life_years();
        let final_year_months = months - 12 * (years - 1);
        let amount = input.depreciable_amount();

        let annual_expenses = match input.method() {
            DepreciationMethod::StraightLine => straight_line(amount, months, years),
            DepreciationMethod::DecliningBalance => declining_balance(
                input.depreciable_cost(),
                input.salvage_value(),
                Decimal::ONE / Decimal::from(years),
                years,
            ),
            DepreciationMethod::DoubleDecliningBalance => declining_balance(
                input.depreciable_cost(),
                input.salvage_value(),
                Decimal::TWO / Decimal::from(years),
                years,
            ),
            DepreciationMethod::SumOfYearsDigits => sum_of_years_digits(amount, years),
        };

        let mut cumulative = Vec::with_capacity(annual_expenses.len() + 1);
        let mut running = Decimal::ZERO;
        cumulative.push(running);
        for expense in &annual_expenses {
            running += *expense;
            cumulative.push(running);
        }

        tracing::debug!(
            method = %input.method(),
            depreciable_amount = %amount,
            useful_life_months = months,
            "built depreciation plan"
        );

        DepreciationPlan {
            method: input.method(),
            depreciable_amount: amount,
            useful_life_months: months,
            useful_life_years: years,
            final_year_months,
            annual_expenses,
            cumulative,
        }
    }

    /// Months covered by depreciation year `year_index` (0-based).
    pub fn months_in_year(&self, year_index: u32) -> u32 {
        if year_index + 1 < self.useful_life_years {
            12
        } else if year_index + 1 == self.useful_life_years {
            self.final_year_months
        } else {
            0
        }
    }

    /// Expense accrued in month `month_index` (0-based from the in-service
    /// month). Zero once the life is exhausted.
    pub fn monthly_expense(&self, month_index: u32) -> Money {
        if month_index >= self.useful_life_months {
            return Decimal::ZERO;
        }
        let year = month_index / 12;
        self.annual_expenses[year as usize] / Decimal::from(self.months_in_year(year))
    }

    /// Unrounded accumulated depreciation after `months` whole months.
    pub fn accumulated_after(&self, months: u32) -> Money {
        if months >= self.useful_life_months {
            return self.depreciable_amount;
        }
        let year = months / 12;
        let into_year = months % 12;
        let base = self.cumulative[year as usize];
        if into_year == 0 {
            return base;
        }
        let expense = self.annual_expenses[year as usize];
        base + expense * Decimal::from(into_year) / Decimal::from(self.months_in_year(year))
    }
}

// ---------------------------------------------------------------------------
// Recurrences
// ---------------------------------------------------------------------------

/// Even monthly accrual of `amount / months`; the final year takes exactly
/// what is left so the total never overshoots.
fn straight_line(amount: Money, months: u32, years: u32) -> Vec<Money> {
    let annual = amount * Decimal::from(12) / Decimal::from(months);
    let mut expenses = Vec::with_capacity(years as usize);
    let mut accumulated = Decimal::ZERO;

    for year in 0..years {
        let remaining = amount - accumulated;
        let expense = if year + 1 == years {
            remaining
        } else {
            annual.min(remaining)
        };
        accumulated += expense;
        expenses.push(expense);
    }
    expenses
}

/// Rate applied to the prior year's book value, clipped at salvage. The
/// final year is trued up to salvage so the life reconciles.
fn declining_balance(cost: Money, salvage: Money, rate: Rate, years: u32) -> Vec<Money> {
    let mut expenses = Vec::with_capacity(years as usize);
    let mut book_value = cost;

    for year in 0..years {
        let headroom = (book_value - salvage).max(Decimal::ZERO);
        let expense = if year + 1 == years {
            headroom
        } else {
            (book_value * rate).min(headroom)
        };
        book_value -= expense;
        expenses.push(expense);
    }
    expenses
}

/// `amount * (L - y + 1) / (L (L + 1) / 2)`; the last year absorbs any
/// division residue.
fn sum_of_years_digits(amount: Money, years: u32) -> Vec<Money> {
    let digits = Decimal::from(u64::from(years) * (u64::from(years) + 1) / 2);
    let mut expenses = Vec::with_capacity(years as usize);
    let mut accumulated = Decimal::ZERO;

    for year in 1..=years {
        let expense = if year == years {
            amount - accumulated
        } else {
            amount * Decimal::from(years - year + 1) / digits
        };
        accumulated += expense;
        expenses.push(expense);
    }
    expenses
}
