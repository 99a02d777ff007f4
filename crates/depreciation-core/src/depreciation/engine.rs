//! `DepreciationEngine`: the configured entry point for every calculation.
//!
//! The engine holds nothing but its configuration. Every method is a pure
//! function of its arguments, so one engine can be shared freely across
//! threads.

use chrono::{Datelike, NaiveDate};

use super::improvement::{self, AssetHistory, HistorySegment, ImprovementOutcome, Rebasing};
use super::input::{AssetPayload, CapitalImprovement, DepreciationInput};
use super::method::{self, DepreciationMethod, MethodResolution};
use super::plan::DepreciationPlan;
use super::schedule::{self, ScheduleEntry};
use crate::calendar;
use crate::config::EngineConfig;
use crate::error::DepreciationError;
use crate::types::Money;
use crate::DepreciationResult;

#[derive(Debug, Clone, Default)]
pub struct DepreciationEngine {
    config: EngineConfig,
}

impl DepreciationEngine {
    pub fn new(config: EngineConfig) -> DepreciationResult<Self> {
        config.validate()?;
        Ok(DepreciationEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a JSON asset payload, resolving its method under the
    /// configured policy.
    pub fn input_from_payload(&self, payload: AssetPayload) -> DepreciationResult<DepreciationInput> {
        let resolution = self.resolve_method(payload.method.as_deref())?;
        DepreciationInput::try_from(payload.into_terms(resolution.method))
    }

    /// Unrounded per-depreciation-year expenses.
    pub fn plan(&self, input: &DepreciationInput) -> DepreciationPlan {
        DepreciationPlan::build(input)
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    /// One entry per calendar year from the in-service year through the
    /// year of the final depreciation month.
    pub fn annual_schedule(&self, input: &DepreciationInput) -> DepreciationResult<Vec<ScheduleEntry>> {
        let monthly = self.monthly_schedule(input, None)?;
        Ok(schedule::roll_up_annual(&monthly))
    }

    /// One entry per calendar month from the in-service month through the
    /// end of the life, or through `horizon`'s month if that comes first.
    pub fn monthly_schedule(
        &self,
        input: &DepreciationInput,
        horizon: Option<NaiveDate>,
    ) -> DepreciationResult<Vec<ScheduleEntry>> {
        let plan = self.plan(input);
        let month_count = match horizon {
            None => plan.useful_life_months,
            Some(limit) => {
                let span = calendar::months_between(input.first_accrual_month(), limit);
                if span < 0 {
                    return Ok(Vec::new());
                }
                u32::try_from(span + 1).unwrap_or(u32::MAX)
            }
        };
        Ok(schedule::monthly_entries(
            input,
            &plan,
            month_count,
            self.config.decimal_places,
        ))
    }

    // -----------------------------------------------------------------------
    // Point lookups
    // -----------------------------------------------------------------------

    /// Book value once every month that began before `as_of`'s month has
    /// accrued. Depreciable cost before the in-service month, salvage value
    /// from the end of the life onwards.
    pub fn book_value_at(&self, input: &DepreciationInput, as_of: NaiveDate) -> DepreciationResult<Money> {
        self.check_query_range(input, as_of.year(), "book_value_at")?;
        Ok(self.book_value_unchecked(input, as_of))
    }

    /// Book value at the close of calendar month `month` of `year`.
    pub fn book_value_for_period(
        &self,
        input: &DepreciationInput,
        year: i32,
        month: u32,
    ) -> DepreciationResult<Money> {
        self.check_query_range(input, year, "book_value_for_period")?;
        let next_month = calendar::add_months(calendar::first_of_month(year, month)?, 1)?;
        Ok(self.book_value_unchecked(input, next_month))
    }

    /// Depreciation expense recognised in calendar year `year`; zero for
    /// years outside the life.
    pub fn annual_expense_for_year(&self, input: &DepreciationInput, year: i32) -> DepreciationResult<Money> {
        self.check_query_range(input, year, "annual_expense_for_year")?;
        let opening_month = calendar::first_of_month(year, 1)?;
        let closing_month = calendar::add_months(opening_month, 12)?;
        let opening = self.book_value_unchecked(input, opening_month);
        let closing = self.book_value_unchecked(input, closing_month);
        Ok(opening - closing)
    }

    /// Callers have already bounded the queried year.
    fn book_value_unchecked(&self, input: &DepreciationInput, as_of: NaiveDate) -> Money {
        let elapsed = calendar::months_between(input.first_accrual_month(), as_of);
        if elapsed <= 0 {
            return input.depreciable_cost();
        }
        let months = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let plan = self.plan(input);
        schedule::book_value_after(input, &plan, months, self.config.decimal_places)
    }

    fn check_query_range(&self, input: &DepreciationInput, year: i32, query: &str) -> DepreciationResult<()> {
        let distance = (i64::from(year) - i64::from(input.in_service_date().year())).abs();
        if distance > i64::from(self.config.max_query_years) {
            return Err(DepreciationError::OutOfRangeQuery {
                query: format!("{query}({year})"),
                reason: format!(
                    "More than {} years from in-service date {}",
                    self.config.max_query_years,
                    input.in_service_date()
                ),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Capital improvements
    // -----------------------------------------------------------------------

    /// Re-base `input` at `improvement`. `prior_schedule` is the schedule the
    /// caller currently holds for `input`; entries before the improvement
    /// month are kept verbatim in the result for splicing.
    pub fn apply_improvement(
        &self,
        input: &DepreciationInput,
        prior_schedule: &[ScheduleEntry],
        improvement: &CapitalImprovement,
        new_remaining_useful_life_months: u32,
    ) -> DepreciationResult<Rebasing> {
        improvement::validate_improvement(input, improvement, new_remaining_useful_life_months)?;

        let book_value_at_improvement = self.book_value_at(input, improvement.improvement_date)?;
        let rebased_input = improvement::rebased_input(
            input,
            improvement,
            book_value_at_improvement,
            new_remaining_useful_life_months,
            self.config.salvage_policy,
        )?;

        tracing::debug!(
            improvement_date = %improvement.improvement_date,
            book_value = %book_value_at_improvement,
            new_basis = %rebased_input.depreciable_cost(),
            "re-based asset for capital improvement"
        );

        Ok(Rebasing {
            improvement: improvement.clone(),
            book_value_at_improvement,
            rebased_input,
            retained_history: improvement::retain_before(prior_schedule, improvement.improvement_date),
        })
    }

    /// Apply one improvement end to end. Without `prior_schedule` the full
    /// monthly schedule of `input` is used; without a remaining life the
    /// improvement's own, then the months left on the current basis.
    pub fn improve_and_splice(
        &self,
        input: &DepreciationInput,
        prior_schedule: Option<&[ScheduleEntry]>,
        improvement: &CapitalImprovement,
        new_remaining_useful_life_months: Option<u32>,
    ) -> DepreciationResult<ImprovementOutcome> {
        let computed;
        let prior = match prior_schedule {
            Some(entries) => entries,
            None => {
                computed = self.monthly_schedule(input, None)?;
                computed.as_slice()
            }
        };
        let remaining = match new_remaining_useful_life_months
            .or(improvement.remaining_useful_life_months)
        {
            Some(months) => months,
            None => improvement::remaining_life_at(input, improvement.improvement_date)?,
        };

        let rebasing = self.apply_improvement(input, prior, improvement, remaining)?;
        let forward = self.monthly_schedule(&rebasing.rebased_input, None)?;
        let monthly = rebasing.splice(&forward);
        let annual = schedule::roll_up_annual(&monthly);
        Ok(ImprovementOutcome {
            rebasing,
            monthly,
            annual,
        })
    }

    /// Apply an ordered list of improvements and splice the monthly
    /// schedules of every resulting basis.
    pub fn asset_history(
        &self,
        input: &DepreciationInput,
        improvements: &[CapitalImprovement],
    ) -> DepreciationResult<AssetHistory> {
        let mut current = input.clone();
        let mut monthly = self.monthly_schedule(&current, None)?;
        let mut segments = vec![HistorySegment {
            input: current.clone(),
            improvement: None,
            book_value_at_improvement: None,
        }];
        let mut previous_date: Option<NaiveDate> = None;

        for improvement in improvements {
            if let Some(previous) = previous_date {
                if improvement.improvement_date < previous {
                    return Err(DepreciationError::invalid(
                        "improvements",
                        format!(
                            "Improvements must be ordered by date ({} follows {})",
                            improvement.improvement_date, previous
                        ),
                    ));
                }
            }
            previous_date = Some(improvement.improvement_date);

            let outcome = self.improve_and_splice(&current, Some(&monthly), improvement, None)?;
            let rebasing = outcome.rebasing;
            monthly = outcome.monthly;

            segments.push(HistorySegment {
                input: rebasing.rebased_input.clone(),
                improvement: Some(improvement.clone()),
                book_value_at_improvement: Some(rebasing.book_value_at_improvement),
            });
            current = rebasing.rebased_input;
        }

        let annual = schedule::roll_up_annual(&monthly);
        Ok(AssetHistory {
            segments,
            monthly,
            annual,
        })
    }

    /// Book value of an asset with improvements at `as_of`: the segment in
    /// force on that date answers.
    pub fn history_book_value_at(
        &self,
        history: &AssetHistory,
        as_of: NaiveDate,
    ) -> DepreciationResult<Money> {
        let segment = history
            .segments
            .iter()
            .rev()
            .find(|s| s.input.first_accrual_month() <= calendar::month_start(as_of))
            .or_else(|| history.segments.first())
            .ok_or_else(|| DepreciationError::invalid("history", "Asset history has no segments"))?;
        self.book_value_at(&segment.input, as_of)
    }

    // -----------------------------------------------------------------------
    // Methods
    // -----------------------------------------------------------------------

    /// Strict guard, independent of the configured policy.
    pub fn validate_method(&self, method: &str) -> DepreciationResult<DepreciationMethod> {
        method::validate_method(method)
    }

    /// Resolve a possibly missing method string under the configured policy.
    pub fn resolve_method(&self, method: Option<&str>) -> DepreciationResult<MethodResolution> {
        method::resolve_method(method, self.config.method_policy)
    }
}
