use chrono::NaiveDate;
use depreciation_core::depreciation::input::MAX_MONEY;
use depreciation_core::depreciation::{
    self, AssetTerms, DepreciationInput, DepreciationMethod, ScheduleEntry,
};
use depreciation_core::{DepreciationEngine, DepreciationError, EngineConfig, Money};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn input(
    cost: Money,
    salvage: Money,
    start: NaiveDate,
    months: u32,
    method: DepreciationMethod,
) -> DepreciationInput {
    DepreciationInput::try_from(AssetTerms {
        acquisition_cost: cost,
        depreciable_cost: None,
        in_service_date: start,
        useful_life_months: months,
        salvage_value: Some(salvage),
        residual_percentage: None,
        method,
    })
    .unwrap()
}

/// A spread of awkward inputs: odd lives, mid-year starts, repeating
/// fractions, non-zero salvage.
fn varied_inputs() -> Vec<DepreciationInput> {
    let mut inputs = Vec::new();
    for method in DepreciationMethod::ALL {
        inputs.push(input(dec!(12000), Decimal::ZERO, d(2020, 1, 1), 120, method));
        inputs.push(input(dec!(10000), dec!(1000), d(2021, 7, 15), 60, method));
        inputs.push(input(dec!(1000), dec!(0), d(2019, 3, 31), 7, method));
        inputs.push(input(dec!(7777.77), dec!(333.33), d(2022, 11, 1), 43, method));
        inputs.push(input(dec!(50000), dec!(2500), d(2018, 2, 28), 1, method));
        inputs.push(input(dec!(999.99), dec!(0.01), d(2023, 12, 1), 37, method));
    }
    inputs
}

fn total(entries: &[ScheduleEntry]) -> Money {
    entries.iter().map(|e| e.depreciation_expense).sum()
}

// ===========================================================================
// Reconciliation and invariants
// ===========================================================================

#[test]
fn test_monthly_schedule_reconciles_to_depreciable_amount() {
    for inp in varied_inputs() {
        let monthly = depreciation::compute_monthly_schedule(&inp, None).unwrap();
        assert_eq!(monthly.len() as u32, inp.useful_life_months());
        assert_eq!(
            total(&monthly),
            inp.depreciable_amount(),
            "monthly total mismatch for {:?}",
            inp
        );
    }
}

#[test]
fn test_monthly_entries_sum_to_annual_entries() {
    for inp in varied_inputs() {
        let monthly = depreciation::compute_monthly_schedule(&inp, None).unwrap();
        let annual = depreciation::compute_annual_schedule(&inp).unwrap();
        for year_entry in &annual {
            let months: Vec<ScheduleEntry> = monthly
                .iter()
                .filter(|m| m.year == year_entry.year)
                .cloned()
                .collect();
            assert_eq!(total(&months), year_entry.depreciation_expense);
            assert_eq!(
                months.last().unwrap().book_value,
                year_entry.book_value,
                "year-end book value for {}",
                year_entry.year
            );
        }
    }
}

#[test]
fn test_book_value_non_increasing_and_floored() {
    for inp in varied_inputs() {
        let monthly = depreciation::compute_monthly_schedule(&inp, None).unwrap();
        let mut previous = inp.depreciable_cost();
        for entry in &monthly {
            assert!(entry.book_value <= previous, "book value rose in {:?}", entry);
            assert!(entry.book_value >= inp.salvage_value(), "below salvage in {:?}", entry);
            assert!(entry.depreciation_expense >= Decimal::ZERO);
            assert_eq!(
                entry.book_value,
                inp.depreciable_cost() - entry.accumulated_depreciation
            );
            previous = entry.book_value;
        }
        assert_eq!(monthly.last().unwrap().book_value, inp.salvage_value());
    }
}

#[test]
fn test_annual_schedule_spans_calendar_years() {
    let inp = input(
        dec!(10000),
        dec!(1000),
        d(2021, 7, 15),
        60,
        DepreciationMethod::StraightLine,
    );
    let annual = depreciation::compute_annual_schedule(&inp).unwrap();
    let years: Vec<i32> = annual.iter().map(|e| e.year).collect();
    assert_eq!(years, vec![2021, 2022, 2023, 2024, 2025, 2026]);
    // six months in the first and last calendar years
    assert_eq!(annual[0].depreciation_expense, dec!(900));
    assert_eq!(annual[1].depreciation_expense, dec!(1800));
    assert_eq!(annual[5].depreciation_expense, dec!(900));
}

// ===========================================================================
// Method behaviour
// ===========================================================================

#[test]
fn test_straight_line_determinism() {
    let inp = input(
        dec!(12000),
        Decimal::ZERO,
        d(2020, 1, 1),
        120,
        DepreciationMethod::StraightLine,
    );
    let annual = depreciation::compute_annual_schedule(&inp).unwrap();
    assert_eq!(annual.len(), 10);
    assert!(annual.iter().all(|e| e.depreciation_expense == dec!(1200)));

    let monthly = depreciation::compute_monthly_schedule(&inp, None).unwrap();
    assert!(monthly.iter().all(|e| e.depreciation_expense == dec!(100)));
}

#[test]
fn test_double_declining_terminal_behaviour() {
    let engine = DepreciationEngine::default();
    let inp = input(
        dec!(10000),
        dec!(1000),
        d(2020, 1, 1),
        60,
        DepreciationMethod::DoubleDecliningBalance,
    );
    let annual = engine.annual_schedule(&inp).unwrap();
    assert_eq!(annual.len(), 5);
    assert_eq!(annual[4].book_value, dec!(1000));
    assert!(annual.iter().all(|e| e.book_value >= dec!(1000)));
    for year in 2025..2030 {
        assert_eq!(engine.annual_expense_for_year(&inp, year).unwrap(), Decimal::ZERO);
    }
    assert_eq!(engine.book_value_at(&inp, d(2031, 6, 1)).unwrap(), dec!(1000));
}

#[test]
fn test_sum_of_years_digits_allocation_order() {
    let inp = input(
        dec!(10000),
        Decimal::ZERO,
        d(2020, 1, 1),
        48,
        DepreciationMethod::SumOfYearsDigits,
    );
    let annual = depreciation::compute_annual_schedule(&inp).unwrap();
    let expenses: Vec<Money> = annual.iter().map(|e| e.depreciation_expense).collect();
    assert!(expenses[0] > expenses[3]);
    let unit = expenses[3];
    assert_eq!(
        expenses,
        vec![unit * dec!(4), unit * dec!(3), unit * dec!(2), unit]
    );
}

#[test]
fn test_declining_balance_front_loads_against_straight_line() {
    let sl = input(dec!(10000), Decimal::ZERO, d(2020, 1, 1), 60, DepreciationMethod::StraightLine);
    let ddb = input(
        dec!(10000),
        Decimal::ZERO,
        d(2020, 1, 1),
        60,
        DepreciationMethod::DoubleDecliningBalance,
    );
    let sl_year1 = depreciation::compute_annual_schedule(&sl).unwrap()[0].depreciation_expense;
    let ddb_year1 = depreciation::compute_annual_schedule(&ddb).unwrap()[0].depreciation_expense;
    assert_eq!(sl_year1, dec!(2000));
    assert_eq!(ddb_year1, dec!(4000));
}

#[test]
fn test_idempotence() {
    for inp in varied_inputs() {
        let first = depreciation::compute_annual_schedule(&inp).unwrap();
        let second = depreciation::compute_annual_schedule(&inp).unwrap();
        assert_eq!(first, second);
    }
}

// ===========================================================================
// Point lookups
// ===========================================================================

#[test]
fn test_book_value_at_matches_monthly_schedule() {
    let engine = DepreciationEngine::default();
    for inp in varied_inputs() {
        let monthly = engine.monthly_schedule(&inp, None).unwrap();
        for entry in monthly.iter().step_by(5) {
            let month = entry.month.unwrap();
            assert_eq!(
                engine.book_value_for_period(&inp, entry.year, month).unwrap(),
                entry.book_value
            );
        }
    }
}

#[test]
fn test_book_value_at_before_service_and_after_life() {
    let inp = input(
        dec!(10000),
        dec!(1000),
        d(2021, 7, 15),
        60,
        DepreciationMethod::SumOfYearsDigits,
    );
    assert_eq!(depreciation::book_value_at(&inp, d(2020, 1, 1)).unwrap(), dec!(10000));
    assert_eq!(depreciation::book_value_at(&inp, d(2026, 7, 1)).unwrap(), dec!(1000));
    assert_eq!(depreciation::book_value_at(&inp, d(2040, 1, 1)).unwrap(), dec!(1000));
}

#[test]
fn test_query_bound_is_configurable() {
    let engine = DepreciationEngine::new(EngineConfig {
        max_query_years: 10,
        ..EngineConfig::default()
    })
    .unwrap();
    let inp = input(dec!(1000), Decimal::ZERO, d(2020, 1, 1), 12, DepreciationMethod::StraightLine);
    assert!(engine.book_value_at(&inp, d(2030, 1, 1)).is_ok());
    match engine.book_value_at(&inp, d(2031, 1, 1)).unwrap_err() {
        DepreciationError::OutOfRangeQuery { query, .. } => assert!(query.contains("2031")),
        other => panic!("Expected OutOfRangeQuery, got {other:?}"),
    }
}

#[test]
fn test_precision_is_configurable() {
    let engine = DepreciationEngine::new(EngineConfig {
        decimal_places: 0,
        ..EngineConfig::default()
    })
    .unwrap();
    let inp = input(dec!(1000), Decimal::ZERO, d(2020, 1, 1), 12, DepreciationMethod::StraightLine);
    let monthly = engine.monthly_schedule(&inp, None).unwrap();
    assert_eq!(monthly[0].depreciation_expense, dec!(83));
    assert_eq!(monthly[1].depreciation_expense, dec!(84));
    assert_eq!(total(&monthly), dec!(1000));
}

// ===========================================================================
// Rejection
// ===========================================================================

#[test]
fn test_zero_useful_life_is_invalid_input() {
    let err = DepreciationInput::try_from(AssetTerms {
        acquisition_cost: dec!(1000),
        depreciable_cost: None,
        in_service_date: d(2020, 1, 1),
        useful_life_months: 0,
        salvage_value: None,
        residual_percentage: None,
        method: DepreciationMethod::StraightLine,
    })
    .unwrap_err();
    assert!(matches!(err, DepreciationError::InvalidInput { .. }));
}

#[test]
fn test_zero_useful_life_json_is_rejected() {
    let json = r#"{
        "acquisition_cost": "1000",
        "in_service_date": "2020-01-01",
        "useful_life_months": 0,
        "method": "DOUBLE_DECLINING_BALANCE"
    }"#;
    let err = serde_json::from_str::<DepreciationInput>(json).unwrap_err();
    assert!(err.to_string().contains("Useful life"));
}

#[test]
fn test_unsupported_method_string() {
    match depreciation::validate_method("MACRS").unwrap_err() {
        DepreciationError::UnsupportedMethod(m) => assert_eq!(m, "MACRS"),
        other => panic!("Expected UnsupportedMethod, got {other:?}"),
    }
}

#[test]
fn test_largest_accepted_amount_computes_for_every_method() {
    for method in DepreciationMethod::ALL {
        for months in [1, 7, 120, 1200] {
            let inp = input(MAX_MONEY, Decimal::ZERO, d(2020, 3, 1), months, method);
            let annual = depreciation::compute_annual_schedule(&inp).unwrap();
            assert_eq!(total(&annual), MAX_MONEY, "{method} over {months} months");
            assert_eq!(annual.last().unwrap().book_value, Decimal::ZERO);
        }
    }
}

#[test]
fn test_amount_beyond_decimal_headroom_is_invalid_input() {
    for method in DepreciationMethod::ALL {
        let err = DepreciationInput::try_from(AssetTerms {
            acquisition_cost: Decimal::from_i128_with_scale(10i128.pow(28), 0),
            depreciable_cost: None,
            in_service_date: d(2020, 1, 1),
            useful_life_months: 120,
            salvage_value: None,
            residual_percentage: None,
            method,
        })
        .unwrap_err();
        match err {
            DepreciationError::InvalidInput { field, .. } => assert_eq!(field, "acquisition_cost"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
