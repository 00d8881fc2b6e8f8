//! Severance settlement from employment dates and monthly salary.
//!
//! Months are fixed 30-day blocks, not calendar months.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::round_money;
use crate::error::{EngineError, EngineResult};

pub const DAYS_PER_MONTH: i64 = 30;
/// Tenures shorter than this skip proportional vacation and bonus by default.
pub const MIN_DAYS_FOR_BENEFITS: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LiquidationCalculation {
    #[schema(value_type = String, format = "date")]
    pub hire_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub termination_date: NaiveDate,
    pub monthly_salary: Decimal,
    pub worked_days: i64,
    pub worked_months: i64,
    pub days_to_pay_in_last_month: u32,
    pub daily_salary: Decimal,
    pub last_month_payment: Decimal,
    pub proportional_vacation: Decimal,
    pub months_in_current_year: i64,
    pub proportional_bonus: Decimal,
    pub years_worked: i64,
    pub compensation_amount: Decimal,
    pub include_vacation: bool,
    pub include_bonus: bool,
    pub total_amount: Decimal,
}

/// Last-month pay and severance always count; vacation and bonus only
/// when included.
pub fn settlement_total(
    last_month_payment: Decimal,
    compensation_amount: Decimal,
    proportional_vacation: Decimal,
    include_vacation: bool,
    proportional_bonus: Decimal,
    include_bonus: bool,
) -> Decimal {
    let mut total = last_month_payment + compensation_amount;
    if include_vacation {
        total += proportional_vacation;
    }
    if include_bonus {
        total += proportional_bonus;
    }
    total
}

impl LiquidationCalculation {
    /// Total under explicit include preferences.
    pub fn total_with(&self, include_vacation: bool, include_bonus: bool) -> Decimal {
        settlement_total(
            self.last_month_payment,
            self.compensation_amount,
            self.proportional_vacation,
            include_vacation,
            self.proportional_bonus,
            include_bonus,
        )
    }
}

pub fn compute_liquidation(
    hire_date: NaiveDate,
    termination_date: NaiveDate,
    monthly_salary: Decimal,
) -> EngineResult<LiquidationCalculation> {
    if termination_date < hire_date {
        return Err(EngineError::validation(format!(
            "invalid employment dates: termination {termination_date} is before hire {hire_date}"
        )));
    }
    if monthly_salary < Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "monthly_salary must be >= 0, got {monthly_salary}"
        )));
    }

    let worked_days = (termination_date - hire_date).num_days();
    let worked_months = worked_days / DAYS_PER_MONTH;
    let days_to_pay_in_last_month = termination_date.day();

    let daily_salary = monthly_salary / Decimal::from(DAYS_PER_MONTH);
    let last_month_payment = round_money(daily_salary * Decimal::from(days_to_pay_in_last_month));

    let proportional_vacation = round_money(Decimal::from(worked_months % 12) * daily_salary);

    let year_start = NaiveDate::from_ymd_opt(termination_date.year(), 1, 1)
        .ok_or_else(|| EngineError::validation("termination year out of range"))?;
    let months_in_current_year = if hire_date > year_start {
        worked_months
    } else {
        (termination_date - year_start).num_days() / DAYS_PER_MONTH
    };
    let proportional_bonus =
        round_money(monthly_salary / dec!(12) * Decimal::from(months_in_current_year % 12));

    let include_benefits = worked_days >= MIN_DAYS_FOR_BENEFITS;

    let years_worked = worked_months / 12;
    let compensation_amount = if years_worked > 0 {
        round_money(monthly_salary * Decimal::from(years_worked))
    } else {
        Decimal::ZERO
    };

    let mut calc = LiquidationCalculation {
        hire_date,
        termination_date,
        monthly_salary,
        worked_days,
        worked_months,
        days_to_pay_in_last_month,
        daily_salary,
        last_month_payment,
        proportional_vacation,
        months_in_current_year,
        proportional_bonus,
        years_worked,
        compensation_amount,
        include_vacation: include_benefits,
        include_bonus: include_benefits,
        total_amount: Decimal::ZERO,
    };
    calc.total_amount = calc.total_with(calc.include_vacation, calc.include_bonus);
    Ok(calc)
}
