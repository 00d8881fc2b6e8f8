use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Overtime shorter than this earns nothing.
pub const MIN_OVERTIME_MINUTES: u32 = 30;
/// Overtime minutes paid per day are capped here.
pub const MAX_OVERTIME_MINUTES: u32 = 240;

/// Working-time constants and pay multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryConfig {
    pub overtime_multiplier: Decimal,
    pub holiday_multiplier: Decimal,
    pub working_hours_per_day: u32,
    pub working_days_per_month: u32,
}

impl Default for SalaryConfig {
    fn default() -> Self {
        Self {
            overtime_multiplier: dec!(1.5),
            holiday_multiplier: dec!(2.0),
            working_hours_per_day: 8,
            working_days_per_month: 30,
        }
    }
}

/// Partial config; unset fields keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SalaryConfigOverrides {
    pub overtime_multiplier: Option<Decimal>,
    pub holiday_multiplier: Option<Decimal>,
    pub working_hours_per_day: Option<u32>,
    pub working_days_per_month: Option<u32>,
}

/// Merge `overrides` onto the defaults. Does not validate.
pub fn create_salary_config(overrides: SalaryConfigOverrides) -> SalaryConfig {
    let defaults = SalaryConfig::default();
    SalaryConfig {
        overtime_multiplier: overrides
            .overtime_multiplier
            .unwrap_or(defaults.overtime_multiplier),
        holiday_multiplier: overrides
            .holiday_multiplier
            .unwrap_or(defaults.holiday_multiplier),
        working_hours_per_day: overrides
            .working_hours_per_day
            .unwrap_or(defaults.working_hours_per_day),
        working_days_per_month: overrides
            .working_days_per_month
            .unwrap_or(defaults.working_days_per_month),
    }
}

/// One message per violated constraint; empty means valid.
pub fn validate_salary_config(config: &SalaryConfig) -> Vec<String> {
    let mut violations = Vec::new();

    if config.overtime_multiplier < Decimal::ONE {
        violations.push(format!(
            "overtime_multiplier must be >= 1, got {}",
            config.overtime_multiplier
        ));
    }
    if config.holiday_multiplier < Decimal::ONE {
        violations.push(format!(
            "holiday_multiplier must be >= 1, got {}",
            config.holiday_multiplier
        ));
    }
    if !(1..=24).contains(&config.working_hours_per_day) {
        violations.push(format!(
            "working_hours_per_day must be between 1 and 24, got {}",
            config.working_hours_per_day
        ));
    }
    if !(1..=31).contains(&config.working_days_per_month) {
        violations.push(format!(
            "working_days_per_month must be between 1 and 31, got {}",
            config.working_days_per_month
        ));
    }

    violations
}

impl SalaryConfig {
    pub fn validated(self) -> EngineResult<Self> {
        let violations = validate_salary_config(&self);
        if violations.is_empty() {
            Ok(self)
        } else {
            Err(EngineError::Validation { violations })
        }
    }
}

/// Per-employee pay rates derived from a monthly base salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryRates {
    pub daily: Decimal,
    pub hourly: Decimal,
    pub minute: Decimal,
}

impl SalaryRates {
    pub fn derive(base_salary: Decimal, config: &SalaryConfig) -> EngineResult<Self> {
        let config = config.validated()?;
        if base_salary < Decimal::ZERO {
            return Err(EngineError::validation(format!(
                "base_salary must be >= 0, got {base_salary}"
            )));
        }

        let daily = base_salary / Decimal::from(config.working_days_per_month);
        let hourly = daily / Decimal::from(config.working_hours_per_day);
        let minute = hourly / dec!(60);
        Ok(Self {
            daily,
            hourly,
            minute,
        })
    }
}

pub fn compute_minute_rate(base_salary: Decimal, config: &SalaryConfig) -> EngineResult<Decimal> {
    SalaryRates::derive(base_salary, config).map(|r| r.minute)
}
