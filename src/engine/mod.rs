//! Pure calculation core: no I/O, no shared state.

pub mod attendance_adjustments;
pub mod liquidation_calculator;
pub mod payroll_calculator;
pub mod payroll_validator;
pub mod salary_config;

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency rounding: 2 places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
