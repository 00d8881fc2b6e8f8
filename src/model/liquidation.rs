use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::engine::liquidation_calculator::{LiquidationCalculation, settlement_total};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
}

/// Final settlement row for a terminated employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Liquidation {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub termination_date: NaiveDate,
    pub worked_days: i64,
    pub worked_months: i64,
    pub days_to_pay_in_last_month: u32,
    /// Monthly hand + bank salary the amounts were computed from.
    pub base_salary: Decimal,
    pub last_month_payment: Decimal,
    pub proportional_vacation: Decimal,
    pub proportional_bonus: Decimal,
    /// Years-worked severance.
    pub compensation_amount: Decimal,
    pub total_amount: Decimal,
    pub include_vacation: bool,
    pub include_bonus: bool,
    pub is_paid: bool,
    #[schema(value_type = Option<String>, format = "date")]
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub version: u32,
    /// Audit link only; the previous row is never loaded through it.
    pub previous_version_id: Option<u64>,
    /// False once a newer version supersedes this row.
    pub is_current: bool,
}

impl Liquidation {
    pub fn from_draft(id: u64, draft: LiquidationDraft) -> Self {
        Self {
            id,
            employee_id: draft.employee_id,
            termination_date: draft.termination_date,
            worked_days: draft.worked_days,
            worked_months: draft.worked_months,
            days_to_pay_in_last_month: draft.days_to_pay_in_last_month,
            base_salary: draft.base_salary,
            last_month_payment: draft.last_month_payment,
            proportional_vacation: draft.proportional_vacation,
            proportional_bonus: draft.proportional_bonus,
            compensation_amount: draft.compensation_amount,
            total_amount: draft.total_amount,
            include_vacation: draft.include_vacation,
            include_bonus: draft.include_bonus,
            is_paid: draft.is_paid,
            payment_date: draft.payment_date,
            payment_method: draft.payment_method,
            version: draft.version,
            previous_version_id: draft.previous_version_id,
            is_current: draft.is_current,
        }
    }

    pub fn to_draft(&self) -> LiquidationDraft {
        LiquidationDraft {
            id: Some(self.id),
            employee_id: self.employee_id,
            termination_date: self.termination_date,
            worked_days: self.worked_days,
            worked_months: self.worked_months,
            days_to_pay_in_last_month: self.days_to_pay_in_last_month,
            base_salary: self.base_salary,
            last_month_payment: self.last_month_payment,
            proportional_vacation: self.proportional_vacation,
            proportional_bonus: self.proportional_bonus,
            compensation_amount: self.compensation_amount,
            total_amount: self.total_amount,
            include_vacation: self.include_vacation,
            include_bonus: self.include_bonus,
            is_paid: self.is_paid,
            payment_date: self.payment_date,
            payment_method: self.payment_method,
            version: self.version,
            previous_version_id: self.previous_version_id,
            is_current: self.is_current,
        }
    }
}

/// Insert (`id = None`) or compare-and-swap update (`id = Some`) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationDraft {
    pub id: Option<u64>,
    pub employee_id: u64,
    pub termination_date: NaiveDate,
    pub worked_days: i64,
    pub worked_months: i64,
    pub days_to_pay_in_last_month: u32,
    pub base_salary: Decimal,
    pub last_month_payment: Decimal,
    pub proportional_vacation: Decimal,
    pub proportional_bonus: Decimal,
    pub compensation_amount: Decimal,
    pub total_amount: Decimal,
    pub include_vacation: bool,
    pub include_bonus: bool,
    pub is_paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub version: u32,
    pub previous_version_id: Option<u64>,
    pub is_current: bool,
}

impl LiquidationDraft {
    /// First version of a fresh, unpaid liquidation.
    pub fn first_version(
        employee_id: u64,
        calc: &LiquidationCalculation,
        include_vacation: bool,
        include_bonus: bool,
    ) -> Self {
        Self {
            id: None,
            employee_id,
            termination_date: calc.termination_date,
            worked_days: calc.worked_days,
            worked_months: calc.worked_months,
            days_to_pay_in_last_month: calc.days_to_pay_in_last_month,
            base_salary: calc.monthly_salary,
            last_month_payment: calc.last_month_payment,
            proportional_vacation: calc.proportional_vacation,
            proportional_bonus: calc.proportional_bonus,
            compensation_amount: calc.compensation_amount,
            total_amount: calc.total_with(include_vacation, include_bonus),
            include_vacation,
            include_bonus,
            is_paid: false,
            payment_date: None,
            payment_method: None,
            version: 1,
            previous_version_id: None,
            is_current: true,
        }
    }

    /// Overwrite the computed fields, leaving identity, payment state and
    /// the include preferences alone.
    pub fn with_calculation(mut self, calc: &LiquidationCalculation) -> Self {
        self.termination_date = calc.termination_date;
        self.worked_days = calc.worked_days;
        self.worked_months = calc.worked_months;
        self.days_to_pay_in_last_month = calc.days_to_pay_in_last_month;
        self.base_salary = calc.monthly_salary;
        self.last_month_payment = calc.last_month_payment;
        self.proportional_vacation = calc.proportional_vacation;
        self.proportional_bonus = calc.proportional_bonus;
        self.compensation_amount = calc.compensation_amount;
        self.total_amount = calc.total_with(self.include_vacation, self.include_bonus);
        self
    }

    /// Human override of the include flags; the total follows them.
    pub fn with_preferences(mut self, include_vacation: bool, include_bonus: bool) -> Self {
        self.include_vacation = include_vacation;
        self.include_bonus = include_bonus;
        self.total_amount = settlement_total(
            self.last_month_payment,
            self.compensation_amount,
            self.proportional_vacation,
            include_vacation,
            self.proportional_bonus,
            include_bonus,
        );
        self
    }

    /// Next version of this row, as a compare-and-swap update of itself.
    pub fn bumped(mut self) -> Self {
        self.version += 1;
        self
    }

    /// Next version of this row, as a fresh row linked back to it.
    pub fn successor(mut self) -> Self {
        self.previous_version_id = self.id.take();
        self.version += 1;
        self.is_current = true;
        self
    }
}
