use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::error::{EngineError, EngineResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdjustmentKind {
    Deduction,
    Addition,
}

/// A single deduction or addition line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SalaryAdjustment {
    pub kind: AdjustmentKind,
    #[schema(example = "Unjustified Absence")]
    pub concept: String,
    pub amount: Decimal,
    #[schema(example = "2024-03-04", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub notes: String,
}

/// Sum of a group of adjustment lines plus the lines themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdjustmentSummary {
    pub total: Decimal,
    pub details: Vec<SalaryAdjustment>,
}

impl AdjustmentSummary {
    pub fn from_details(details: Vec<SalaryAdjustment>) -> Self {
        let total = details.iter().map(|a| a.amount).sum();
        Self { total, details }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceBonus {
    pub amount: Decimal,
    pub applied: bool,
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[display(fmt = "{:04}-{:02}", year, month)]
pub struct PayrollPeriod {
    month: u32,
    year: i32,
    #[serde(skip)]
    first_day: NaiveDate,
}

impl PayrollPeriod {
    pub fn new(month: u32, year: i32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EngineError::validation(format!("year {year} is out of range")))?;
        Ok(Self {
            month,
            year,
            first_day,
        })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.and_then(|d| d.pred_opt()).unwrap_or(first)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.year() == self.year
    }
}

/// Persisted payroll row.
///
/// `is_paid` is derived from the two channel flags; there is no setter and
/// no write path accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub hand_salary: Decimal,
    pub bank_salary: Decimal,
    pub base_salary: Decimal,
    pub deductions: AdjustmentSummary,
    pub additions: AdjustmentSummary,
    pub attendance_bonus: Option<AttendanceBonus>,
    pub adjusted_hand_salary: Decimal,
    pub total_salary: Decimal,
    pub is_paid_hand: bool,
    pub is_paid_bank: bool,
    #[schema(value_type = Option<String>, format = "date")]
    pub hand_payment_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub bank_payment_date: Option<NaiveDate>,
    is_paid: bool,
}

impl Payroll {
    pub fn from_draft(id: u64, draft: PayrollDraft) -> Self {
        let is_paid = draft.is_paid_hand && draft.is_paid_bank;
        Self {
            id,
            employee_id: draft.employee_id,
            month: draft.period.month(),
            year: draft.period.year(),
            hand_salary: draft.hand_salary,
            bank_salary: draft.bank_salary,
            base_salary: draft.base_salary,
            deductions: draft.deductions,
            additions: draft.additions,
            attendance_bonus: draft.attendance_bonus,
            adjusted_hand_salary: draft.adjusted_hand_salary,
            total_salary: draft.total_salary,
            is_paid_hand: draft.is_paid_hand,
            is_paid_bank: draft.is_paid_bank,
            hand_payment_date: draft.hand_payment_date,
            bank_payment_date: draft.bank_payment_date,
            is_paid,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    /// Apply a payment update, re-deriving `is_paid`.
    pub fn apply_payment(&mut self, update: &PaymentUpdate) {
        if let Some(paid) = update.is_paid_hand {
            self.is_paid_hand = paid;
            self.hand_payment_date = if paid { update.hand_payment_date } else { None };
        }
        if let Some(paid) = update.is_paid_bank {
            self.is_paid_bank = paid;
            self.bank_payment_date = if paid { update.bank_payment_date } else { None };
        }
        self.is_paid = self.is_paid_hand && self.is_paid_bank;
    }
}

/// What the engine hands to the store for insert or in-place update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollDraft {
    pub employee_id: u64,
    pub period: PayrollPeriod,
    pub hand_salary: Decimal,
    pub bank_salary: Decimal,
    pub base_salary: Decimal,
    pub deductions: AdjustmentSummary,
    pub additions: AdjustmentSummary,
    pub attendance_bonus: Option<AttendanceBonus>,
    pub adjusted_hand_salary: Decimal,
    pub total_salary: Decimal,
    pub is_paid_hand: bool,
    pub is_paid_bank: bool,
    pub hand_payment_date: Option<NaiveDate>,
    pub bank_payment_date: Option<NaiveDate>,
}

impl PayrollDraft {
    /// Carry payment tracking over from an existing row.
    pub fn keep_payment_state(mut self, existing: &Payroll) -> Self {
        self.is_paid_hand = existing.is_paid_hand;
        self.is_paid_bank = existing.is_paid_bank;
        self.hand_payment_date = existing.hand_payment_date;
        self.bank_payment_date = existing.bank_payment_date;
        self
    }
}

/// Partial update of the payment-tracking columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PaymentUpdate {
    pub is_paid_hand: Option<bool>,
    pub is_paid_bank: Option<bool>,
    #[schema(value_type = Option<String>, format = "date")]
    pub hand_payment_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub bank_payment_date: Option<NaiveDate>,
}

impl PaymentUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_paid_hand.is_none() && self.is_paid_bank.is_none()
    }

    /// Stamp `today` on channels marked paid without a date.
    pub fn stamped(mut self, today: NaiveDate) -> Self {
        if self.is_paid_hand == Some(true) && self.hand_payment_date.is_none() {
            self.hand_payment_date = Some(today);
        }
        if self.is_paid_bank == Some(true) && self.bank_payment_date.is_none() {
            self.bank_payment_date = Some(today);
        }
        self
    }
}

/// Salary figures recovered from an employee's most recent payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollSalarySnapshot {
    pub base_salary: Decimal,
    pub bank_salary: Decimal,
}
