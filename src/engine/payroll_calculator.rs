use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::employee::EmployeeSalary;
use crate::model::payroll::{AdjustmentSummary, AttendanceBonus, SalaryAdjustment};

/// Full payroll breakdown for one employee and one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PayrollCalculation {
    pub hand_salary: Decimal,
    pub bank_salary: Decimal,
    pub base_salary: Decimal,
    pub deductions: AdjustmentSummary,
    pub additions: AdjustmentSummary,
    pub attendance_bonus: Option<AttendanceBonus>,
    pub adjusted_hand_salary: Decimal,
    pub total_salary: Decimal,
}

impl PayrollCalculation {
    pub fn bonus_paid(&self) -> Decimal {
        match self.attendance_bonus {
            Some(AttendanceBonus {
                amount,
                applied: true,
            }) => amount,
            _ => Decimal::ZERO,
        }
    }
}

/// Net the adjustment lines against the hand salary, then add the bank
/// salary and, when the employee has one, the flat attendance bonus.
///
/// Negative inputs are passed through untouched; flagging them is the
/// validator's job.
pub fn compute_final_salary(
    employee: &EmployeeSalary,
    deductions: Vec<SalaryAdjustment>,
    additions: Vec<SalaryAdjustment>,
) -> PayrollCalculation {
    let deductions = AdjustmentSummary::from_details(deductions);
    let additions = AdjustmentSummary::from_details(additions);

    let attendance_bonus = if employee.has_attendance_bonus {
        Some(AttendanceBonus {
            amount: employee.attendance_bonus_amount.unwrap_or_default(),
            applied: true,
        })
    } else {
        employee.attendance_bonus_amount.map(|amount| AttendanceBonus {
            amount,
            applied: false,
        })
    };

    let adjusted_hand_salary = employee.hand_salary - deductions.total + additions.total;

    let mut calc = PayrollCalculation {
        hand_salary: employee.hand_salary,
        bank_salary: employee.bank_salary,
        base_salary: employee.base_salary(),
        deductions,
        additions,
        attendance_bonus,
        adjusted_hand_salary,
        total_salary: Decimal::ZERO,
    };
    calc.total_salary = adjusted_hand_salary + calc.bank_salary + calc.bonus_paid();
    calc
}
