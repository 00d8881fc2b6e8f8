//! Consistency and policy checks on a computed payroll.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use strum_macros::AsRefStr;
use utoipa::ToSchema;

use crate::engine::payroll_calculator::PayrollCalculation;
use crate::error::{EngineError, EngineResult};
use crate::model::payroll::AttendanceBonus;

/// Deductions above this share of the hand salary block the payroll.
pub const MAX_DEDUCTION_RATIO: Decimal = dec!(0.5);
pub const ADDITIONS_WARNING_RATIO: Decimal = dec!(0.5);
pub const BONUS_WARNING_RATIO: Decimal = dec!(0.2);
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueCode {
    NegativeAdjustedHandSalary,
    NegativeTotalSalary,
    DeductionCapExceeded,
    UndefinedDeductionRatio,
    BonusWithoutAmount,
    TotalSalaryMismatch,
    AdjustedHandSalaryMismatch,
    HighAdditions,
    HighAttendanceBonus,
}

impl IssueCode {
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            IssueCode::TotalSalaryMismatch | IssueCode::AdjustedHandSalaryMismatch
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PayrollIssue {
    pub code: IssueCode,
    pub field: String,
    pub message: String,
    pub expected: Option<Decimal>,
    pub actual: Option<Decimal>,
}

impl PayrollIssue {
    fn new(code: IssueCode, field: &str, message: String) -> Self {
        Self {
            code,
            field: field.to_string(),
            message,
            expected: None,
            actual: None,
        }
    }

    fn values(mut self, expected: Decimal, actual: Decimal) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<PayrollIssue>,
    pub warnings: Vec<PayrollIssue>,
}

impl ValidationReport {
    /// Errors become an `EngineError`: a total mismatch is an
    /// inconsistency, anything else a validation failure.
    /// On success the warnings are handed back.
    pub fn into_result(self) -> EngineResult<Vec<PayrollIssue>> {
        if self.is_valid {
            return Ok(self.warnings);
        }

        if let Some(mismatch) = self.errors.iter().find(|e| e.code.is_mismatch()) {
            return Err(EngineError::Inconsistency {
                field: mismatch.field.clone(),
                expected: mismatch.expected.unwrap_or_default(),
                actual: mismatch.actual.unwrap_or_default(),
            });
        }

        Err(EngineError::Validation {
            violations: self.errors.into_iter().map(|e| e.message).collect(),
        })
    }
}

pub fn validate(calc: &PayrollCalculation) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if calc.adjusted_hand_salary < Decimal::ZERO {
        errors.push(
            PayrollIssue::new(
                IssueCode::NegativeAdjustedHandSalary,
                "adjusted_hand_salary",
                format!(
                    "adjusted_hand_salary is negative: {}",
                    calc.adjusted_hand_salary
                ),
            )
            .values(Decimal::ZERO, calc.adjusted_hand_salary),
        );
    }

    if calc.total_salary < Decimal::ZERO {
        errors.push(
            PayrollIssue::new(
                IssueCode::NegativeTotalSalary,
                "total_salary",
                format!("total_salary is negative: {}", calc.total_salary),
            )
            .values(Decimal::ZERO, calc.total_salary),
        );
    }

    let deductions = calc.deductions.total;
    if calc.hand_salary > Decimal::ZERO {
        let ratio = deductions / calc.hand_salary;
        if ratio > MAX_DEDUCTION_RATIO {
            errors.push(
                PayrollIssue::new(
                    IssueCode::DeductionCapExceeded,
                    "deductions.total",
                    format!(
                        "deductions {} exceed {}% of hand salary {}",
                        deductions,
                        MAX_DEDUCTION_RATIO * dec!(100),
                        calc.hand_salary
                    ),
                )
                .values(calc.hand_salary * MAX_DEDUCTION_RATIO, deductions),
            );
        }
    } else if deductions > Decimal::ZERO {
        errors.push(
            PayrollIssue::new(
                IssueCode::UndefinedDeductionRatio,
                "hand_salary",
                format!(
                    "deductions {} cannot be weighed against a hand salary of {}",
                    deductions, calc.hand_salary
                ),
            )
            .values(deductions, calc.hand_salary),
        );
    }

    if let Some(AttendanceBonus {
        amount,
        applied: true,
    }) = calc.attendance_bonus
    {
        if amount <= Decimal::ZERO {
            errors.push(
                PayrollIssue::new(
                    IssueCode::BonusWithoutAmount,
                    "attendance_bonus.amount",
                    format!("attendance bonus applied with amount {amount}"),
                )
                .values(Decimal::ZERO, amount),
            );
        } else if amount > calc.hand_salary * BONUS_WARNING_RATIO {
            warnings.push(
                PayrollIssue::new(
                    IssueCode::HighAttendanceBonus,
                    "attendance_bonus.amount",
                    format!(
                        "attendance bonus {} is above {}% of hand salary {}",
                        amount,
                        BONUS_WARNING_RATIO * dec!(100),
                        calc.hand_salary
                    ),
                )
                .values(calc.hand_salary * BONUS_WARNING_RATIO, amount),
            );
        }
    }

    let expected_adjusted = calc.hand_salary - deductions + calc.additions.total;
    if (expected_adjusted - calc.adjusted_hand_salary).abs() > AMOUNT_TOLERANCE {
        errors.push(
            PayrollIssue::new(
                IssueCode::AdjustedHandSalaryMismatch,
                "adjusted_hand_salary",
                format!(
                    "adjusted_hand_salary should be {} but is {}",
                    expected_adjusted, calc.adjusted_hand_salary
                ),
            )
            .values(expected_adjusted, calc.adjusted_hand_salary),
        );
    }

    let expected_total = expected_adjusted + calc.bank_salary + calc.bonus_paid();
    if (expected_total - calc.total_salary).abs() > AMOUNT_TOLERANCE {
        errors.push(
            PayrollIssue::new(
                IssueCode::TotalSalaryMismatch,
                "total_salary",
                format!(
                    "total_salary should be {} but is {}",
                    expected_total, calc.total_salary
                ),
            )
            .values(expected_total, calc.total_salary),
        );
    }

    let additions = calc.additions.total;
    if calc.hand_salary > Decimal::ZERO {
        if additions / calc.hand_salary > ADDITIONS_WARNING_RATIO {
            warnings.push(
                PayrollIssue::new(
                    IssueCode::HighAdditions,
                    "additions.total",
                    format!(
                        "additions {} are above {}% of hand salary {}",
                        additions,
                        ADDITIONS_WARNING_RATIO * dec!(100),
                        calc.hand_salary
                    ),
                )
                .values(calc.hand_salary * ADDITIONS_WARNING_RATIO, additions),
            );
        }
    } else if additions > Decimal::ZERO {
        warnings.push(
            PayrollIssue::new(
                IssueCode::HighAdditions,
                "additions.total",
                format!("additions {additions} paid on a hand salary of {}", calc.hand_salary),
            )
            .values(Decimal::ZERO, additions),
        );
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::attendance_adjustments::compute_adjustments;
    use crate::engine::payroll_calculator::compute_final_salary;
    use crate::engine::salary_config::SalaryConfig;
    use crate::model::attendance::AttendanceRecord;
    use crate::model::employee::EmployeeSalary;
    use chrono::NaiveDate;

    fn calc(hand: Decimal, bank: Decimal, records: &[AttendanceRecord]) -> PayrollCalculation {
        let employee = EmployeeSalary::new(hand, bank, false, None);
        let adj = compute_adjustments(records, employee.base_salary(), &SalaryConfig::default())
            .unwrap();
        compute_final_salary(&employee, adj.deductions, adj.additions)
    }

    fn day(d: u32) -> AttendanceRecord {
        AttendanceRecord::present(1, NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
    }

    fn codes(issues: &[PayrollIssue]) -> Vec<IssueCode> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_calculator_output_is_valid() {
        let salaries = [
            (dec!(20000), dec!(10000)),
            (dec!(33333.33), dec!(12345.67)),
            (dec!(45000), dec!(0)),
        ];
        let records = vec![
            AttendanceRecord {
                late_minutes: 13,
                ..day(1)
            },
            AttendanceRecord {
                extra_minutes: 77,
                early_departure_minutes: 9,
                ..day(2)
            },
            AttendanceRecord {
                is_holiday: true,
                ..day(3)
            },
        ];
        for (hand, bank) in salaries {
            let report = validate(&calc(hand, bank, &records));
            assert!(report.is_valid, "{hand}/{bank}: {:?}", report.errors);
        }

        let employee = EmployeeSalary::new(dec!(20000), dec!(10000), true, Some(dec!(2000)));
        let bonus_calc = compute_final_salary(&employee, vec![], vec![]);
        assert!(validate(&bonus_calc).is_valid);
    }

    #[test]
    fn test_deductions_over_half_of_hand_salary_block() {
        // 16 absent days at 1000/day against a 10000 hand salary
        let records: Vec<_> = (1..=16)
            .map(|d| AttendanceRecord {
                is_absent: true,
                ..day(d)
            })
            .collect();
        let report = validate(&calc(dec!(10000), dec!(20000), &records));
        assert!(!report.is_valid);
        assert!(codes(&report.errors).contains(&IssueCode::DeductionCapExceeded));
        assert!(codes(&report.errors).contains(&IssueCode::NegativeAdjustedHandSalary));
    }

    #[test]
    fn test_zero_hand_salary_with_deductions_is_an_error() {
        let records = vec![AttendanceRecord {
            late_minutes: 30,
            ..day(1)
        }];
        let report = validate(&calc(dec!(0), dec!(30000), &records));
        assert!(codes(&report.errors).contains(&IssueCode::UndefinedDeductionRatio));
    }

    #[test]
    fn test_zero_hand_salary_without_deductions_passes() {
        let report = validate(&calc(dec!(0), dec!(30000), &[day(1)]));
        assert!(report.is_valid);
    }

    #[test]
    fn test_bonus_applied_without_amount_blocks() {
        let employee = EmployeeSalary::new(dec!(20000), dec!(0), true, None);
        let report = validate(&compute_final_salary(&employee, vec![], vec![]));
        assert_eq!(codes(&report.errors), vec![IssueCode::BonusWithoutAmount]);
    }

    #[test]
    fn test_large_bonus_and_additions_only_warn() {
        let employee = EmployeeSalary::new(dec!(10000), dec!(0), true, Some(dec!(2500)));
        // 8 holidays at 666.67 each against a 10000 hand salary
        let records: Vec<_> = (1..=8)
            .map(|d| AttendanceRecord {
                is_holiday: true,
                ..day(d)
            })
            .collect();
        let adj = compute_adjustments(&records, employee.base_salary(), &SalaryConfig::default())
            .unwrap();
        let report = validate(&compute_final_salary(&employee, adj.deductions, adj.additions));
        assert!(report.is_valid);
        assert_eq!(
            codes(&report.warnings),
            vec![IssueCode::HighAttendanceBonus, IssueCode::HighAdditions]
        );
    }

    #[test]
    fn test_tampered_totals_are_inconsistent() {
        let mut tampered = calc(dec!(20000), dec!(10000), &[day(1)]);
        tampered.total_salary += dec!(0.02);
        let report = validate(&tampered);
        assert_eq!(codes(&report.errors), vec![IssueCode::TotalSalaryMismatch]);
        let issue = &report.errors[0];
        assert_eq!(issue.expected, Some(dec!(30000)));
        assert_eq!(issue.actual, Some(dec!(30000.02)));

        match report.into_result() {
            Err(EngineError::Inconsistency {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "total_salary");
                assert_eq!(expected, dec!(30000));
                assert_eq!(actual, dec!(30000.02));
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
    }

    #[test]
    fn test_drift_within_tolerance_is_accepted() {
        let mut drifted = calc(dec!(20000), dec!(10000), &[day(1)]);
        drifted.total_salary += dec!(0.01);
        drifted.adjusted_hand_salary -= dec!(0.005);
        assert!(validate(&drifted).is_valid);
    }

    #[test]
    fn test_adjusted_hand_mismatch_is_reported() {
        let mut tampered = calc(dec!(20000), dec!(10000), &[day(1)]);
        tampered.adjusted_hand_salary = dec!(19000);
        tampered.total_salary = dec!(29000);
        let report = validate(&tampered);
        assert!(codes(&report.errors).contains(&IssueCode::AdjustedHandSalaryMismatch));
    }
}
