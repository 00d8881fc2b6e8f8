//! Attendance records to deduction/addition lines.
//!
//! Every rule looks at a single day on its own and the rules stack: a late
//! arrival and an overtime stretch on the same day yield two lines.

use rust_decimal::Decimal;

use crate::engine::round_money;
use crate::engine::salary_config::{
    MAX_OVERTIME_MINUTES, MIN_OVERTIME_MINUTES, SalaryConfig, SalaryRates,
};
use crate::error::EngineResult;
use crate::model::attendance::AttendanceRecord;
use crate::model::payroll::{AdjustmentKind, SalaryAdjustment};

pub const CONCEPT_UNJUSTIFIED_ABSENCE: &str = "Unjustified Absence";
pub const CONCEPT_LATE_ARRIVAL: &str = "Late Arrival";
pub const CONCEPT_EARLY_DEPARTURE: &str = "Early Departure";
pub const CONCEPT_OVERTIME: &str = "Overtime";
pub const CONCEPT_HOLIDAY_WORKED: &str = "Holiday Worked";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceAdjustments {
    pub deductions: Vec<SalaryAdjustment>,
    pub additions: Vec<SalaryAdjustment>,
}

impl AttendanceAdjustments {
    pub fn total_deductions(&self) -> Decimal {
        self.deductions.iter().map(|a| a.amount).sum()
    }

    pub fn total_additions(&self) -> Decimal {
        self.additions.iter().map(|a| a.amount).sum()
    }
}

fn line(
    kind: AdjustmentKind,
    concept: &str,
    amount: Decimal,
    record: &AttendanceRecord,
    notes: String,
) -> SalaryAdjustment {
    SalaryAdjustment {
        kind,
        concept: concept.to_string(),
        amount: round_money(amount),
        date: record.date,
        notes,
    }
}

/// Turn one employee's attendance for a period into adjustment lines.
///
/// `base_salary` is the monthly figure the daily/hourly/minute rates derive
/// from. Fails only when the config or the salary is unusable.
pub fn compute_adjustments(
    records: &[AttendanceRecord],
    base_salary: Decimal,
    config: &SalaryConfig,
) -> EngineResult<AttendanceAdjustments> {
    let rates = SalaryRates::derive(base_salary, config)?;
    let mut out = AttendanceAdjustments::default();

    for record in records {
        if record.is_absent && !record.is_justified && !record.is_holiday {
            out.deductions.push(line(
                AdjustmentKind::Deduction,
                CONCEPT_UNJUSTIFIED_ABSENCE,
                rates.daily,
                record,
                "absent without justification".to_string(),
            ));
        }

        if record.late_minutes > 0 {
            out.deductions.push(line(
                AdjustmentKind::Deduction,
                CONCEPT_LATE_ARRIVAL,
                rates.minute * Decimal::from(record.late_minutes),
                record,
                format!("{} minutes late", record.late_minutes),
            ));
        }

        if record.early_departure_minutes > 0 {
            out.deductions.push(line(
                AdjustmentKind::Deduction,
                CONCEPT_EARLY_DEPARTURE,
                rates.minute * Decimal::from(record.early_departure_minutes),
                record,
                format!("left {} minutes early", record.early_departure_minutes),
            ));
        }

        if record.extra_minutes >= MIN_OVERTIME_MINUTES {
            let paid_minutes = record.extra_minutes.min(MAX_OVERTIME_MINUTES);
            out.additions.push(line(
                AdjustmentKind::Addition,
                CONCEPT_OVERTIME,
                rates.minute * Decimal::from(paid_minutes) * config.overtime_multiplier,
                record,
                format!(
                    "{} extra minutes, {} paid at x{}",
                    record.extra_minutes, paid_minutes, config.overtime_multiplier
                ),
            ));
        }

        if record.is_holiday && !record.is_absent {
            out.additions.push(line(
                AdjustmentKind::Addition,
                CONCEPT_HOLIDAY_WORKED,
                rates.daily * config.holiday_multiplier,
                record,
                format!("holiday worked at x{}", config.holiday_multiplier),
            ));
        }
    }

    Ok(out)
}
