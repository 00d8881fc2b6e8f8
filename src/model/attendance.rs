use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of attendance for one employee.
///
/// Produced by the attendance tracker; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub is_absent: bool,
    pub is_justified: bool,
    pub is_holiday: bool,
    pub late_minutes: u32,
    pub early_departure_minutes: u32,
    pub extra_minutes: u32,
}

#[cfg(test)]
impl AttendanceRecord {
    /// A plain, on-time working day.
    pub fn present(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            is_absent: false,
            is_justified: false,
            is_holiday: false,
            late_minutes: 0,
            early_departure_minutes: 0,
            extra_minutes: 0,
        }
    }
}
