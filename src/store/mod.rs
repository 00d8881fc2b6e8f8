//! Datastore seam of the engine.
//!
//! The engine never talks SQL itself; it goes through [`PayrollStore`].

pub mod cached;
#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeeSalary};
use crate::model::liquidation::{Liquidation, LiquidationDraft};
use crate::model::payroll::{
    PaymentUpdate, Payroll, PayrollDraft, PayrollPeriod, PayrollSalarySnapshot,
};

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Attendance for `employee_id` with `start <= date <= end`, ordered by date.
    async fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>>;

    /// `NotFound` when the employee does not exist.
    async fn fetch_employee(&self, employee_id: u64) -> EngineResult<Employee>;

    async fn fetch_employee_salary_fields(&self, employee_id: u64) -> EngineResult<EmployeeSalary> {
        Ok(self.fetch_employee(employee_id).await?.salary())
    }

    /// Drop any memoized copy so the next `fetch_employee` reads the source.
    async fn forget_employee(&self, _employee_id: u64) {}

    async fn list_active_employee_ids(&self) -> EngineResult<Vec<u64>>;

    /// `NotFound` when the employee has no payroll yet.
    async fn fetch_latest_payroll_salary(
        &self,
        employee_id: u64,
    ) -> EngineResult<PayrollSalarySnapshot>;

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Payroll>>;

    async fn find_payroll_by_id(&self, payroll_id: u64) -> EngineResult<Option<Payroll>>;

    async fn list_payrolls(&self, period: PayrollPeriod) -> EngineResult<Vec<Payroll>>;

    /// Insert, or overwrite the row for the same (employee, period) in place.
    /// Adjustment lines are replaced wholesale.
    async fn upsert_payroll(&self, draft: PayrollDraft) -> EngineResult<Payroll>;

    /// Hard delete. Returns whether a row existed.
    async fn delete_payroll(&self, employee_id: u64, period: PayrollPeriod) -> EngineResult<bool>;

    /// Only the payment-tracking columns; `is_paid` is re-derived by the store.
    async fn update_payroll_payment(
        &self,
        payroll_id: u64,
        update: &PaymentUpdate,
    ) -> EngineResult<Payroll>;

    async fn find_liquidation(&self, liquidation_id: u64) -> EngineResult<Option<Liquidation>>;

    async fn find_current_liquidation(&self, employee_id: u64)
    -> EngineResult<Option<Liquidation>>;

    /// Every version for the employee, newest first.
    async fn list_liquidation_history(&self, employee_id: u64) -> EngineResult<Vec<Liquidation>>;

    /// `draft.id == None` inserts. Otherwise a compare-and-swap update of a
    /// current row: it only applies when the stored version equals
    /// `expected_version`, else `Conflict`.
    async fn upsert_liquidation(
        &self,
        draft: LiquidationDraft,
        expected_version: u32,
    ) -> EngineResult<Liquidation>;

    /// Atomically mark `previous_id` superseded (same CAS rule as
    /// `upsert_liquidation`) and insert `next` as the new current row.
    async fn supersede_liquidation(
        &self,
        previous_id: u64,
        expected_version: u32,
        next: LiquidationDraft,
    ) -> EngineResult<Liquidation>;
}
