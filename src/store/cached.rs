use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::error::EngineResult;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::liquidation::{Liquidation, LiquidationDraft};
use crate::model::payroll::{
    PaymentUpdate, Payroll, PayrollDraft, PayrollPeriod, PayrollSalarySnapshot,
};
use crate::store::PayrollStore;
use crate::utils::cache::{LookupCache, payroll_key};

/// Memoizes employee and payroll-by-period lookups in front of another store.
pub struct CachedStore<S> {
    inner: S,
    cache: LookupCache,
}

impl<S: PayrollStore> CachedStore<S> {
    pub fn new(inner: S, cache: LookupCache) -> Self {
        Self { inner, cache }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PayrollStore> PayrollStore for CachedStore<S> {
    async fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        self.inner.fetch_attendance(employee_id, start, end).await
    }

    async fn fetch_employee(&self, employee_id: u64) -> EngineResult<Employee> {
        if let Some(employee) = self.cache.employee(employee_id).await {
            debug!(employee_id, "employee cache hit");
            return Ok(employee);
        }
        let employee = self.inner.fetch_employee(employee_id).await?;
        self.cache.put_employee(employee.clone()).await;
        Ok(employee)
    }

    async fn forget_employee(&self, employee_id: u64) {
        self.cache.invalidate_employee(employee_id).await;
    }

    async fn list_active_employee_ids(&self) -> EngineResult<Vec<u64>> {
        self.inner.list_active_employee_ids().await
    }

    async fn fetch_latest_payroll_salary(
        &self,
        employee_id: u64,
    ) -> EngineResult<PayrollSalarySnapshot> {
        self.inner.fetch_latest_payroll_salary(employee_id).await
    }

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Payroll>> {
        let key = payroll_key(employee_id, period);
        if let Some(payroll) = self.cache.payroll(&key).await {
            debug!(employee_id, %period, "payroll cache hit");
            return Ok(Some(payroll));
        }
        let found = self.inner.find_payroll(employee_id, period).await?;
        if let Some(payroll) = &found {
            self.cache.put_payroll(payroll.clone()).await;
        }
        Ok(found)
    }

    async fn find_payroll_by_id(&self, payroll_id: u64) -> EngineResult<Option<Payroll>> {
        self.inner.find_payroll_by_id(payroll_id).await
    }

    async fn list_payrolls(&self, period: PayrollPeriod) -> EngineResult<Vec<Payroll>> {
        self.inner.list_payrolls(period).await
    }

    async fn upsert_payroll(&self, draft: PayrollDraft) -> EngineResult<Payroll> {
        let key = payroll_key(draft.employee_id, draft.period);
        self.cache.invalidate_payroll(&key).await;
        let payroll = self.inner.upsert_payroll(draft).await?;
        self.cache.put_payroll(payroll.clone()).await;
        Ok(payroll)
    }

    async fn delete_payroll(&self, employee_id: u64, period: PayrollPeriod) -> EngineResult<bool> {
        self.cache
            .invalidate_payroll(&payroll_key(employee_id, period))
            .await;
        self.inner.delete_payroll(employee_id, period).await
    }

    async fn update_payroll_payment(
        &self,
        payroll_id: u64,
        update: &PaymentUpdate,
    ) -> EngineResult<Payroll> {
        let payroll = self.inner.update_payroll_payment(payroll_id, update).await?;
        self.cache.put_payroll(payroll.clone()).await;
        Ok(payroll)
    }

    async fn find_liquidation(&self, liquidation_id: u64) -> EngineResult<Option<Liquidation>> {
        self.inner.find_liquidation(liquidation_id).await
    }

    async fn find_current_liquidation(
        &self,
        employee_id: u64,
    ) -> EngineResult<Option<Liquidation>> {
        self.inner.find_current_liquidation(employee_id).await
    }

    async fn list_liquidation_history(&self, employee_id: u64) -> EngineResult<Vec<Liquidation>> {
        self.inner.list_liquidation_history(employee_id).await
    }

    async fn upsert_liquidation(
        &self,
        draft: LiquidationDraft,
        expected_version: u32,
    ) -> EngineResult<Liquidation> {
        self.inner.upsert_liquidation(draft, expected_version).await
    }

    async fn supersede_liquidation(
        &self,
        previous_id: u64,
        expected_version: u32,
        next: LiquidationDraft,
    ) -> EngineResult<Liquidation> {
        self.inner
            .supersede_liquidation(previous_id, expected_version, next)
            .await
    }
}
