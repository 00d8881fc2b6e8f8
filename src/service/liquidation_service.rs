use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use strum_macros::{AsRefStr, EnumString};
use tracing::{info, warn};

use crate::engine::liquidation_calculator::compute_liquidation;
use crate::error::{EngineError, EngineResult};
use crate::model::employee::Employee;
use crate::model::liquidation::{Liquidation, LiquidationDraft, PaymentMethod};
use crate::store::PayrollStore;

/// How a regeneration is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum VersioningMode {
    /// Same row, version + 1.
    #[default]
    InPlace,
    /// Old row kept as superseded history, a new current row links back to it.
    NewVersion,
}

/// Caller overrides for a new liquidation; unset flags follow the
/// worked-days rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidationOptions {
    pub include_vacation: Option<bool>,
    pub include_bonus: Option<bool>,
}

pub struct LiquidationService {
    store: Arc<dyn PayrollStore>,
    mode: VersioningMode,
}

impl LiquidationService {
    pub fn new(store: Arc<dyn PayrollStore>, mode: VersioningMode) -> Self {
        Self { store, mode }
    }

    /// Hand + bank from the employee record, or the latest payroll's base
    /// salary when the record carries none.
    async fn monthly_salary(&self, employee: &Employee) -> EngineResult<Decimal> {
        if employee.has_salary() {
            return Ok(employee.salary().base_salary());
        }

        match self.store.fetch_latest_payroll_salary(employee.id).await {
            Ok(snapshot) => {
                warn!(
                    employee_id = employee.id,
                    base_salary = %snapshot.base_salary,
                    bank_salary = %snapshot.bank_salary,
                    "Employee has no salary on record, using latest payroll"
                );
                Ok(snapshot.base_salary)
            }
            Err(EngineError::NotFound { .. }) => Err(EngineError::validation(format!(
                "employee {} has no salary on record and no payroll to fall back on",
                employee.id
            ))),
            Err(e) => Err(e),
        }
    }

    /// Load a liquidation that may still change.
    async fn load_open(&self, liquidation_id: u64) -> EngineResult<Liquidation> {
        let liquidation = self.get(liquidation_id).await?;
        if liquidation.is_paid {
            return Err(EngineError::InvalidState(format!(
                "liquidation {liquidation_id} is paid and can no longer change"
            )));
        }
        if !liquidation.is_current {
            return Err(EngineError::InvalidState(format!(
                "liquidation {liquidation_id} has been superseded by a newer version"
            )));
        }
        Ok(liquidation)
    }

    pub async fn get(&self, liquidation_id: u64) -> EngineResult<Liquidation> {
        self.store
            .find_liquidation(liquidation_id)
            .await?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))
    }

    pub async fn create_for_employee(
        &self,
        employee_id: u64,
        options: LiquidationOptions,
    ) -> EngineResult<Liquidation> {
        let employee = self.store.fetch_employee(employee_id).await?;
        if employee.is_active() {
            return Err(EngineError::InvalidState(format!(
                "employee {employee_id} is still active"
            )));
        }
        let termination_date = employee.termination_date.ok_or_else(|| {
            EngineError::validation(format!("employee {employee_id} has no termination date"))
        })?;
        if let Some(existing) = self.store.find_current_liquidation(employee_id).await? {
            return Err(EngineError::InvalidState(format!(
                "employee {employee_id} already has liquidation {}",
                existing.id
            )));
        }

        let monthly = self.monthly_salary(&employee).await?;
        let calc = compute_liquidation(employee.hire_date, termination_date, monthly)?;
        let draft = LiquidationDraft::first_version(
            employee_id,
            &calc,
            options.include_vacation.unwrap_or(calc.include_vacation),
            options.include_bonus.unwrap_or(calc.include_bonus),
        );

        let liquidation = self.store.upsert_liquidation(draft, 0).await?;
        info!(
            employee_id,
            liquidation_id = liquidation.id,
            total = %liquidation.total_amount,
            "Liquidation created"
        );
        Ok(liquidation)
    }

    /// Recompute from current salary data. Identity, payment state and the
    /// include preferences are carried over untouched.
    pub async fn regenerate(&self, liquidation_id: u64) -> EngineResult<Liquidation> {
        let current = self.load_open(liquidation_id).await?;
        self.store.forget_employee(current.employee_id).await;
        let employee = self.store.fetch_employee(current.employee_id).await?;

        let termination_date = employee
            .termination_date
            .unwrap_or(current.termination_date);
        let monthly = self.monthly_salary(&employee).await?;
        let calc = compute_liquidation(employee.hire_date, termination_date, monthly)?;

        let draft = current.to_draft().with_calculation(&calc);
        let updated = match self.mode {
            VersioningMode::InPlace => {
                self.store
                    .upsert_liquidation(draft.bumped(), current.version)
                    .await?
            }
            VersioningMode::NewVersion => {
                self.store
                    .supersede_liquidation(current.id, current.version, draft.successor())
                    .await?
            }
        };

        info!(
            liquidation_id = updated.id,
            employee_id = updated.employee_id,
            version = updated.version,
            mode = self.mode.as_ref(),
            previous_total = %current.total_amount,
            total = %updated.total_amount,
            "Liquidation regenerated"
        );
        Ok(updated)
    }

    pub async fn set_preferences(
        &self,
        liquidation_id: u64,
        include_vacation: bool,
        include_bonus: bool,
    ) -> EngineResult<Liquidation> {
        let current = self.load_open(liquidation_id).await?;
        let draft = current
            .to_draft()
            .with_preferences(include_vacation, include_bonus)
            .bumped();
        let updated = self.store.upsert_liquidation(draft, current.version).await?;
        info!(
            liquidation_id,
            include_vacation,
            include_bonus,
            total = %updated.total_amount,
            "Liquidation preferences updated"
        );
        Ok(updated)
    }

    /// After this the liquidation is frozen.
    pub async fn mark_paid(
        &self,
        liquidation_id: u64,
        payment_date: Option<NaiveDate>,
        payment_method: PaymentMethod,
    ) -> EngineResult<Liquidation> {
        let current = self.load_open(liquidation_id).await?;
        let mut draft = current.to_draft().bumped();
        draft.is_paid = true;
        draft.payment_date = Some(payment_date.unwrap_or_else(|| Local::now().date_naive()));
        draft.payment_method = Some(payment_method);

        let paid = self.store.upsert_liquidation(draft, current.version).await?;
        info!(
            liquidation_id,
            method = payment_method.as_ref(),
            total = %paid.total_amount,
            "Liquidation paid"
        );
        Ok(paid)
    }

    /// Every version for the employee, newest first.
    pub async fn history(&self, employee_id: u64) -> EngineResult<Vec<Liquidation>> {
        self.store.fetch_employee(employee_id).await?;
        self.store.list_liquidation_history(employee_id).await
    }
}
