use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::{error, warn};

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::liquidation::{Liquidation, LiquidationDraft, PaymentMethod};
use crate::model::payroll::{
    AdjustmentKind, AdjustmentSummary, AttendanceBonus, PaymentUpdate, Payroll, PayrollDraft,
    PayrollPeriod, PayrollSalarySnapshot, SalaryAdjustment,
};
use crate::store::PayrollStore;
use crate::utils::db_utils::{build_update_sql, execute_update, payment_assignments};

const PAYROLL_COLUMNS: &str = r#"
    id, employee_id, month, year, hand_salary, bank_salary, base_salary,
    deductions_total, additions_total, attendance_bonus_amount, attendance_bonus_applied,
    adjusted_hand_salary, total_salary, is_paid_hand, is_paid_bank,
    hand_payment_date, bank_payment_date, is_paid
"#;

const LIQUIDATION_COLUMNS: &str = r#"
    id, employee_id, termination_date, worked_days, worked_months, days_to_pay_in_last_month,
    base_salary, last_month_payment, proportional_vacation, proportional_bonus,
    compensation_amount, total_amount, include_vacation, include_bonus, is_paid,
    payment_date, payment_method, version, previous_version_id, is_current
"#;

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    month: u32,
    year: i32,
    hand_salary: Decimal,
    bank_salary: Decimal,
    base_salary: Decimal,
    deductions_total: Decimal,
    additions_total: Decimal,
    attendance_bonus_amount: Option<Decimal>,
    attendance_bonus_applied: Option<bool>,
    adjusted_hand_salary: Decimal,
    total_salary: Decimal,
    is_paid_hand: bool,
    is_paid_bank: bool,
    hand_payment_date: Option<NaiveDate>,
    bank_payment_date: Option<NaiveDate>,
    is_paid: bool,
}

#[derive(FromRow)]
struct AdjustmentRow {
    kind: String,
    concept: String,
    amount: Decimal,
    date: NaiveDate,
    notes: String,
}

#[derive(FromRow)]
struct LiquidationRow {
    id: u64,
    employee_id: u64,
    termination_date: NaiveDate,
    worked_days: i64,
    worked_months: i64,
    days_to_pay_in_last_month: u32,
    base_salary: Decimal,
    last_month_payment: Decimal,
    proportional_vacation: Decimal,
    proportional_bonus: Decimal,
    compensation_amount: Decimal,
    total_amount: Decimal,
    include_vacation: bool,
    include_bonus: bool,
    is_paid: bool,
    payment_date: Option<NaiveDate>,
    payment_method: Option<String>,
    version: u32,
    previous_version_id: Option<u64>,
    is_current: bool,
}

impl TryFrom<LiquidationRow> for Liquidation {
    type Error = EngineError;

    fn try_from(row: LiquidationRow) -> EngineResult<Self> {
        let payment_method = row
            .payment_method
            .as_deref()
            .map(|m| {
                m.parse::<PaymentMethod>().map_err(|_| {
                    EngineError::Infrastructure(format!(
                        "liquidation {} has unknown payment method {m}",
                        row.id
                    ))
                })
            })
            .transpose()?;

        Ok(Liquidation {
            id: row.id,
            employee_id: row.employee_id,
            termination_date: row.termination_date,
            worked_days: row.worked_days,
            worked_months: row.worked_months,
            days_to_pay_in_last_month: row.days_to_pay_in_last_month,
            base_salary: row.base_salary,
            last_month_payment: row.last_month_payment,
            proportional_vacation: row.proportional_vacation,
            proportional_bonus: row.proportional_bonus,
            compensation_amount: row.compensation_amount,
            total_amount: row.total_amount,
            include_vacation: row.include_vacation,
            include_bonus: row.include_bonus,
            is_paid: row.is_paid,
            payment_date: row.payment_date,
            payment_method,
            version: row.version,
            previous_version_id: row.previous_version_id,
            is_current: row.is_current,
        })
    }
}

/// `PayrollStore` over a MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_adjustments(
        &self,
        payroll_id: u64,
    ) -> EngineResult<(Vec<SalaryAdjustment>, Vec<SalaryAdjustment>)> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT kind, concept, amount, date, notes
            FROM payroll_adjustments
            WHERE payroll_id = ?
            ORDER BY date, id
            "#,
        )
        .bind(payroll_id)
        .fetch_all(&self.pool)
        .await?;

        let mut deductions = Vec::new();
        let mut additions = Vec::new();
        for row in rows {
            let kind = row.kind.parse::<AdjustmentKind>().map_err(|_| {
                EngineError::Infrastructure(format!(
                    "payroll {payroll_id} has unknown adjustment kind {}",
                    row.kind
                ))
            })?;
            let line = SalaryAdjustment {
                kind,
                concept: row.concept,
                amount: row.amount,
                date: row.date,
                notes: row.notes,
            };
            match kind {
                AdjustmentKind::Deduction => deductions.push(line),
                AdjustmentKind::Addition => additions.push(line),
            }
        }
        Ok((deductions, additions))
    }

    async fn assemble(&self, row: PayrollRow) -> EngineResult<Payroll> {
        let (deductions, additions) = self.load_adjustments(row.id).await?;
        let attendance_bonus = row.attendance_bonus_amount.map(|amount| AttendanceBonus {
            amount,
            applied: row.attendance_bonus_applied.unwrap_or(false),
        });

        let payroll = Payroll::from_draft(
            row.id,
            PayrollDraft {
                employee_id: row.employee_id,
                period: PayrollPeriod::new(row.month, row.year)?,
                hand_salary: row.hand_salary,
                bank_salary: row.bank_salary,
                base_salary: row.base_salary,
                deductions: AdjustmentSummary {
                    total: row.deductions_total,
                    details: deductions,
                },
                additions: AdjustmentSummary {
                    total: row.additions_total,
                    details: additions,
                },
                attendance_bonus,
                adjusted_hand_salary: row.adjusted_hand_salary,
                total_salary: row.total_salary,
                is_paid_hand: row.is_paid_hand,
                is_paid_bank: row.is_paid_bank,
                hand_payment_date: row.hand_payment_date,
                bank_payment_date: row.bank_payment_date,
            },
        );

        if payroll.is_paid() != row.is_paid {
            warn!(
                payroll_id = row.id,
                stored = row.is_paid,
                derived = payroll.is_paid(),
                "Stored is_paid disagrees with channel flags"
            );
        }
        Ok(payroll)
    }

    async fn write_liquidation(
        tx: &mut Transaction<'_, MySql>,
        draft: &LiquidationDraft,
    ) -> EngineResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO liquidations
            (employee_id, termination_date, worked_days, worked_months, days_to_pay_in_last_month,
             base_salary, last_month_payment, proportional_vacation, proportional_bonus,
             compensation_amount, total_amount, include_vacation, include_bonus, is_paid,
             payment_date, payment_method, version, previous_version_id, is_current)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.employee_id)
        .bind(draft.termination_date)
        .bind(draft.worked_days)
        .bind(draft.worked_months)
        .bind(draft.days_to_pay_in_last_month)
        .bind(draft.base_salary)
        .bind(draft.last_month_payment)
        .bind(draft.proportional_vacation)
        .bind(draft.proportional_bonus)
        .bind(draft.compensation_amount)
        .bind(draft.total_amount)
        .bind(draft.include_vacation)
        .bind(draft.include_bonus)
        .bind(draft.is_paid)
        .bind(draft.payment_date)
        .bind(draft.payment_method.map(|m| m.as_ref().to_string()))
        .bind(draft.version)
        .bind(draft.previous_version_id)
        .bind(draft.is_current)
        .execute(&mut **tx)
        .await
        .map_err(|e| liquidation_insert_error(e, draft.employee_id))?;

        Ok(result.last_insert_id())
    }

    /// Zero rows matched: tell a missing row apart from a lost race.
    async fn cas_failure(&self, id: u64, expected_version: u32) -> EngineError {
        match self.find_liquidation(id).await {
            Ok(Some(_)) => EngineError::Conflict {
                entity: "liquidation",
                id,
                expected_version,
            },
            Ok(None) => EngineError::not_found("liquidation", id),
            Err(e) => e,
        }
    }
}

/// `uq_liquidation_current` allows a single current row per employee.
fn liquidation_insert_error(err: sqlx::Error, employee_id: u64) -> EngineError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => EngineError::InvalidState(
            format!("employee {employee_id} already has a current liquidation"),
        ),
        _ => err.into(),
    }
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT employee_id, date, is_absent, is_justified, is_holiday,
                   late_minutes, early_departure_minutes, extra_minutes
            FROM attendance
            WHERE employee_id = ? AND date BETWEEN ? AND ?
            ORDER BY date
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_employee(&self, employee_id: u64) -> EngineResult<Employee> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_code, first_name, last_name, hire_date, termination_date,
                   status, hand_salary, bank_salary, has_attendance_bonus, attendance_bonus_amount
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::not_found("employee", employee_id))
    }

    async fn list_active_employee_ids(&self) -> EngineResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE status = 'active' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn fetch_latest_payroll_salary(
        &self,
        employee_id: u64,
    ) -> EngineResult<PayrollSalarySnapshot> {
        let row = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT base_salary, bank_salary
            FROM payroll
            WHERE employee_id = ?
            ORDER BY year DESC, month DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(base_salary, bank_salary)| PayrollSalarySnapshot {
            base_salary,
            bank_salary,
        })
        .ok_or_else(|| EngineError::not_found("payroll for employee", employee_id))
    }

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Payroll>> {
        let row = sqlx::query_as::<_, PayrollRow>(&format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll WHERE employee_id = ? AND month = ? AND year = ?"
        ))
        .bind(employee_id)
        .bind(period.month())
        .bind(period.year())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_payroll_by_id(&self, payroll_id: u64) -> EngineResult<Option<Payroll>> {
        let row = sqlx::query_as::<_, PayrollRow>(&format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ?"
        ))
        .bind(payroll_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_payrolls(&self, period: PayrollPeriod) -> EngineResult<Vec<Payroll>> {
        let rows = sqlx::query_as::<_, PayrollRow>(&format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll WHERE month = ? AND year = ? ORDER BY employee_id"
        ))
        .bind(period.month())
        .bind(period.year())
        .fetch_all(&self.pool)
        .await?;

        let mut payrolls = Vec::with_capacity(rows.len());
        for row in rows {
            payrolls.push(self.assemble(row).await?);
        }
        Ok(payrolls)
    }

    async fn upsert_payroll(&self, draft: PayrollDraft) -> EngineResult<Payroll> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payroll
            (employee_id, month, year, hand_salary, bank_salary, base_salary,
             deductions_total, additions_total, attendance_bonus_amount, attendance_bonus_applied,
             adjusted_hand_salary, total_salary, is_paid_hand, is_paid_bank,
             hand_payment_date, bank_payment_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                hand_salary = VALUES(hand_salary),
                bank_salary = VALUES(bank_salary),
                base_salary = VALUES(base_salary),
                deductions_total = VALUES(deductions_total),
                additions_total = VALUES(additions_total),
                attendance_bonus_amount = VALUES(attendance_bonus_amount),
                attendance_bonus_applied = VALUES(attendance_bonus_applied),
                adjusted_hand_salary = VALUES(adjusted_hand_salary),
                total_salary = VALUES(total_salary),
                is_paid_hand = VALUES(is_paid_hand),
                is_paid_bank = VALUES(is_paid_bank),
                hand_payment_date = VALUES(hand_payment_date),
                bank_payment_date = VALUES(bank_payment_date)
            "#,
        )
        .bind(draft.employee_id)
        .bind(draft.period.month())
        .bind(draft.period.year())
        .bind(draft.hand_salary)
        .bind(draft.bank_salary)
        .bind(draft.base_salary)
        .bind(draft.deductions.total)
        .bind(draft.additions.total)
        .bind(draft.attendance_bonus.map(|b| b.amount))
        .bind(draft.attendance_bonus.map(|b| b.applied))
        .bind(draft.adjusted_hand_salary)
        .bind(draft.total_salary)
        .bind(draft.is_paid_hand)
        .bind(draft.is_paid_bank)
        .bind(draft.hand_payment_date)
        .bind(draft.bank_payment_date)
        .execute(&mut *tx)
        .await?;

        let payroll_id = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM payroll WHERE employee_id = ? AND month = ? AND year = ?",
        )
        .bind(draft.employee_id)
        .bind(draft.period.month())
        .bind(draft.period.year())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM payroll_adjustments WHERE payroll_id = ?")
            .bind(payroll_id)
            .execute(&mut *tx)
            .await?;

        for line in draft
            .deductions
            .details
            .iter()
            .chain(draft.additions.details.iter())
        {
            sqlx::query(
                r#"
                INSERT INTO payroll_adjustments (payroll_id, kind, concept, amount, date, notes)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(payroll_id)
            .bind(line.kind.as_ref())
            .bind(&line.concept)
            .bind(line.amount)
            .bind(line.date)
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, employee_id = draft.employee_id, "Failed to commit payroll");
            EngineError::from(e)
        })?;

        Ok(Payroll::from_draft(payroll_id, draft))
    }

    async fn delete_payroll(&self, employee_id: u64, period: PayrollPeriod) -> EngineResult<bool> {
        // adjustments go with it (ON DELETE CASCADE)
        let result =
            sqlx::query("DELETE FROM payroll WHERE employee_id = ? AND month = ? AND year = ?")
                .bind(employee_id)
                .bind(period.month())
                .bind(period.year())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_payroll_payment(
        &self,
        payroll_id: u64,
        update: &PaymentUpdate,
    ) -> EngineResult<Payroll> {
        let sql = build_update_sql("payroll", payment_assignments(update), "id", payroll_id)?;
        execute_update(&self.pool, sql).await?;

        // MySQL reports unchanged rows as unaffected, so existence is checked by reading back
        self.find_payroll_by_id(payroll_id)
            .await?
            .ok_or_else(|| EngineError::not_found("payroll", payroll_id))
    }

    async fn find_liquidation(&self, liquidation_id: u64) -> EngineResult<Option<Liquidation>> {
        let row = sqlx::query_as::<_, LiquidationRow>(&format!(
            "SELECT {LIQUIDATION_COLUMNS} FROM liquidations WHERE id = ?"
        ))
        .bind(liquidation_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Liquidation::try_from).transpose()
    }

    async fn find_current_liquidation(
        &self,
        employee_id: u64,
    ) -> EngineResult<Option<Liquidation>> {
        let row = sqlx::query_as::<_, LiquidationRow>(&format!(
            "SELECT {LIQUIDATION_COLUMNS} FROM liquidations \
             WHERE employee_id = ? AND is_current = TRUE ORDER BY version DESC LIMIT 1"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Liquidation::try_from).transpose()
    }

    async fn list_liquidation_history(&self, employee_id: u64) -> EngineResult<Vec<Liquidation>> {
        let rows = sqlx::query_as::<_, LiquidationRow>(&format!(
            "SELECT {LIQUIDATION_COLUMNS} FROM liquidations \
             WHERE employee_id = ? ORDER BY version DESC, id DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Liquidation::try_from).collect()
    }

    async fn upsert_liquidation(
        &self,
        draft: LiquidationDraft,
        expected_version: u32,
    ) -> EngineResult<Liquidation> {
        let Some(id) = draft.id else {
            let mut tx = self.pool.begin().await?;
            let id = Self::write_liquidation(&mut tx, &draft).await?;
            tx.commit().await?;
            return Ok(Liquidation::from_draft(id, draft));
        };

        let result = sqlx::query(
            r#"
            UPDATE liquidations
            SET termination_date = ?, worked_days = ?, worked_months = ?,
                days_to_pay_in_last_month = ?, base_salary = ?, last_month_payment = ?,
                proportional_vacation = ?, proportional_bonus = ?, compensation_amount = ?,
                total_amount = ?, include_vacation = ?, include_bonus = ?, is_paid = ?,
                payment_date = ?, payment_method = ?, version = ?
            WHERE id = ? AND version = ? AND is_current = TRUE
            "#,
        )
        .bind(draft.termination_date)
        .bind(draft.worked_days)
        .bind(draft.worked_months)
        .bind(draft.days_to_pay_in_last_month)
        .bind(draft.base_salary)
        .bind(draft.last_month_payment)
        .bind(draft.proportional_vacation)
        .bind(draft.proportional_bonus)
        .bind(draft.compensation_amount)
        .bind(draft.total_amount)
        .bind(draft.include_vacation)
        .bind(draft.include_bonus)
        .bind(draft.is_paid)
        .bind(draft.payment_date)
        .bind(draft.payment_method.map(|m| m.as_ref().to_string()))
        .bind(draft.version)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(id, expected_version).await);
        }
        Ok(Liquidation::from_draft(id, draft))
    }

    async fn supersede_liquidation(
        &self,
        previous_id: u64,
        expected_version: u32,
        next: LiquidationDraft,
    ) -> EngineResult<Liquidation> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE liquidations
            SET is_current = FALSE
            WHERE id = ? AND version = ? AND is_current = TRUE
            "#,
        )
        .bind(previous_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.cas_failure(previous_id, expected_version).await);
        }

        let id = Self::write_liquidation(&mut tx, &next).await?;
        tx.commit().await?;
        Ok(Liquidation::from_draft(id, next))
    }
}
