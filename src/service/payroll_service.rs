use std::sync::Arc;

use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::engine::attendance_adjustments::compute_adjustments;
use crate::engine::payroll_calculator::{PayrollCalculation, compute_final_salary};
use crate::engine::payroll_validator::{PayrollIssue, ValidationReport, validate};
use crate::engine::salary_config::{SalaryConfig, compute_minute_rate};
use crate::error::{EngineError, EngineResult};
use crate::model::payroll::{PaymentUpdate, Payroll, PayrollDraft, PayrollPeriod};
use crate::store::PayrollStore;

/// A persisted payroll plus what the run noticed on the way.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedPayroll {
    pub payroll: Payroll,
    /// False when an existing row for the period was updated in place.
    pub created: bool,
    pub warnings: Vec<PayrollIssue>,
}

/// Calculation and validation outcome, nothing written.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollPreview {
    pub employee_id: u64,
    /// Rate late arrivals and overtime are priced at.
    pub minute_rate: Decimal,
    pub calculation: PayrollCalculation,
    pub report: ValidationReport,
}

fn draft_from(employee_id: u64, period: PayrollPeriod, calc: PayrollCalculation) -> PayrollDraft {
    PayrollDraft {
        employee_id,
        period,
        hand_salary: calc.hand_salary,
        bank_salary: calc.bank_salary,
        base_salary: calc.base_salary,
        deductions: calc.deductions,
        additions: calc.additions,
        attendance_bonus: calc.attendance_bonus,
        adjusted_hand_salary: calc.adjusted_hand_salary,
        total_salary: calc.total_salary,
        is_paid_hand: false,
        is_paid_bank: false,
        hand_payment_date: None,
        bank_payment_date: None,
    }
}

pub struct PayrollService {
    store: Arc<dyn PayrollStore>,
    config: SalaryConfig,
}

impl PayrollService {
    pub fn new(store: Arc<dyn PayrollStore>, config: SalaryConfig) -> Self {
        Self { store, config }
    }

    async fn calculate(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<PayrollCalculation> {
        let salary = self.store.fetch_employee_salary_fields(employee_id).await?;
        let mut records = self
            .store
            .fetch_attendance(employee_id, period.first_day(), period.last_day())
            .await?;
        records.retain(|r| period.contains(r.date));

        let adjustments = compute_adjustments(&records, salary.base_salary(), &self.config)?;
        Ok(compute_final_salary(
            &salary,
            adjustments.deductions,
            adjustments.additions,
        ))
    }

    pub async fn preview(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<PayrollPreview> {
        let calculation = self.calculate(employee_id, period).await?;
        let minute_rate = compute_minute_rate(calculation.base_salary, &self.config)?;
        let report = validate(&calculation);
        Ok(PayrollPreview {
            employee_id,
            minute_rate,
            calculation,
            report,
        })
    }

    /// Compute, validate and persist. An existing row for the period keeps
    /// its payment tracking.
    pub async fn generate(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<GeneratedPayroll> {
        let calc = self.calculate(employee_id, period).await?;

        let warnings = validate(&calc).into_result().inspect_err(|e| {
            if let EngineError::Inconsistency {
                field,
                expected,
                actual,
            } = e
            {
                error!(employee_id, %period, field = %field, %expected, %actual, "Payroll totals inconsistent");
            } else {
                warn!(employee_id, %period, error = %e, "Payroll rejected by validation");
            }
        })?;

        for issue in &warnings {
            warn!(employee_id, %period, code = issue.code.as_ref(), "{}", issue.message);
        }

        let existing = self.store.find_payroll(employee_id, period).await?;
        let created = existing.is_none();
        let mut draft = draft_from(employee_id, period, calc);
        if let Some(existing) = &existing {
            draft = draft.keep_payment_state(existing);
        }

        let payroll = self.store.upsert_payroll(draft).await?;
        info!(
            employee_id,
            %period,
            payroll_id = payroll.id,
            total = %payroll.total_salary,
            created,
            "Payroll generated"
        );

        Ok(GeneratedPayroll {
            payroll,
            created,
            warnings,
        })
    }

    /// Hard-delete the period's row, then generate from scratch against
    /// fresh employee data. Payment tracking on the old row is lost.
    pub async fn force_regenerate(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<GeneratedPayroll> {
        self.store.forget_employee(employee_id).await;
        if self.store.delete_payroll(employee_id, period).await? {
            warn!(employee_id, %period, "Existing payroll deleted for forced regeneration");
        }
        let mut generated = self.generate(employee_id, period).await?;
        generated.created = true;
        Ok(generated)
    }

    pub async fn get(&self, employee_id: u64, period: PayrollPeriod) -> EngineResult<Payroll> {
        self.store
            .find_payroll(employee_id, period)
            .await?
            .ok_or_else(|| EngineError::not_found("payroll", format!("{employee_id}/{period}")))
    }

    pub async fn list(&self, period: PayrollPeriod) -> EngineResult<Vec<Payroll>> {
        self.store.list_payrolls(period).await
    }

    /// Mark hand/bank channels paid or unpaid. A paid channel without a
    /// date is stamped with today.
    pub async fn update_payment(
        &self,
        payroll_id: u64,
        update: PaymentUpdate,
    ) -> EngineResult<Payroll> {
        if update.is_empty() {
            return Err(EngineError::validation(
                "at least one of is_paid_hand or is_paid_bank is required",
            ));
        }

        let update = update.stamped(Local::now().date_naive());
        let payroll = self.store.update_payroll_payment(payroll_id, &update).await?;
        info!(
            payroll_id,
            is_paid_hand = payroll.is_paid_hand,
            is_paid_bank = payroll.is_paid_bank,
            is_paid = payroll.is_paid(),
            "Payroll payment updated"
        );
        Ok(payroll)
    }

    pub(crate) fn store(&self) -> &Arc<dyn PayrollStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::attendance_adjustments::CONCEPT_UNJUSTIFIED_ABSENCE;
    use crate::model::attendance::AttendanceRecord;
    use crate::model::employee::Employee;
    use crate::store::cached::CachedStore;
    use crate::store::memory::MemoryStore;
    use crate::utils::cache::LookupCache;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn employee(id: u64, hand: Decimal, bank: Decimal) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Marta".into(),
            last_name: "Rios".into(),
            hire_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            termination_date: None,
            status: "active".into(),
            hand_salary: Some(hand),
            bank_salary: Some(bank),
            has_attendance_bonus: false,
            attendance_bonus_amount: None,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, PayrollService, PayrollPeriod) {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, dec!(10000), dec!(20000)));
        let service = PayrollService::new(store.clone(), SalaryConfig::default());
        (store, service, PayrollPeriod::new(4, 2024).unwrap())
    }

    #[actix_web::test]
    async fn test_generate_applies_absence_deduction() {
        let (store, service, period) = setup();
        store.add_attendance([
            AttendanceRecord {
                is_absent: true,
                ..AttendanceRecord::present(1, date(3))
            },
            AttendanceRecord::present(1, date(4)),
            // outside the period
            AttendanceRecord {
                is_absent: true,
                ..AttendanceRecord::present(1, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
            },
        ]);

        let generated = service.generate(1, period).await.unwrap();
        let payroll = generated.payroll;

        assert!(generated.created);
        assert_eq!(payroll.deductions.total, dec!(1000));
        assert_eq!(payroll.deductions.details.len(), 1);
        assert_eq!(payroll.deductions.details[0].concept, CONCEPT_UNJUSTIFIED_ABSENCE);
        assert_eq!(payroll.adjusted_hand_salary, dec!(9000));
        assert_eq!(payroll.total_salary, dec!(29000));
        assert!(!payroll.is_paid());
    }

    #[actix_web::test]
    async fn test_regenerate_keeps_payment_state() {
        let (store, service, period) = setup();
        let first = service.generate(1, period).await.unwrap().payroll;
        service
            .update_payment(
                first.id,
                PaymentUpdate {
                    is_paid_hand: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store.add_attendance([AttendanceRecord {
            late_minutes: 60,
            ..AttendanceRecord::present(1, date(10))
        }]);
        let second = service.generate(1, period).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.payroll.id, first.id);
        assert!(second.payroll.is_paid_hand);
        assert!(second.payroll.hand_payment_date.is_some());
        // 30000 / (30 * 8 * 60) = 2.0833.. per minute
        assert_eq!(second.payroll.deductions.total, dec!(125.00));
        assert_eq!(store.payroll_count(), 1);
    }

    #[actix_web::test]
    async fn test_force_regenerate_drops_payment_state() {
        let (store, service, period) = setup();
        let first = service.generate(1, period).await.unwrap().payroll;
        service
            .update_payment(
                first.id,
                PaymentUpdate {
                    is_paid_hand: Some(true),
                    is_paid_bank: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let forced = service.force_regenerate(1, period).await.unwrap();
        assert!(forced.created);
        assert_ne!(forced.payroll.id, first.id);
        assert!(!forced.payroll.is_paid_hand);
        assert!(!forced.payroll.is_paid());
        assert_eq!(store.payroll_count(), 1);
    }

    #[actix_web::test]
    async fn test_force_regenerate_rereads_cached_salary() {
        let memory = MemoryStore::new();
        memory.add_employee(employee(1, dec!(10000), dec!(20000)));
        let store = Arc::new(CachedStore::new(
            memory,
            LookupCache::new(Duration::from_secs(300), 100),
        ));
        let service = PayrollService::new(store.clone(), SalaryConfig::default());
        let period = PayrollPeriod::new(4, 2024).unwrap();

        let first = service.generate(1, period).await.unwrap();
        assert_eq!(first.payroll.total_salary, dec!(30000));

        store
            .inner()
            .update_employee(1, |e| e.hand_salary = Some(dec!(15000)));
        // plain generation is served from the cache
        let cached = service.generate(1, period).await.unwrap();
        assert_eq!(cached.payroll.total_salary, dec!(30000));

        let forced = service.force_regenerate(1, period).await.unwrap();
        assert_eq!(forced.payroll.hand_salary, dec!(15000));
        assert_eq!(forced.payroll.total_salary, dec!(35000));
    }

    #[actix_web::test]
    async fn test_excessive_deductions_block_persistence() {
        let (store, service, period) = setup();
        // 20 unjustified absences at 1000/day against a 10000 hand salary
        store.add_attendance((1..=20).map(|d| AttendanceRecord {
            is_absent: true,
            ..AttendanceRecord::present(1, date(d))
        }));

        let err = service.generate(1, period).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert_eq!(store.payroll_count(), 0);

        let preview = service.preview(1, period).await.unwrap();
        assert!(!preview.report.is_valid);
        assert_eq!(preview.calculation.deductions.total, dec!(20000));
        assert_eq!(preview.minute_rate, dec!(30000) / dec!(14400));
    }

    #[actix_web::test]
    async fn test_missing_employee_is_not_found() {
        let (_, service, period) = setup();
        let err = service.generate(42, period).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert!(matches!(
            service.get(42, period).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[actix_web::test]
    async fn test_payment_update_stamps_and_derives_is_paid() {
        let (_, service, period) = setup();
        let payroll = service.generate(1, period).await.unwrap().payroll;

        assert!(
            service
                .update_payment(payroll.id, PaymentUpdate::default())
                .await
                .is_err()
        );

        let paid = service
            .update_payment(
                payroll.id,
                PaymentUpdate {
                    is_paid_hand: Some(true),
                    is_paid_bank: Some(true),
                    bank_payment_date: Some(date(30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(paid.is_paid());
        assert_eq!(paid.bank_payment_date, Some(date(30)));
        assert_eq!(paid.hand_payment_date, Some(Local::now().date_naive()));

        let unpaid = service
            .update_payment(
                payroll.id,
                PaymentUpdate {
                    is_paid_bank: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!unpaid.is_paid());
        assert_eq!(unpaid.bank_payment_date, None);
        assert_eq!(service.list(period).await.unwrap().len(), 1);
    }
}
