use futures::future::join_all;
use serde::Serialize;
use strum_macros::AsRefStr;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::model::payroll::PayrollPeriod;
use crate::service::payroll_service::PayrollService;

/// Employees generated concurrently; batches run one after another.
pub const BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeStatus {
    Created,
    Updated,
    Failed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeOutcome {
    pub employee_id: u64,
    pub status: OutcomeStatus,
    pub payroll_id: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchReport {
    pub run_id: String,
    #[schema(value_type = String, example = "2024-04")]
    pub period: String,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<EmployeeOutcome>,
}

/// Generate payrolls for `employee_ids` (every active employee when empty).
///
/// A failing employee is recorded in the report and never stops the run.
/// With `force`, each employee's existing row is deleted first.
pub async fn generate_for_period(
    service: &PayrollService,
    employee_ids: &[u64],
    period: PayrollPeriod,
    force: bool,
) -> EngineResult<BatchReport> {
    let run_id = Uuid::new_v4().to_string();

    let employee_ids = if employee_ids.is_empty() {
        service.store().list_active_employee_ids().await?
    } else {
        employee_ids.to_vec()
    };

    info!(
        run_id = %run_id,
        %period,
        employees = employee_ids.len(),
        force,
        "Payroll batch started"
    );

    let mut outcomes = Vec::with_capacity(employee_ids.len());
    for chunk in employee_ids.chunks(BATCH_SIZE) {
        let results = join_all(chunk.iter().map(|&employee_id| async move {
            let result = if force {
                service.force_regenerate(employee_id, period).await
            } else {
                service.generate(employee_id, period).await
            };
            (employee_id, result)
        }))
        .await;

        for (employee_id, result) in results {
            let outcome = match result {
                Ok(generated) => EmployeeOutcome {
                    employee_id,
                    status: if generated.created {
                        OutcomeStatus::Created
                    } else {
                        OutcomeStatus::Updated
                    },
                    payroll_id: Some(generated.payroll.id),
                    error: None,
                },
                Err(e) => {
                    warn!(
                        run_id = %run_id,
                        employee_id,
                        %period,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Payroll generation failed"
                    );
                    EmployeeOutcome {
                        employee_id,
                        status: OutcomeStatus::Failed,
                        payroll_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
    }

    let failed = outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Failed)
        .count();
    let succeeded = outcomes.len() - failed;

    info!(run_id = %run_id, %period, succeeded, failed, "Payroll batch finished");

    Ok(BatchReport {
        run_id,
        period: period.to_string(),
        succeeded,
        failed,
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::salary_config::SalaryConfig;
    use crate::model::employee::Employee;
    use crate::store::PayrollStore;
    use crate::store::memory::{FetchEvent, MemoryStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn employee(id: u64, status: &str) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Pedro".into(),
            last_name: "Lima".into(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            termination_date: None,
            status: status.into(),
            hand_salary: Some(dec!(12000)),
            bank_salary: Some(dec!(18000)),
            has_attendance_bonus: true,
            attendance_bonus_amount: Some(dec!(1500)),
        }
    }

    fn setup(count: u64) -> (Arc<MemoryStore>, PayrollService) {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=count {
            store.add_employee(employee(id, "active"));
        }
        let service = PayrollService::new(store.clone(), SalaryConfig::default());
        (store, service)
    }

    #[actix_web::test]
    async fn test_one_failure_does_not_abort_the_run() {
        let (store, service) = setup(12);
        store.break_employee(7);
        let period = PayrollPeriod::new(6, 2024).unwrap();

        let ids: Vec<u64> = (1..=12).chain([99]).collect();
        let report = generate_for_period(&service, &ids, period, false)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 13);
        assert_eq!(report.succeeded, 11);
        assert_eq!(report.failed, 2);
        assert_eq!(report.period, "2024-06");
        assert!(Uuid::parse_str(&report.run_id).is_ok());

        let failed: Vec<u64> = report
            .outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .map(|o| o.employee_id)
            .collect();
        assert_eq!(failed, vec![7, 99]);
        assert!(report.outcomes[6].error.as_deref().unwrap().contains("datastore"));
        assert_eq!(store.payroll_count(), 11);
    }

    #[actix_web::test]
    async fn test_batches_run_five_at_a_time_in_sequence() {
        let (store, service) = setup(12);
        let period = PayrollPeriod::new(6, 2024).unwrap();

        let ids: Vec<u64> = (1..=12).collect();
        let report = generate_for_period(&service, &ids, period, false)
            .await
            .unwrap();
        assert_eq!(report.succeeded, 12);
        assert_eq!(store.peak_fetches_in_flight(), BATCH_SIZE);

        let log = store.fetch_log();
        let position = |event: FetchEvent| log.iter().position(|e| *e == event).unwrap();
        let batches: Vec<&[u64]> = ids.chunks(BATCH_SIZE).collect();
        assert_eq!(batches.len(), 3);
        for pair in batches.windows(2) {
            let last_finished = pair[0]
                .iter()
                .map(|&id| position(FetchEvent::Finished(id)))
                .max()
                .unwrap();
            let first_started = pair[1]
                .iter()
                .map(|&id| position(FetchEvent::Started(id)))
                .min()
                .unwrap();
            assert!(last_finished < first_started);
        }
    }

    #[actix_web::test]
    async fn test_outcomes_keep_input_order_and_report_updates() {
        let (store, service) = setup(3);
        let period = PayrollPeriod::new(6, 2024).unwrap();

        let first = generate_for_period(&service, &[3, 1, 2], period, false)
            .await
            .unwrap();
        assert_eq!(
            first.outcomes.iter().map(|o| o.employee_id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
        assert!(first.outcomes.iter().all(|o| o.status == OutcomeStatus::Created));

        let second = generate_for_period(&service, &[1, 2, 3], period, false)
            .await
            .unwrap();
        assert!(second.outcomes.iter().all(|o| o.status == OutcomeStatus::Updated));

        let forced = generate_for_period(&service, &[1], period, true)
            .await
            .unwrap();
        assert_eq!(forced.outcomes[0].status, OutcomeStatus::Created);
        assert_eq!(store.payroll_count(), 3);

        // 12000 hand + 18000 bank + 1500 bonus
        let payroll = store.find_payroll(1, period).await.unwrap().unwrap();
        assert_eq!(payroll.total_salary, dec!(31500));
    }

    #[actix_web::test]
    async fn test_empty_selection_means_all_active_employees() {
        let (store, service) = setup(4);
        store.add_employee(employee(5, "inactive"));
        let period = PayrollPeriod::new(1, 2025).unwrap();

        let report = generate_for_period(&service, &[], period, false)
            .await
            .unwrap();
        assert_eq!(
            report.outcomes.iter().map(|o| o.employee_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }
}
