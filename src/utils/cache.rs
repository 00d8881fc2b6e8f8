use moka::future::Cache;
use std::time::Duration;

use crate::model::employee::Employee;
use crate::model::payroll::{Payroll, PayrollPeriod};

/// (employee_id, month, year)
pub type PayrollKey = (u64, u32, i32);

pub fn payroll_key(employee_id: u64, period: PayrollPeriod) -> PayrollKey {
    (employee_id, period.month(), period.year())
}

/// Time-boxed memo of employee and payroll lookups.
///
/// Built per process and handed to whoever needs it; writes must call the
/// matching `invalidate_*`.
#[derive(Clone)]
pub struct LookupCache {
    employees: Cache<u64, Employee>,
    payrolls: Cache<PayrollKey, Payroll>,
}

impl LookupCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            employees: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            payrolls: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn employee(&self, employee_id: u64) -> Option<Employee> {
        self.employees.get(&employee_id).await
    }

    pub async fn put_employee(&self, employee: Employee) {
        self.employees.insert(employee.id, employee).await;
    }

    pub async fn invalidate_employee(&self, employee_id: u64) {
        self.employees.invalidate(&employee_id).await;
    }

    pub async fn payroll(&self, key: &PayrollKey) -> Option<Payroll> {
        self.payrolls.get(key).await
    }

    pub async fn put_payroll(&self, payroll: Payroll) {
        let key = (payroll.employee_id, payroll.month, payroll.year);
        self.payrolls.insert(key, payroll).await;
    }

    pub async fn invalidate_payroll(&self, key: &PayrollKey) {
        self.payrolls.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn employee(id: u64) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            hire_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            termination_date: None,
            status: "active".into(),
            hand_salary: None,
            bank_salary: None,
            has_attendance_bonus: false,
            attendance_bonus_amount: None,
        }
    }

    #[actix_web::test]
    async fn test_put_get_invalidate_employee() {
        let cache = LookupCache::new(Duration::from_secs(60), 100);
        assert!(cache.employee(1).await.is_none());

        cache.put_employee(employee(1)).await;
        assert_eq!(cache.employee(1).await.map(|e| e.id), Some(1));

        cache.invalidate_employee(1).await;
        assert!(cache.employee(1).await.is_none());
    }

    #[actix_web::test]
    async fn test_entries_expire_after_ttl() {
        let cache = LookupCache::new(Duration::from_millis(50), 100);
        cache.put_employee(employee(2)).await;
        actix_web::rt::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.employee(2).await.is_none());
    }
}
