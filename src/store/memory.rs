//! In-memory `PayrollStore` for tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::liquidation::{Liquidation, LiquidationDraft};
use crate::model::payroll::{
    PaymentUpdate, Payroll, PayrollDraft, PayrollPeriod, PayrollSalarySnapshot,
};
use crate::store::PayrollStore;

#[derive(Default)]
struct State {
    employees: HashMap<u64, Employee>,
    attendance: Vec<AttendanceRecord>,
    payrolls: HashMap<u64, Payroll>,
    liquidations: HashMap<u64, Liquidation>,
    next_id: u64,
    broken_employees: HashSet<u64>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn cas_check(&self, id: u64, expected_version: u32) -> EngineResult<()> {
        let current = self
            .liquidations
            .get(&id)
            .ok_or_else(|| EngineError::not_found("liquidation", id))?;
        if current.version != expected_version || !current.is_current {
            return Err(EngineError::Conflict {
                entity: "liquidation",
                id,
                expected_version,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    Started(u64),
    Finished(u64),
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    employee_fetches: AtomicUsize,
    fetches_in_flight: AtomicUsize,
    peak_fetches_in_flight: AtomicUsize,
    fetch_log: Mutex<Vec<FetchEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    pub fn add_employee(&self, employee: Employee) {
        self.state().employees.insert(employee.id, employee);
    }

    pub fn update_employee(&self, employee_id: u64, f: impl FnOnce(&mut Employee)) {
        if let Some(e) = self.state().employees.get_mut(&employee_id) {
            f(e);
        }
    }

    pub fn remove_employee(&self, employee_id: u64) {
        self.state().employees.remove(&employee_id);
    }

    pub fn add_attendance(&self, records: impl IntoIterator<Item = AttendanceRecord>) {
        self.state().attendance.extend(records);
    }

    /// Make every lookup of this employee fail like a dropped connection.
    pub fn break_employee(&self, employee_id: u64) {
        self.state().broken_employees.insert(employee_id);
    }

    pub fn employee_fetches(&self) -> usize {
        self.employee_fetches.load(Ordering::SeqCst)
    }

    /// Most employee lookups ever pending at the same time.
    pub fn peak_fetches_in_flight(&self) -> usize {
        self.peak_fetches_in_flight.load(Ordering::SeqCst)
    }

    pub fn fetch_log(&self) -> Vec<FetchEvent> {
        self.fetch_log.lock().expect("fetch log poisoned").clone()
    }

    fn record(&self, event: FetchEvent) {
        self.fetch_log.lock().expect("fetch log poisoned").push(event);
    }

    pub fn payroll_count(&self) -> usize {
        self.state().payrolls.len()
    }

    pub fn liquidation(&self, id: u64) -> Option<Liquidation> {
        self.state().liquidations.get(&id).cloned()
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .state()
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn fetch_employee(&self, employee_id: u64) -> EngineResult<Employee> {
        self.employee_fetches.fetch_add(1, Ordering::SeqCst);
        self.record(FetchEvent::Started(employee_id));
        let in_flight = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_fetches_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        // a real round trip suspends here
        actix_web::rt::task::yield_now().await;

        let result = {
            let state = self.state();
            if state.broken_employees.contains(&employee_id) {
                Err(EngineError::Infrastructure("connection reset".into()))
            } else {
                state
                    .employees
                    .get(&employee_id)
                    .cloned()
                    .ok_or_else(|| EngineError::not_found("employee", employee_id))
            }
        };

        self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(FetchEvent::Finished(employee_id));
        result
    }

    async fn list_active_employee_ids(&self) -> EngineResult<Vec<u64>> {
        let mut ids: Vec<u64> = self
            .state()
            .employees
            .values()
            .filter(|e| e.is_active())
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch_latest_payroll_salary(
        &self,
        employee_id: u64,
    ) -> EngineResult<PayrollSalarySnapshot> {
        self.state()
            .payrolls
            .values()
            .filter(|p| p.employee_id == employee_id)
            .max_by_key(|p| (p.year, p.month))
            .map(|p| PayrollSalarySnapshot {
                base_salary: p.base_salary,
                bank_salary: p.bank_salary,
            })
            .ok_or_else(|| EngineError::not_found("payroll for employee", employee_id))
    }

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Payroll>> {
        Ok(self
            .state()
            .payrolls
            .values()
            .find(|p| {
                p.employee_id == employee_id
                    && p.month == period.month()
                    && p.year == period.year()
            })
            .cloned())
    }

    async fn find_payroll_by_id(&self, payroll_id: u64) -> EngineResult<Option<Payroll>> {
        Ok(self.state().payrolls.get(&payroll_id).cloned())
    }

    async fn list_payrolls(&self, period: PayrollPeriod) -> EngineResult<Vec<Payroll>> {
        let mut rows: Vec<_> = self
            .state()
            .payrolls
            .values()
            .filter(|p| p.month == period.month() && p.year == period.year())
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.employee_id);
        Ok(rows)
    }

    async fn upsert_payroll(&self, draft: PayrollDraft) -> EngineResult<Payroll> {
        let mut state = self.state();
        let existing = state
            .payrolls
            .values()
            .find(|p| {
                p.employee_id == draft.employee_id
                    && p.month == draft.period.month()
                    && p.year == draft.period.year()
            })
            .map(|p| p.id);
        let id = match existing {
            Some(id) => id,
            None => state.next_id(),
        };
        let payroll = Payroll::from_draft(id, draft);
        state.payrolls.insert(id, payroll.clone());
        Ok(payroll)
    }

    async fn delete_payroll(&self, employee_id: u64, period: PayrollPeriod) -> EngineResult<bool> {
        let mut state = self.state();
        let before = state.payrolls.len();
        state.payrolls.retain(|_, p| {
            !(p.employee_id == employee_id && p.month == period.month() && p.year == period.year())
        });
        Ok(state.payrolls.len() < before)
    }

    async fn update_payroll_payment(
        &self,
        payroll_id: u64,
        update: &PaymentUpdate,
    ) -> EngineResult<Payroll> {
        let mut state = self.state();
        let payroll = state
            .payrolls
            .get_mut(&payroll_id)
            .ok_or_else(|| EngineError::not_found("payroll", payroll_id))?;
        payroll.apply_payment(update);
        Ok(payroll.clone())
    }

    async fn find_liquidation(&self, liquidation_id: u64) -> EngineResult<Option<Liquidation>> {
        Ok(self.state().liquidations.get(&liquidation_id).cloned())
    }

    async fn find_current_liquidation(
        &self,
        employee_id: u64,
    ) -> EngineResult<Option<Liquidation>> {
        Ok(self
            .state()
            .liquidations
            .values()
            .find(|l| l.employee_id == employee_id && l.is_current)
            .cloned())
    }

    async fn list_liquidation_history(&self, employee_id: u64) -> EngineResult<Vec<Liquidation>> {
        let mut rows: Vec<_> = self
            .state()
            .liquidations
            .values()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.version.cmp(&a.version).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn upsert_liquidation(
        &self,
        draft: LiquidationDraft,
        expected_version: u32,
    ) -> EngineResult<Liquidation> {
        let mut state = self.state();
        let id = match draft.id {
            Some(id) => {
                state.cas_check(id, expected_version)?;
                id
            }
            None => {
                let employee_id = draft.employee_id;
                if draft.is_current
                    && state
                        .liquidations
                        .values()
                        .any(|l| l.employee_id == employee_id && l.is_current)
                {
                    return Err(EngineError::InvalidState(format!(
                        "employee {employee_id} already has a current liquidation"
                    )));
                }
                state.next_id()
            }
        };
        let row = Liquidation::from_draft(id, draft);
        state.liquidations.insert(id, row.clone());
        Ok(row)
    }

    async fn supersede_liquidation(
        &self,
        previous_id: u64,
        expected_version: u32,
        next: LiquidationDraft,
    ) -> EngineResult<Liquidation> {
        let mut state = self.state();
        state.cas_check(previous_id, expected_version)?;
        if let Some(previous) = state.liquidations.get_mut(&previous_id) {
            previous.is_current = false;
        }
        let id = state.next_id();
        let row = Liquidation::from_draft(id, next);
        state.liquidations.insert(id, row.clone());
        Ok(row)
    }
}
