use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "hire_date": "2023-01-01",
        "termination_date": null,
        "status": "active",
        "hand_salary": 20000.0,
        "bank_salary": 40000.0,
        "has_attendance_bonus": true,
        "attendance_bonus_amount": 3000.0
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "2023-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = "2024-03-15", value_type = Option<String>, format = "date", nullable = true)]
    pub termination_date: Option<NaiveDate>,

    #[schema(example = "active")]
    pub status: String,

    pub hand_salary: Option<Decimal>,
    pub bank_salary: Option<Decimal>,
    pub has_attendance_bonus: bool,
    pub attendance_bonus_amount: Option<Decimal>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// True when either salary channel carries a non-zero amount.
    pub fn has_salary(&self) -> bool {
        self.hand_salary.is_some_and(|s| !s.is_zero()) || self.bank_salary.is_some_and(|s| !s.is_zero())
    }

    pub fn salary(&self) -> EmployeeSalary {
        EmployeeSalary::new(
            self.hand_salary.unwrap_or_default(),
            self.bank_salary.unwrap_or_default(),
            self.has_attendance_bonus,
            self.attendance_bonus_amount,
        )
    }
}

/// Salary fields the payroll calculation needs.
///
/// `base_salary` is always `hand_salary + bank_salary`; the constructor is the
/// only way to build one so the two cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSalary {
    pub hand_salary: Decimal,
    pub bank_salary: Decimal,
    base_salary: Decimal,
    pub has_attendance_bonus: bool,
    pub attendance_bonus_amount: Option<Decimal>,
}

impl EmployeeSalary {
    pub fn new(
        hand_salary: Decimal,
        bank_salary: Decimal,
        has_attendance_bonus: bool,
        attendance_bonus_amount: Option<Decimal>,
    ) -> Self {
        Self {
            hand_salary,
            bank_salary,
            base_salary: hand_salary + bank_salary,
            has_attendance_bonus,
            attendance_bonus_amount,
        }
    }

    pub fn base_salary(&self) -> Decimal {
        self.base_salary
    }
}
