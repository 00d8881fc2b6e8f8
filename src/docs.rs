use crate::api::liquidation::{CreateLiquidation, LiquidationPreferences, PayLiquidation};
use crate::api::payroll::{GeneratePayrollRequest, PeriodQuery};
use crate::engine::payroll_calculator::PayrollCalculation;
use crate::engine::payroll_validator::{IssueCode, PayrollIssue, ValidationReport};
use crate::model::liquidation::{Liquidation, PaymentMethod};
use crate::model::payroll::{
    AdjustmentKind, AdjustmentSummary, AttendanceBonus, PaymentUpdate, Payroll, SalaryAdjustment,
};
use crate::service::payroll_batch::{BatchReport, EmployeeOutcome, OutcomeStatus};
use crate::service::payroll_service::PayrollPreview;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll & Liquidation API",
        version = "1.0.0",
        description = r#"
## Payroll and final-settlement engine

Back-office API for a restaurant's monthly payroll and the liquidation of
terminated employees.

### Key Features
- **Payroll**
  - Attendance-driven deductions and additions, batch generation per month
  - Hand/bank payment tracking
- **Liquidation**
  - Final settlement with vacation, bonus and severance
  - Regeneration with optimistic versioning, immutable once paid

### Security
Every endpoint requires a **JWT Bearer** token issued by the auth service.
Writes need the **HR** or **Admin** role.
"#,
    ),
    paths(
        crate::api::payroll::generate_payrolls,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::preview_payroll,
        crate::api::payroll::update_payment,

        crate::api::liquidation::create_liquidation,
        crate::api::liquidation::get_liquidation,
        crate::api::liquidation::regenerate_liquidation,
        crate::api::liquidation::set_preferences,
        crate::api::liquidation::pay_liquidation,
        crate::api::liquidation::liquidation_history
    ),
    components(
        schemas(
            GeneratePayrollRequest,
            PeriodQuery,
            Payroll,
            PaymentUpdate,
            SalaryAdjustment,
            AdjustmentKind,
            AdjustmentSummary,
            AttendanceBonus,
            PayrollCalculation,
            PayrollPreview,
            ValidationReport,
            PayrollIssue,
            IssueCode,
            BatchReport,
            EmployeeOutcome,
            OutcomeStatus,
            CreateLiquidation,
            LiquidationPreferences,
            PayLiquidation,
            Liquidation,
            PaymentMethod
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Monthly payroll APIs"),
        (name = "Liquidation", description = "Final settlement APIs"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Paths are relative to `API_PREFIX`; the server entry carries it.
    pub fn for_prefix(api_prefix: &str) -> openapi::OpenApi {
        let mut doc = Self::openapi();
        doc.servers = Some(vec![Server::new(api_prefix)]);
        doc
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
