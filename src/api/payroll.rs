use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::EngineError;
use crate::model::payroll::{PaymentUpdate, Payroll, PayrollPeriod};
use crate::service::payroll_batch::{BatchReport, generate_for_period};
use crate::service::payroll_service::{PayrollPreview, PayrollService};
use crate::utils::db_utils::reject_derived_fields;

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayrollRequest {
    /// Empty means every active employee.
    #[serde(default)]
    #[schema(example = json!([1001, 1002]))]
    pub employee_ids: Vec<u64>,

    #[schema(example = 3)]
    pub month: u32,

    #[schema(example = 2024)]
    pub year: i32,

    /// Delete existing rows first; payment tracking is lost.
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = 3)]
    pub month: u32,

    #[schema(example = 2024)]
    pub year: i32,
}

#[utoipa::path(
    post,
    path = "/payroll/generate",
    request_body = GeneratePayrollRequest,
    responses(
        (status = 200, description = "Per-employee outcome of the run", body = BatchReport),
        (status = 400, description = "Invalid period"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payrolls(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    payload: web::Json<GeneratePayrollRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let period = PayrollPeriod::new(payload.month, payload.year)?;
    info!(
        user_id = auth.user_id,
        username = %auth.username,
        %period,
        force = payload.force,
        "Payroll generation requested"
    );
    let report = generate_for_period(&service, &payload.employee_ids, period, payload.force).await?;

    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/payroll",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Payrolls of the period", body = [Payroll]),
        (status = 400, description = "Invalid period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let period = PayrollPeriod::new(query.month, query.year)?;
    let payrolls = service.list(period).await?;

    Ok(HttpResponse::Ok().json(payrolls))
}

#[utoipa::path(
    get,
    path = "/payroll/{employee_id}/{year}/{month}",
    params(
        ("employee_id", description = "Employee ID"),
        ("year", description = "Year"),
        ("month", description = "Month, 1-12")
    ),
    responses(
        (status = 200, description = "Payroll found", body = Payroll),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<(u64, i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, year, month) = path.into_inner();
    auth.require_access_to(employee_id)?;

    let payroll = service
        .get(employee_id, PayrollPeriod::new(month, year)?)
        .await?;

    Ok(HttpResponse::Ok().json(payroll))
}

#[utoipa::path(
    get,
    path = "/payroll/{employee_id}/{year}/{month}/preview",
    params(
        ("employee_id", description = "Employee ID"),
        ("year", description = "Year"),
        ("month", description = "Month, 1-12")
    ),
    responses(
        (status = 200, description = "Calculation and validation report, nothing saved", body = PayrollPreview),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<(u64, i32, u32)>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let (employee_id, year, month) = path.into_inner();
    let preview = service
        .preview(employee_id, PayrollPeriod::new(month, year)?)
        .await?;

    Ok(HttpResponse::Ok().json(preview))
}

#[utoipa::path(
    patch,
    path = "/payroll/{payroll_id}/payment",
    request_body = PaymentUpdate,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payment state updated", body = Payroll),
        (status = 400, description = "Empty update or attempt to write is_paid"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payment(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let payroll_id = path.into_inner();
    let body = body.into_inner();
    reject_derived_fields(&body)?;
    let update: PaymentUpdate =
        serde_json::from_value(body).map_err(|e| EngineError::validation(e.to_string()))?;

    let payroll = service.update_payment(payroll_id, update).await?;

    Ok(HttpResponse::Ok().json(payroll))
}

