use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::liquidation::{Liquidation, PaymentMethod};
use crate::service::liquidation_service::{LiquidationOptions, LiquidationService};

#[derive(Deserialize, ToSchema)]
pub struct CreateLiquidation {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Overrides the worked-days rule when set.
    pub include_vacation: Option<bool>,

    /// Overrides the worked-days rule when set.
    pub include_bonus: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct LiquidationPreferences {
    pub include_vacation: bool,
    pub include_bonus: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct PayLiquidation {
    pub payment_method: PaymentMethod,

    /// Defaults to today.
    #[schema(example = "2024-03-31", value_type = Option<String>, format = "date")]
    pub payment_date: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/liquidation",
    request_body = CreateLiquidation,
    responses(
        (status = 201, description = "Liquidation created", body = Liquidation),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee still active or already liquidated")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn create_liquidation(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    payload: web::Json<CreateLiquidation>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let liquidation = service
        .create_for_employee(
            payload.employee_id,
            LiquidationOptions {
                include_vacation: payload.include_vacation,
                include_bonus: payload.include_bonus,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(liquidation))
}

#[utoipa::path(
    get,
    path = "/liquidation/{liquidation_id}",
    params(
        ("liquidation_id", description = "Liquidation ID")
    ),
    responses(
        (status = 200, description = "Liquidation found", body = Liquidation),
        (status = 404, description = "Liquidation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn get_liquidation(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let liquidation = service.get(path.into_inner()).await?;
    auth.require_access_to(liquidation.employee_id)?;

    Ok(HttpResponse::Ok().json(liquidation))
}

#[utoipa::path(
    post,
    path = "/liquidation/{liquidation_id}/regenerate",
    params(
        ("liquidation_id", description = "Liquidation ID")
    ),
    responses(
        (status = 200, description = "Recomputed from current salary data", body = Liquidation),
        (status = 404, description = "Liquidation or employee not found"),
        (status = 409, description = "Paid, superseded, or modified concurrently")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn regenerate_liquidation(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let liquidation = service.regenerate(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(liquidation))
}

#[utoipa::path(
    put,
    path = "/liquidation/{liquidation_id}/preferences",
    request_body = LiquidationPreferences,
    params(
        ("liquidation_id", description = "Liquidation ID")
    ),
    responses(
        (status = 200, description = "Preferences stored, total recomputed", body = Liquidation),
        (status = 409, description = "Paid, superseded, or modified concurrently")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn set_preferences(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    path: web::Path<u64>,
    body: web::Json<LiquidationPreferences>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let liquidation = service
        .set_preferences(path.into_inner(), body.include_vacation, body.include_bonus)
        .await?;

    Ok(HttpResponse::Ok().json(liquidation))
}

#[utoipa::path(
    post,
    path = "/liquidation/{liquidation_id}/pay",
    request_body = PayLiquidation,
    params(
        ("liquidation_id", description = "Liquidation ID")
    ),
    responses(
        (status = 200, description = "Liquidation paid", body = Liquidation),
        (status = 409, description = "Already paid or superseded")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn pay_liquidation(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    path: web::Path<u64>,
    body: web::Json<PayLiquidation>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let liquidation_id = path.into_inner();
    info!(
        user_id = auth.user_id,
        username = %auth.username,
        liquidation_id,
        "Liquidation payment requested"
    );
    let liquidation = service
        .mark_paid(liquidation_id, body.payment_date, body.payment_method)
        .await?;

    Ok(HttpResponse::Ok().json(liquidation))
}

#[utoipa::path(
    get,
    path = "/liquidation/employee/{employee_id}/history",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Every version, newest first", body = [Liquidation]),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Liquidation"
)]
pub async fn liquidation_history(
    auth: AuthUser,
    service: web::Data<LiquidationService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;

    let history = service.history(employee_id).await?;

    Ok(HttpResponse::Ok().json(history))
}
