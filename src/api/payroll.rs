use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::employee::SalaryStructure;
use crate::service::payroll as payroll_service;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct PayrollPeriod {
    #[schema(example = 6)]
    pub month: u32,

    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    #[schema(example = "Payroll generation completed for 12 employees")]
    pub message: String,

    #[schema(example = 12)]
    pub generated: usize,
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = PayrollPeriod,
    responses(
        (status = 200, description = "Batch completed", body = GenerateResponse),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<PayrollPeriod>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    tracing::info!(
        user_id = auth.user_id,
        username = %auth.username,
        month = payload.month,
        year = payload.year,
        "Batch payroll requested"
    );

    let outcome =
        payroll_service::generate_payroll(store.get_ref(), payload.month, payload.year).await?;
    let generated = outcome.generated.len();

    Ok(HttpResponse::Ok().json(GenerateResponse {
        message: format!("Payroll generation completed for {generated} employees"),
        generated,
    }))
}

#[utoipa::path(
    post,
    path = "/api/payroll/run/{employee_id}",
    request_body = PayrollPeriod,
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Payroll generated", body = crate::model::payroll::PayrollRecord),
        (status = 400, description = "Invalid month, year or salary structure"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn run_payroll(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    payload: web::Json<PayrollPeriod>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let record = payroll_service::run_payroll_for(
        store.get_ref(),
        path.into_inner(),
        payload.month,
        payload.year,
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    post,
    path = "/api/payroll/salary/{employee_id}",
    request_body = SalaryStructure,
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Salary structure updated", body = Object, example = json!({
            "message": "Salary structure updated",
            "salary_structure": { "basic": 30000.0, "hra": 5000.0, "allowances": [], "deductions": [] }
        })),
        (status = 400, description = "Invalid amounts"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_salary_structure(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    payload: web::Json<SalaryStructure>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    tracing::info!(
        user_id = auth.user_id,
        username = %auth.username,
        "Salary structure update requested"
    );

    let structure = payroll_service::update_salary_structure(
        store.get_ref(),
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salary structure updated",
        "salary_structure": structure
    })))
}

#[utoipa::path(
    get,
    path = "/api/payroll/history",
    responses(
        (status = 200, description = "All payroll records, newest period first", body = [crate::model::payroll::PayrollHistoryEntry]),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn all_payroll_history(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let history = payroll_service::all_payroll_history(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee payroll records, newest period first", body = [crate::model::payroll::PayrollRecord]),
        (status = 403, description = "Employees can only view their own payroll")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payroll_history(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    auth.require_self_or_privileged(employee_id, "view payroll for")?;

    let history = payroll_service::employee_payroll_history(store.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(history))
}
