use actix_web::{
    HttpResponse, Result,
    web::{self, Data},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    database::models::{ApplyHikeInput, CreateCompensationInput, UpdateCompensationInput},
    error::AppError,
    handlers::shared::ApiResponse,
    middleware::request_info::RequestInfo,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHikeStatus {
    pub pending: bool,
}

/// Create the initial compensation record for an employee
pub async fn create_compensation(
    state: Data<AppState>,
    input: web::Json<CreateCompensationInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let detail = state
        .hike_service
        .create_compensation(input.into_inner(), Some(&req_info))
        .await?;

    Ok(ApiResponse::success(detail))
}

/// Get the employee's currently enabled compensation record
pub async fn get_current_compensation(
    state: Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let employee_id = path.into_inner();

    let record = state
        .records
        .find_enabled_for_employee(employee_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no enabled compensation record for employee {}",
                employee_id
            ))
        })?;

    let detail = state
        .records
        .load_detail(record)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(detail))
}

/// Full compensation history for an employee, newest first
pub async fn get_history(state: Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let employee_id = path.into_inner();

    let history = state
        .records
        .history_for_employee(employee_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(history))
}

/// Whether a future-dated hike is still waiting for the employee
pub async fn get_pending_hike(state: Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let employee_id = path.into_inner();

    let pending = state
        .records
        .has_pending_hike(employee_id, state.clock.now())
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(PendingHikeStatus { pending }))
}

/// Apply a percentage hike to an enabled record
pub async fn apply_hike(
    state: Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<ApplyHikeInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let record_id = path.into_inner();

    let application = state
        .hike_service
        .apply_hike(record_id, input.into_inner(), Some(&req_info))
        .await?;

    Ok(ApiResponse::success(application))
}

/// Edit a draft record's basic amount and/or component lines
pub async fn update_compensation(
    state: Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateCompensationInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let record_id = path.into_inner();

    let detail = state
        .hike_service
        .update_draft(record_id, input.into_inner(), Some(&req_info))
        .await?;

    Ok(ApiResponse::success(detail))
}

/// Flip an enabled record from draft to paid
pub async fn mark_paid(
    state: Data<AppState>,
    path: web::Path<Uuid>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let record_id = path.into_inner();

    let record = state
        .hike_service
        .mark_paid(record_id, Some(&req_info))
        .await?;

    Ok(ApiResponse::success(record))
}
