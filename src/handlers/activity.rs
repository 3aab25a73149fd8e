use actix_web::{
    HttpResponse, Result,
    web::{self, Data},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState, database::repositories::activity, error::AppError, handlers::shared::ApiResponse,
};

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQueryInput {
    pub limit: Option<i64>,
}

/// Most recent audit entries across all employees
pub async fn get_recent_activity(
    state: Data<AppState>,
    query: web::Query<ActivityQueryInput>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);

    let activities = activity::recent(state.records.pool(), limit)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(activities))
}

/// Audit entries for one employee
pub async fn get_employee_activity(
    state: Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActivityQueryInput>,
) -> Result<HttpResponse> {
    let employee_id = path.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);

    let activities = activity::for_employee(state.records.pool(), employee_id, limit)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(activities))
}
