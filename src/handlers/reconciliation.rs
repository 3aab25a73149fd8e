use actix_web::{HttpResponse, Result, web::Data};

use crate::{AppState, handlers::shared::ApiResponse};

/// Manual trigger for a reconciliation pass; same code path as the
/// scheduler tick.
pub async fn run_reconciliation(state: Data<AppState>) -> Result<HttpResponse> {
    let outcome = state.reconciliation_service.run_reconciliation().await?;

    Ok(ApiResponse::success_with_message(
        outcome,
        "reconciliation completed",
    ))
}
