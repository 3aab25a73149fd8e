use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::database::{models::ActivityInput, repositories::activity};
use crate::middleware::RequestInfo;

pub mod actions {
    pub const COMPENSATION_CREATED: &str = "compensation.created";
    pub const COMPENSATION_UPDATED: &str = "compensation.updated";
    pub const COMPENSATION_PAID: &str = "compensation.paid";
    pub const HIKE_APPLIED: &str = "hike.applied";
    pub const HIKE_PROMOTED: &str = "hike.promoted";
    pub const HIKE_RETIRED: &str = "hike.retired";
}

fn client_parts(client: Option<&RequestInfo>) -> (Option<String>, Option<String>) {
    match client {
        Some(info) => (info.ip_address.clone(), info.user_agent.clone()),
        None => (None, None),
    }
}

fn metadata(value: serde_json::Value) -> Option<String> {
    serde_json::to_string(&value).ok()
}

pub async fn compensation_created(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    record_id: Uuid,
    basic_amount: i64,
    client: Option<&RequestInfo>,
) -> Result<(), sqlx::Error> {
    let (ip_address, user_agent) = client_parts(client);
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(record_id),
            action: actions::COMPENSATION_CREATED.to_string(),
            description: "Compensation record created".to_string(),
            metadata: metadata(serde_json::json!({ "basicAmount": basic_amount })),
            ip_address,
            user_agent,
        },
    )
    .await?;
    Ok(())
}

pub async fn compensation_updated(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    record_id: Uuid,
    basic_amount: i64,
    client: Option<&RequestInfo>,
) -> Result<(), sqlx::Error> {
    let (ip_address, user_agent) = client_parts(client);
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(record_id),
            action: actions::COMPENSATION_UPDATED.to_string(),
            description: "Compensation draft updated".to_string(),
            metadata: metadata(serde_json::json!({ "basicAmount": basic_amount })),
            ip_address,
            user_agent,
        },
    )
    .await?;
    Ok(())
}

pub async fn compensation_paid(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    record_id: Uuid,
    client: Option<&RequestInfo>,
) -> Result<(), sqlx::Error> {
    let (ip_address, user_agent) = client_parts(client);
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(record_id),
            action: actions::COMPENSATION_PAID.to_string(),
            description: "Compensation record marked paid".to_string(),
            metadata: None,
            ip_address,
            user_agent,
        },
    )
    .await?;
    Ok(())
}

pub async fn hike_applied(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    source_record_id: Uuid,
    new_record_id: Uuid,
    hike_percent: f64,
    start_date: DateTime<Utc>,
    client: Option<&RequestInfo>,
) -> Result<(), sqlx::Error> {
    let (ip_address, user_agent) = client_parts(client);
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(new_record_id),
            action: actions::HIKE_APPLIED.to_string(),
            description: format!("Hike of {hike_percent}% scheduled"),
            metadata: metadata(serde_json::json!({
                "sourceRecordId": source_record_id,
                "hikePercent": hike_percent,
                "startDate": start_date,
            })),
            ip_address,
            user_agent,
        },
    )
    .await?;
    Ok(())
}

/// Scheduler-side entry; there is no originating request.
pub async fn hike_promoted(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    promoted_id: Uuid,
    cancelled_id: Option<Uuid>,
    period_month: &str,
    period_year: i32,
) -> Result<(), sqlx::Error> {
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(promoted_id),
            action: actions::HIKE_PROMOTED.to_string(),
            description: format!("Hike promoted for {period_month} {period_year}"),
            metadata: metadata(serde_json::json!({
                "cancelledRecordId": cancelled_id,
                "periodMonth": period_month,
                "periodYear": period_year,
            })),
            ip_address: None,
            user_agent: None,
        },
    )
    .await?;
    Ok(())
}

/// Scheduler-side entry for a candidate superseded by a later hike.
pub async fn hike_retired(
    tx: &mut Transaction<'_, Sqlite>,
    employee_id: Uuid,
    retired_id: Uuid,
    superseded_by: Uuid,
) -> Result<(), sqlx::Error> {
    activity::log_activity(
        tx,
        ActivityInput {
            employee_id,
            record_id: Some(retired_id),
            action: actions::HIKE_RETIRED.to_string(),
            description: "Hike candidate superseded".to_string(),
            metadata: metadata(serde_json::json!({ "supersededBy": superseded_by })),
            ip_address: None,
            user_agent: None,
        },
    )
    .await?;
    Ok(())
}
