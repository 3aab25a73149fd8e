use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{Activity, ActivityInput};

/// Log a new activity entry inside the caller's transaction so the audit
/// trail commits or rolls back together with the change it describes.
pub async fn log_activity(
    tx: &mut Transaction<'_, Sqlite>,
    input: ActivityInput,
) -> Result<Activity, sqlx::Error> {
    let activity = Activity {
        id: Uuid::new_v4(),
        employee_id: input.employee_id,
        record_id: input.record_id,
        action: input.action,
        description: input.description,
        metadata: input.metadata,
        ip_address: input.ip_address,
        user_agent: input.user_agent,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO activity_log (
            id,
            employee_id,
            record_id,
            action,
            description,
            metadata,
            ip_address,
            user_agent,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(activity.id)
    .bind(activity.employee_id)
    .bind(activity.record_id)
    .bind(&activity.action)
    .bind(&activity.description)
    .bind(&activity.metadata)
    .bind(&activity.ip_address)
    .bind(&activity.user_agent)
    .bind(activity.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(activity)
}

/// Most recent activity entries across all employees.
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Activity>, sqlx::Error> {
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT
            id,
            employee_id,
            record_id,
            action,
            description,
            metadata,
            ip_address,
            user_agent,
            created_at
        FROM activity_log
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(activities)
}

/// Activity entries for one employee, newest first.
pub async fn for_employee(
    pool: &SqlitePool,
    employee_id: Uuid,
    limit: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT
            id,
            employee_id,
            record_id,
            action,
            description,
            metadata,
            ip_address,
            user_agent,
            created_at
        FROM activity_log
        WHERE employee_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(employee_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(activities)
}
