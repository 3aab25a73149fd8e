use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit trail entry. `metadata` holds a JSON object serialized
/// to text; the shape varies per action.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub record_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub employee_id: Uuid,
    pub record_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
