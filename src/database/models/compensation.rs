use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum ActiveStatus {
        Enabled => "enabled",
        Disabled => "disabled",
        Cancelled => "cancelled",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum PayStatus {
        Draft => "draft",
        Paid => "paid",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum ComponentKind {
        Earning => "earning",
        Deduction => "deduction",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum ComponentMode {
        Fixed => "fixed",
        Percent => "percent",
    }
}

/// One compensation row per (employee, period) candidate. Exactly one row per
/// employee may be `enabled` at a time; `pay_status` is an independent axis
/// owned by the statement-issuance flow.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompensationRecord {
    pub id: Uuid,          // UUID primary key
    pub employee_id: Uuid, // employee entity lives outside this service
    pub period_month: String,
    pub period_year: i32,
    pub basic_amount: i64, // whole rupees
    pub gross_earnings: i64,
    pub total_deductions: i64,
    pub net_pay: i64,
    pub pay_status: PayStatus,
    pub active_status: ActiveStatus,
    pub hike_start_date: Option<DateTime<Utc>>,
    pub hike_percent: Option<f64>,
    pub hike_previous_basic: Option<i64>,
    pub hike_applied: bool, // true while the row is a live promotion candidate
    pub version: i64,       // optimistic concurrency counter
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An earnings or deductions line belonging to a record. The first earnings
/// line (position 0) is the base pay component and tracks `basic_amount`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayComponent {
    pub id: Uuid,
    pub record_id: Uuid,
    pub kind: ComponentKind,
    pub label: String,
    pub amount: i64, // derived cache when mode = percent
    pub percent_of_basic: Option<f64>,
    pub mode: ComponentMode,
    pub position: i32,
}

impl PayComponent {
    /// Refresh the cached amount of a percent-mode line against a basic amount.
    /// Fixed-mode lines are left untouched.
    pub fn refresh_amount(&mut self, basic_amount: i64) {
        if self.mode == ComponentMode::Percent {
            if let Some(percent) = self.percent_of_basic {
                self.amount = round_percent_amount(basic_amount, percent);
            }
        }
    }
}

pub fn round_percent_amount(basic_amount: i64, percent: f64) -> i64 {
    ((basic_amount as f64) * percent / 100.0).round() as i64
}

/// Recompute every derived amount from the component lists and return
/// `(gross_earnings, total_deductions, net_pay)`. Caller-supplied totals are
/// never trusted; this runs before any persistence of a record.
pub fn recompute_amounts(
    basic_amount: i64,
    earnings: &mut [PayComponent],
    deductions: &mut [PayComponent],
) -> (i64, i64, i64) {
    for line in earnings.iter_mut().chain(deductions.iter_mut()) {
        line.refresh_amount(basic_amount);
    }

    let gross_earnings: i64 = earnings.iter().map(|line| line.amount).sum();
    let total_deductions: i64 = deductions.iter().map(|line| line.amount).sum();
    (gross_earnings, total_deductions, gross_earnings - total_deductions)
}

/// Keep the base pay line (first earnings entry) in step with the basic
/// amount after an administrative edit.
pub fn sync_base_line(basic_amount: i64, earnings: &mut [PayComponent]) {
    if let Some(base) = earnings.first_mut() {
        if base.mode == ComponentMode::Fixed {
            base.amount = basic_amount;
        }
    }
}

/// A record together with its ordered component lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationDetail {
    #[serde(flatten)]
    pub record: CompensationRecord,
    pub earnings: Vec<PayComponent>,
    pub deductions: Vec<PayComponent>,
}

/// Result of applying a hike: the record it was derived from (version bumped)
/// and the newly created pending candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HikeApplication {
    pub current_record: CompensationDetail,
    pub new_record: CompensationDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayComponentInput {
    pub label: String,
    pub amount: Option<i64>,
    pub percent_of_basic: Option<f64>,
    pub mode: ComponentMode,
}

impl PayComponentInput {
    pub fn into_component(self, record_id: Uuid, kind: ComponentKind, position: i32) -> PayComponent {
        PayComponent {
            id: Uuid::new_v4(),
            record_id,
            kind,
            label: self.label,
            amount: self.amount.unwrap_or(0),
            percent_of_basic: self.percent_of_basic,
            mode: self.mode,
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompensationInput {
    pub employee_id: Uuid,
    pub basic_amount: i64,
    #[serde(default)]
    pub earnings: Vec<PayComponentInput>,
    #[serde(default)]
    pub deductions: Vec<PayComponentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyHikeInput {
    pub start_date: DateTime<Utc>,
    pub hike_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompensationInput {
    pub basic_amount: Option<i64>,
    pub earnings: Option<Vec<PayComponentInput>>,
    pub deductions: Option<Vec<PayComponentInput>>,
}
