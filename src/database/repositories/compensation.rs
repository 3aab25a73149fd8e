use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{
    ActiveStatus, CompensationDetail, CompensationRecord, ComponentKind, PayComponent, PayStatus,
};

const RECORD_COLUMNS: &str = r#"
    id,
    employee_id,
    period_month,
    period_year,
    basic_amount,
    gross_earnings,
    total_deductions,
    net_pay,
    pay_status,
    active_status,
    hike_start_date,
    hike_percent,
    hike_previous_basic,
    hike_applied,
    version,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct CompensationRepository {
    pool: SqlitePool,
}

impl CompensationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CompensationRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, CompensationRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM compensation_records WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// The employee's current pay truth, if they have one.
    pub async fn find_enabled_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<CompensationRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, CompensationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM compensation_records
            WHERE employee_id = ? AND active_status = ?
            "#
        ))
        .bind(employee_id)
        .bind(ActiveStatus::Enabled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Every record ever created for the employee, newest first. Cancelled
    /// and retired rows are part of the history and are never filtered out.
    pub async fn history_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<CompensationRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, CompensationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM compensation_records
            WHERE employee_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// All live promotion candidates across every employee, grouped by
    /// employee and ordered so the first row per employee is the preferred
    /// one (latest start date, then latest created).
    pub async fn find_pending_candidates(&self) -> Result<Vec<CompensationRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, CompensationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM compensation_records
            WHERE hike_applied = 1
              AND active_status = ?
              AND hike_start_date IS NOT NULL
            ORDER BY employee_id, hike_start_date DESC, created_at DESC, id DESC
            "#
        ))
        .bind(ActiveStatus::Disabled)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Whether a strictly future-dated hike is still waiting for the
    /// employee. Compares instants, not IST days; a hike whose start
    /// instant has passed is the scheduler's business, not "pending".
    pub async fn has_pending_hike(
        &self,
        employee_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM compensation_records
                WHERE employee_id = ?
                  AND hike_applied = 1
                  AND active_status = ?
                  AND hike_start_date > ?
            )
            "#,
        )
        .bind(employee_id)
        .bind(ActiveStatus::Disabled)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Component lines for a record, split into (earnings, deductions),
    /// each in stable position order.
    pub async fn components_for(
        &self,
        record_id: Uuid,
    ) -> Result<(Vec<PayComponent>, Vec<PayComponent>), sqlx::Error> {
        let components = sqlx::query_as::<_, PayComponent>(
            r#"
            SELECT
                id,
                record_id,
                kind,
                label,
                amount,
                percent_of_basic,
                mode,
                position
            FROM pay_components
            WHERE record_id = ?
            ORDER BY kind, position
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(components
            .into_iter()
            .partition(|line| line.kind == ComponentKind::Earning))
    }

    /// Assemble a record with its component lines split by kind.
    pub async fn load_detail(
        &self,
        record: CompensationRecord,
    ) -> Result<CompensationDetail, sqlx::Error> {
        let (earnings, deductions) = self.components_for(record.id).await?;

        Ok(CompensationDetail {
            record,
            earnings,
            deductions,
        })
    }

    /// Insert a record together with its component lines.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &CompensationRecord,
        earnings: &[PayComponent],
        deductions: &[PayComponent],
    ) -> Result<(), sqlx::Error> {
        self.insert_record(tx, record).await?;
        self.insert_components(tx, earnings).await?;
        self.insert_components(tx, deductions).await?;
        Ok(())
    }

    async fn insert_record(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &CompensationRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO compensation_records (
                id,
                employee_id,
                period_month,
                period_year,
                basic_amount,
                gross_earnings,
                total_deductions,
                net_pay,
                pay_status,
                active_status,
                hike_start_date,
                hike_percent,
                hike_previous_basic,
                hike_applied,
                version,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.employee_id)
        .bind(&record.period_month)
        .bind(record.period_year)
        .bind(record.basic_amount)
        .bind(record.gross_earnings)
        .bind(record.total_deductions)
        .bind(record.net_pay)
        .bind(record.pay_status)
        .bind(record.active_status)
        .bind(record.hike_start_date)
        .bind(record.hike_percent)
        .bind(record.hike_previous_basic)
        .bind(record.hike_applied)
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn insert_components(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        components: &[PayComponent],
    ) -> Result<(), sqlx::Error> {
        for line in components {
            sqlx::query(
                r#"
                INSERT INTO pay_components (
                    id,
                    record_id,
                    kind,
                    label,
                    amount,
                    percent_of_basic,
                    mode,
                    position
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(line.id)
            .bind(line.record_id)
            .bind(line.kind)
            .bind(&line.label)
            .bind(line.amount)
            .bind(line.percent_of_basic)
            .bind(line.mode)
            .bind(line.position)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    pub async fn delete_components(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM pay_components WHERE record_id = ?")
            .bind(record_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Promote a disabled candidate to the employee's enabled record.
    ///
    /// Guarded by the caller-observed version; returns false when the row
    /// moved underneath the caller and nothing was changed.
    pub async fn promote(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        period_month: &str,
        period_year: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET active_status = ?,
                hike_applied = 0,
                period_month = ?,
                period_year = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND active_status = ?
            "#,
        )
        .bind(ActiveStatus::Enabled)
        .bind(period_month)
        .bind(period_year)
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(ActiveStatus::Disabled)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancel the currently enabled record ahead of a promotion. Must run
    /// before the matching promote within the same transaction or the
    /// one-enabled-per-employee index rejects the promotion.
    pub async fn cancel(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET active_status = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND active_status = ?
            "#,
        )
        .bind(ActiveStatus::Cancelled)
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(ActiveStatus::Enabled)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Knock a superseded candidate out of the pending pool. The row stays
    /// disabled and keeps its hike fields for the audit trail, but it will
    /// never be considered for promotion again.
    pub async fn retire_candidate(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET hike_applied = 0,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND active_status = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(ActiveStatus::Disabled)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET pay_status = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND pay_status = ?
            "#,
        )
        .bind(PayStatus::Paid)
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(PayStatus::Draft)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn update_draft_amounts(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        basic_amount: i64,
        gross_earnings: i64,
        total_deductions: i64,
        net_pay: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET basic_amount = ?,
                gross_earnings = ?,
                total_deductions = ?,
                net_pay = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND pay_status = ?
            "#,
        )
        .bind(basic_amount)
        .bind(gross_earnings)
        .bind(total_deductions)
        .bind(net_pay)
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(PayStatus::Draft)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Bump an enabled record's version without changing anything else.
    /// Applying a hike touches the source record so a reconciliation pass
    /// racing with it sees a version mismatch instead of promoting over the
    /// new state.
    pub async fn touch(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_records
            SET version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND active_status = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .bind(ActiveStatus::Enabled)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
