use std::sync::Arc;

use uuid::Uuid;

use crate::{
    database::{
        models::{
            ActiveStatus, ApplyHikeInput, CompensationDetail, CompensationRecord, ComponentKind,
            ComponentMode, CreateCompensationInput, HikeApplication, PayComponent,
            PayComponentInput, PayStatus, UpdateCompensationInput, recompute_amounts,
            round_percent_amount, sync_base_line,
        },
        repositories::CompensationRepository,
        transaction::DatabaseTransaction,
    },
    error::AppError,
    middleware::RequestInfo,
    services::{activity_logger, clock::Clock, clock::period_for},
};

pub const BASE_PAY_LABEL: &str = "Basic";

/// Lifecycle service for compensation records: onboarding creation, draft
/// edits, the hike application flow and the paid flip. Every mutation runs
/// in a single transaction with optimistic version checks.
#[derive(Clone)]
pub struct HikeService {
    records: CompensationRepository,
    clock: Arc<dyn Clock>,
}

impl HikeService {
    pub fn new(records: CompensationRepository, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Create the employee's first compensation record: immediately enabled,
    /// unpaid, no hike metadata. Fails with a conflict when the employee
    /// already has an enabled record.
    pub async fn create_compensation(
        &self,
        input: CreateCompensationInput,
        client: Option<&RequestInfo>,
    ) -> Result<CompensationDetail, AppError> {
        if input.basic_amount <= 0 {
            return Err(AppError::Validation(
                "basicAmount must be positive".to_string(),
            ));
        }
        validate_components(&input.earnings)?;
        validate_components(&input.deductions)?;

        if let Some(existing) = self
            .records
            .find_enabled_for_employee(input.employee_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "employee already has an enabled compensation record ({})",
                existing.id
            )));
        }

        let now = self.clock.now();
        let (period_month, period_year) = period_for(now);
        let record_id = Uuid::new_v4();

        let mut earnings = build_earnings(record_id, input.basic_amount, input.earnings);
        let mut deductions = build_components(record_id, ComponentKind::Deduction, input.deductions);
        let (gross_earnings, total_deductions, net_pay) =
            recompute_amounts(input.basic_amount, &mut earnings, &mut deductions);

        let record = CompensationRecord {
            id: record_id,
            employee_id: input.employee_id,
            period_month,
            period_year,
            basic_amount: input.basic_amount,
            gross_earnings,
            total_deductions,
            net_pay,
            pay_status: PayStatus::Draft,
            active_status: ActiveStatus::Enabled,
            hike_start_date: None,
            hike_percent: None,
            hike_previous_basic: None,
            hike_applied: false,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let records = self.records.clone();
        let client_info = client.cloned();
        {
            let record = record.clone();
            let earnings = earnings.clone();
            let deductions = deductions.clone();
            DatabaseTransaction::run(self.records.pool(), move |tx| {
                Box::pin(async move {
                    records.insert(tx, &record, &earnings, &deductions).await?;
                    activity_logger::compensation_created(
                        tx,
                        record.employee_id,
                        record.id,
                        record.basic_amount,
                        client_info.as_ref(),
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;
        }

        Ok(CompensationDetail {
            record,
            earnings,
            deductions,
        })
    }

    /// Apply a percentage hike to an enabled record.
    ///
    /// Creates a disabled, draft clone with the raised amounts and the hike
    /// metadata attached; the current record keeps paying until the
    /// reconciliation pass promotes the clone on or after its start day.
    pub async fn apply_hike(
        &self,
        record_id: Uuid,
        input: ApplyHikeInput,
        client: Option<&RequestInfo>,
    ) -> Result<HikeApplication, AppError> {
        if !(input.hike_percent > 0.0 && input.hike_percent <= 100.0) {
            return Err(AppError::Validation(
                "hikePercent must be greater than 0 and at most 100".to_string(),
            ));
        }

        let mut current = self
            .records
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| AppError::NotFound("compensation record not found".to_string()))?;
        if current.active_status != ActiveStatus::Enabled {
            return Err(AppError::NotFound(
                "no enabled compensation record with this id".to_string(),
            ));
        }

        let hike_amount = round_percent_amount(current.basic_amount, input.hike_percent);
        let new_basic = current.basic_amount + hike_amount;

        let (current_earnings, current_deductions) = self.records.components_for(current.id).await?;

        let new_id = Uuid::new_v4();
        let mut earnings = copy_components(&current_earnings, new_id);
        let mut deductions = copy_components(&current_deductions, new_id);
        match earnings.first_mut() {
            Some(base) => base.amount += hike_amount,
            None => earnings.push(PayComponent {
                id: Uuid::new_v4(),
                record_id: new_id,
                kind: ComponentKind::Earning,
                label: BASE_PAY_LABEL.to_string(),
                amount: new_basic,
                percent_of_basic: None,
                mode: ComponentMode::Fixed,
                position: 0,
            }),
        }
        let (gross_earnings, total_deductions, net_pay) =
            recompute_amounts(new_basic, &mut earnings, &mut deductions);

        let now = self.clock.now();
        // Provisional period; the reconciliation pass recomputes it at
        // promotion time from the same start date.
        let (period_month, period_year) = period_for(input.start_date);

        let new_record = CompensationRecord {
            id: new_id,
            employee_id: current.employee_id,
            period_month,
            period_year,
            basic_amount: new_basic,
            gross_earnings,
            total_deductions,
            net_pay,
            pay_status: PayStatus::Draft,
            active_status: ActiveStatus::Disabled,
            hike_start_date: Some(input.start_date),
            hike_percent: Some(input.hike_percent),
            hike_previous_basic: Some(current.basic_amount),
            hike_applied: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let records = self.records.clone();
        let client_info = client.cloned();
        {
            let new_record = new_record.clone();
            let earnings = earnings.clone();
            let deductions = deductions.clone();
            let current_id = current.id;
            let current_version = current.version;
            let hike_percent = input.hike_percent;
            let start_date = input.start_date;
            DatabaseTransaction::run(self.records.pool(), move |tx| {
                Box::pin(async move {
                    records
                        .insert(tx, &new_record, &earnings, &deductions)
                        .await?;

                    // Bump the source record's version so a reconciliation
                    // pass racing with this call loses its version check
                    // instead of promoting over a stale base.
                    let touched = records.touch(tx, current_id, current_version, now).await?;
                    if !touched {
                        return Err(AppError::Conflict(
                            "compensation record was modified concurrently".to_string(),
                        ));
                    }

                    activity_logger::hike_applied(
                        tx,
                        new_record.employee_id,
                        current_id,
                        new_record.id,
                        hike_percent,
                        start_date,
                        client_info.as_ref(),
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;
        }

        current.version += 1;
        current.updated_at = now;

        Ok(HikeApplication {
            current_record: CompensationDetail {
                record: current,
                earnings: current_earnings,
                deductions: current_deductions,
            },
            new_record: CompensationDetail {
                record: new_record,
                earnings,
                deductions,
            },
        })
    }

    /// Administrative edit of a draft record: new basic amount and/or a
    /// replacement component list. Derived amounts are recomputed; paid
    /// records are immutable.
    pub async fn update_draft(
        &self,
        record_id: Uuid,
        input: UpdateCompensationInput,
        client: Option<&RequestInfo>,
    ) -> Result<CompensationDetail, AppError> {
        let mut record = self
            .records
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| AppError::NotFound("compensation record not found".to_string()))?;
        if record.pay_status == PayStatus::Paid {
            return Err(AppError::Validation(
                "paid compensation records cannot be edited".to_string(),
            ));
        }

        let new_basic = input.basic_amount.unwrap_or(record.basic_amount);
        if new_basic <= 0 {
            return Err(AppError::Validation(
                "basicAmount must be positive".to_string(),
            ));
        }

        let (mut earnings, mut deductions) = match (input.earnings, input.deductions) {
            (None, None) => self.records.components_for(record.id).await?,
            (earnings, deductions) => {
                let existing = self.records.components_for(record.id).await?;
                let earnings = match earnings {
                    Some(lines) => {
                        validate_components(&lines)?;
                        build_earnings(record.id, new_basic, lines)
                    }
                    None => existing.0,
                };
                let deductions = match deductions {
                    Some(lines) => {
                        validate_components(&lines)?;
                        build_components(record.id, ComponentKind::Deduction, lines)
                    }
                    None => existing.1,
                };
                (earnings, deductions)
            }
        };

        sync_base_line(new_basic, &mut earnings);
        let (gross_earnings, total_deductions, net_pay) =
            recompute_amounts(new_basic, &mut earnings, &mut deductions);

        let now = self.clock.now();
        let records = self.records.clone();
        let client_info = client.cloned();
        {
            let earnings = earnings.clone();
            let deductions = deductions.clone();
            let record_id = record.id;
            let employee_id = record.employee_id;
            let expected_version = record.version;
            DatabaseTransaction::run(self.records.pool(), move |tx| {
                Box::pin(async move {
                    let updated = records
                        .update_draft_amounts(
                            tx,
                            record_id,
                            expected_version,
                            new_basic,
                            gross_earnings,
                            total_deductions,
                            net_pay,
                            now,
                        )
                        .await?;
                    if !updated {
                        return Err(AppError::Conflict(
                            "compensation record was modified concurrently".to_string(),
                        ));
                    }

                    // Component amounts are caches; simplest correct update
                    // is a full rewrite of the lines.
                    records.delete_components(tx, record_id).await?;
                    records.insert_components(tx, &earnings).await?;
                    records.insert_components(tx, &deductions).await?;

                    activity_logger::compensation_updated(
                        tx,
                        employee_id,
                        record_id,
                        new_basic,
                        client_info.as_ref(),
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;
        }

        record.basic_amount = new_basic;
        record.gross_earnings = gross_earnings;
        record.total_deductions = total_deductions;
        record.net_pay = net_pay;
        record.version += 1;
        record.updated_at = now;

        Ok(CompensationDetail {
            record,
            earnings,
            deductions,
        })
    }

    /// Flip an enabled record from draft to paid. Reconciliation never
    /// touches pay status; this is the statement-issuance side's call.
    pub async fn mark_paid(
        &self,
        record_id: Uuid,
        client: Option<&RequestInfo>,
    ) -> Result<CompensationRecord, AppError> {
        let mut record = self
            .records
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| AppError::NotFound("compensation record not found".to_string()))?;
        if record.active_status != ActiveStatus::Enabled {
            return Err(AppError::NotFound(
                "no enabled compensation record with this id".to_string(),
            ));
        }
        if record.pay_status == PayStatus::Paid {
            return Err(AppError::Validation(
                "compensation record is already paid".to_string(),
            ));
        }

        let now = self.clock.now();
        let records = self.records.clone();
        let client_info = client.cloned();
        {
            let record_id = record.id;
            let employee_id = record.employee_id;
            let expected_version = record.version;
            DatabaseTransaction::run(self.records.pool(), move |tx| {
                Box::pin(async move {
                    let updated = records.mark_paid(tx, record_id, expected_version, now).await?;
                    if !updated {
                        return Err(AppError::Conflict(
                            "compensation record was modified concurrently".to_string(),
                        ));
                    }

                    activity_logger::compensation_paid(
                        tx,
                        employee_id,
                        record_id,
                        client_info.as_ref(),
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;
        }

        record.pay_status = PayStatus::Paid;
        record.version += 1;
        record.updated_at = now;
        Ok(record)
    }
}

fn validate_components(lines: &[PayComponentInput]) -> Result<(), AppError> {
    for line in lines {
        if line.label.trim().is_empty() {
            return Err(AppError::Validation(
                "component label must not be empty".to_string(),
            ));
        }
        match line.mode {
            ComponentMode::Percent => {
                let percent = line.percent_of_basic.ok_or_else(|| {
                    AppError::Validation(
                        "percentOfBasic is required for percent-mode components".to_string(),
                    )
                })?;
                if !(percent > 0.0 && percent <= 100.0) {
                    return Err(AppError::Validation(
                        "percentOfBasic must be greater than 0 and at most 100".to_string(),
                    ));
                }
            }
            ComponentMode::Fixed => {
                if line.amount.unwrap_or(0) < 0 {
                    return Err(AppError::Validation(
                        "component amount must not be negative".to_string(),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Earnings list with the base-pay line synthesized at position 0;
/// caller-provided lines follow it.
fn build_earnings(
    record_id: Uuid,
    basic_amount: i64,
    lines: Vec<PayComponentInput>,
) -> Vec<PayComponent> {
    let mut earnings = vec![PayComponent {
        id: Uuid::new_v4(),
        record_id,
        kind: ComponentKind::Earning,
        label: BASE_PAY_LABEL.to_string(),
        amount: basic_amount,
        percent_of_basic: None,
        mode: ComponentMode::Fixed,
        position: 0,
    }];
    earnings.extend(
        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| line.into_component(record_id, ComponentKind::Earning, i as i32 + 1)),
    );
    earnings
}

fn build_components(
    record_id: Uuid,
    kind: ComponentKind,
    lines: Vec<PayComponentInput>,
) -> Vec<PayComponent> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| line.into_component(record_id, kind, i as i32))
        .collect()
}

fn copy_components(lines: &[PayComponent], record_id: Uuid) -> Vec<PayComponent> {
    lines
        .iter()
        .map(|line| PayComponent {
            id: Uuid::new_v4(),
            record_id,
            ..line.clone()
        })
        .collect()
}
