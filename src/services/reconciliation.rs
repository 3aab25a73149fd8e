use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::{
        models::{CompensationRecord, PayStatus},
        repositories::CompensationRepository,
        transaction::DatabaseTransaction,
    },
    error::AppError,
    services::{
        activity_logger,
        clock::{Clock, ist_day, period_for},
    },
};

/// Counts for one reconciliation pass: `activated` promotions and
/// `disabled` superseded candidates knocked out of the pending pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub activated: u32,
    pub disabled: u32,
}

/// Everything the pass intends to do for one employee. Versions are the
/// ones observed while planning; the transaction re-checks each of them.
#[derive(Debug, Clone, PartialEq)]
struct PromotionPlan {
    employee_id: Uuid,
    winner_id: Uuid,
    winner_version: i64,
    period_month: String,
    period_year: i32,
    cancel: Option<(Uuid, i64)>,
    retire: Vec<(Uuid, i64)>,
}

#[derive(Debug)]
enum EmployeePlan {
    Promote(PromotionPlan),
    /// The enabled record is already paid; promotion waits for the
    /// issuance side to roll the period over.
    DeferPaid { employee_id: Uuid, winner_id: Uuid },
    Skip,
}

/// Periodic promotion pass. Scans pending hike candidates, picks one winner
/// per employee whose start day (IST) has arrived, and applies every
/// resulting transition in a single transaction.
#[derive(Clone)]
pub struct ReconciliationService {
    records: CompensationRepository,
    clock: Arc<dyn Clock>,
}

impl ReconciliationService {
    pub fn new(records: CompensationRepository, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Run one pass. Safe to call repeatedly; a second run on the same day
    /// against unchanged data is a no-op.
    pub async fn run_reconciliation(&self) -> Result<ReconciliationOutcome, AppError> {
        let today = ist_day(self.clock.now());

        let candidates = self.records.find_pending_candidates().await?;
        if candidates.is_empty() {
            return Ok(ReconciliationOutcome::default());
        }

        let mut by_employee: BTreeMap<Uuid, Vec<CompensationRecord>> = BTreeMap::new();
        for candidate in candidates {
            by_employee
                .entry(candidate.employee_id)
                .or_default()
                .push(candidate);
        }

        let mut plans = Vec::new();
        for (employee_id, group) in by_employee {
            let enabled = self.records.find_enabled_for_employee(employee_id).await?;
            match plan_for_employee(today, enabled.as_ref(), group) {
                EmployeePlan::Promote(plan) => plans.push(plan),
                EmployeePlan::DeferPaid {
                    employee_id,
                    winner_id,
                } => {
                    log::warn!(
                        "Deferring hike promotion for employee {}: enabled record is already paid (candidate {})",
                        employee_id,
                        winner_id
                    );
                }
                EmployeePlan::Skip => {}
            }
        }

        if plans.is_empty() {
            return Ok(ReconciliationOutcome::default());
        }

        let outcome = ReconciliationOutcome {
            activated: plans.len() as u32,
            disabled: plans.iter().map(|p| p.retire.len() as u32).sum(),
        };

        let records = self.records.clone();
        let now = self.clock.now();
        DatabaseTransaction::run(self.records.pool(), move |tx| {
            Box::pin(async move {
                for plan in &plans {
                    // Cancellation must precede promotion or the
                    // one-enabled-per-employee index rejects the new row.
                    let cancelled_id = match plan.cancel {
                        Some((id, version)) => {
                            if !records.cancel(tx, id, version, now).await? {
                                return Err(stale(plan.employee_id, id));
                            }
                            Some(id)
                        }
                        None => None,
                    };

                    if !records
                        .promote(
                            tx,
                            plan.winner_id,
                            plan.winner_version,
                            &plan.period_month,
                            plan.period_year,
                            now,
                        )
                        .await?
                    {
                        return Err(stale(plan.employee_id, plan.winner_id));
                    }

                    activity_logger::hike_promoted(
                        tx,
                        plan.employee_id,
                        plan.winner_id,
                        cancelled_id,
                        &plan.period_month,
                        plan.period_year,
                    )
                    .await?;

                    for &(id, version) in &plan.retire {
                        if !records.retire_candidate(tx, id, version, now).await? {
                            return Err(stale(plan.employee_id, id));
                        }
                        activity_logger::hike_retired(tx, plan.employee_id, id, plan.winner_id)
                            .await?;
                    }
                }
                Ok(())
            })
        })
        .await?;

        Ok(outcome)
    }
}

fn stale(employee_id: Uuid, record_id: Uuid) -> AppError {
    AppError::Conflict(format!(
        "record {record_id} for employee {employee_id} changed during reconciliation"
    ))
}

/// Decide what this pass does for one employee, given their pending
/// candidates and current enabled record. Pure; all time handling happens
/// through the caller-supplied `today`.
fn plan_for_employee(
    today: NaiveDate,
    enabled: Option<&CompensationRecord>,
    mut candidates: Vec<CompensationRecord>,
) -> EmployeePlan {
    // Latest start date first; created_at then id break exact ties so two
    // hikes scheduled for the same day resolve deterministically.
    candidates.sort_by(|a, b| {
        (b.hike_start_date, b.created_at, b.id).cmp(&(a.hike_start_date, a.created_at, a.id))
    });

    let mut eligible = candidates.iter().filter(|candidate| {
        candidate
            .hike_start_date
            .is_some_and(|start| ist_day(start) <= today)
    });

    let Some(winner) = eligible.next() else {
        return EmployeePlan::Skip;
    };
    let employee_id = winner.employee_id;

    if let Some(current) = enabled {
        if current.pay_status == PayStatus::Paid {
            return EmployeePlan::DeferPaid {
                employee_id,
                winner_id: winner.id,
            };
        }
    }

    // Start date is present on every eligible candidate by construction.
    let start = winner.hike_start_date.unwrap_or(winner.created_at);
    let (period_month, period_year) = period_for(start);

    EmployeePlan::Promote(PromotionPlan {
        employee_id,
        winner_id: winner.id,
        winner_version: winner.version,
        period_month,
        period_year,
        cancel: enabled.map(|current| (current.id, current.version)),
        retire: eligible.map(|loser| (loser.id, loser.version)).collect(),
    })
}
