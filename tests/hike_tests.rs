use pretty_assertions::assert_eq;
use uuid::Uuid;

use paylinkr_be::{AppError, Clock};
use paylinkr_be::database::models::{
    ActiveStatus, ApplyHikeInput, ComponentMode, CreateCompensationInput, PayComponentInput,
    PayStatus, UpdateCompensationInput,
};
use paylinkr_be::database::transaction::DatabaseTransaction;

mod common;

use common::{TestContext, ist_morning};

#[tokio::test]
async fn create_compensation_builds_base_line_and_totals() {
    let ctx = TestContext::new().await.unwrap();

    let detail = ctx.seed_employee(40_000).await.unwrap();
    let record = &detail.record;

    assert_eq!(record.basic_amount, 40_000);
    assert_eq!(record.active_status, ActiveStatus::Enabled);
    assert_eq!(record.pay_status, PayStatus::Draft);
    assert_eq!(record.period_month, "January");
    assert_eq!(record.period_year, 2024);
    assert_eq!(record.version, 0);
    assert!(!record.hike_applied);

    // Base line synthesized at position 0, HRA derived from basic.
    assert_eq!(detail.earnings[0].label, "Basic");
    assert_eq!(detail.earnings[0].amount, 40_000);
    assert_eq!(detail.earnings[1].amount, 16_000);
    assert_eq!(detail.earnings[2].amount, 1_600);
    assert_eq!(record.gross_earnings, 57_600);
    assert_eq!(record.total_deductions, 4_800 + 200);
    assert_eq!(record.net_pay, 57_600 - 5_000);

    // The stored row round-trips identically.
    let stored = ctx
        .records
        .find_enabled_for_employee(record.employee_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.gross_earnings, record.gross_earnings);
    assert_eq!(stored.net_pay, record.net_pay);
}

#[tokio::test]
async fn create_rejects_a_second_enabled_record() {
    let ctx = TestContext::new().await.unwrap();
    let employee_id = Uuid::new_v4();

    let input = CreateCompensationInput {
        employee_id,
        basic_amount: 30_000,
        earnings: vec![],
        deductions: vec![],
    };
    ctx.hike
        .create_compensation(input.clone(), None)
        .await
        .unwrap();

    let err = ctx
        .hike
        .create_compensation(input, None)
        .await
        .expect_err("second enabled record must be rejected");
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn apply_hike_creates_a_disabled_candidate_with_raised_amounts() {
    let ctx = TestContext::new().await.unwrap();
    let current = ctx.seed_employee(40_000).await.unwrap();
    let employee_id = current.record.employee_id;

    let application = ctx
        .hike
        .apply_hike(
            current.record.id,
            ApplyHikeInput {
                start_date: ist_morning(2024, 1, 6),
                hike_percent: 10.0,
            },
            None,
        )
        .await
        .unwrap();

    let new_record = &application.new_record.record;
    assert_eq!(new_record.basic_amount, 44_000);
    assert_eq!(new_record.hike_previous_basic, Some(40_000));
    assert_eq!(new_record.hike_percent, Some(10.0));
    assert_eq!(new_record.active_status, ActiveStatus::Disabled);
    assert_eq!(new_record.pay_status, PayStatus::Draft);
    assert!(new_record.hike_applied);
    assert_eq!(new_record.period_month, "January");
    assert_eq!(new_record.period_year, 2024);

    // Component lines copied and re-derived against the new basic.
    let lines = &application.new_record.earnings;
    assert_eq!(lines[0].amount, 44_000);
    assert_eq!(lines[1].amount, 17_600); // 40% of 44000
    assert_eq!(lines[2].amount, 1_600);
    assert_eq!(new_record.gross_earnings, 44_000 + 17_600 + 1_600);
    assert_eq!(new_record.total_deductions, 5_280 + 200);

    // The source record stays enabled and got its version bumped.
    assert_eq!(application.current_record.record.version, 1);
    let stored = ctx
        .records
        .find_enabled_for_employee(employee_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, current.record.id);
    assert_eq!(stored.version, 1);
    assert_eq!(stored.basic_amount, 40_000);

    // Future-dated hike shows up as pending.
    let pending = ctx
        .records
        .has_pending_hike(employee_id, ctx.clock.now())
        .await
        .unwrap();
    assert!(pending);
}

#[tokio::test]
async fn apply_hike_rejects_out_of_range_percent_without_mutating() {
    let ctx = TestContext::new().await.unwrap();
    let current = ctx.seed_employee(40_000).await.unwrap();

    for percent in [0.0, -3.0, 120.0] {
        let err = ctx
            .hike
            .apply_hike(
                current.record.id,
                ApplyHikeInput {
                    start_date: ist_morning(2024, 2, 1),
                    hike_percent: percent,
                },
                None,
            )
            .await
            .expect_err("percent outside (0, 100] must be rejected");
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }

    let history = ctx
        .records
        .history_for_employee(current.record.employee_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 0);
}

#[tokio::test]
async fn apply_hike_needs_an_enabled_record() {
    let ctx = TestContext::new().await.unwrap();
    let current = ctx.seed_employee(40_000).await.unwrap();

    let err = ctx
        .hike
        .apply_hike(
            Uuid::new_v4(),
            ApplyHikeInput {
                start_date: ist_morning(2024, 2, 1),
                hike_percent: 10.0,
            },
            None,
        )
        .await
        .expect_err("unknown record id");
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    // A disabled candidate is not a valid hike source either.
    let application = ctx
        .hike
        .apply_hike(
            current.record.id,
            ApplyHikeInput {
                start_date: ist_morning(2024, 2, 1),
                hike_percent: 10.0,
            },
            None,
        )
        .await
        .unwrap();
    let err = ctx
        .hike
        .apply_hike(
            application.new_record.record.id,
            ApplyHikeInput {
                start_date: ist_morning(2024, 3, 1),
                hike_percent: 5.0,
            },
            None,
        )
        .await
        .expect_err("candidate is disabled");
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn update_draft_recomputes_every_derived_amount() {
    let ctx = TestContext::new().await.unwrap();
    let employee_id = Uuid::new_v4();

    let detail = ctx
        .hike
        .create_compensation(
            CreateCompensationInput {
                employee_id,
                basic_amount: 50_000,
                earnings: vec![PayComponentInput {
                    label: "Special Allowance".to_string(),
                    amount: None,
                    percent_of_basic: Some(20.0),
                    mode: ComponentMode::Percent,
                }],
                deductions: vec![],
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(detail.record.gross_earnings, 50_000 + 10_000);

    let updated = ctx
        .hike
        .update_draft(
            detail.record.id,
            UpdateCompensationInput {
                basic_amount: Some(60_000),
                earnings: None,
                deductions: None,
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(updated.record.basic_amount, 60_000);
    assert_eq!(updated.earnings[0].amount, 60_000);
    assert_eq!(updated.earnings[1].amount, 12_000);
    assert_eq!(updated.record.gross_earnings, 72_000);
    assert_eq!(updated.record.net_pay, 72_000);
    assert_eq!(updated.record.version, 1);

    let (stored_earnings, _) = ctx.records.components_for(detail.record.id).await.unwrap();
    assert_eq!(stored_earnings[0].amount, 60_000);
    assert_eq!(stored_earnings[1].amount, 12_000);
}

#[tokio::test]
async fn paid_records_are_immutable() {
    let ctx = TestContext::new().await.unwrap();
    let current = ctx.seed_employee(40_000).await.unwrap();

    let paid = ctx.hike.mark_paid(current.record.id, None).await.unwrap();
    assert_eq!(paid.pay_status, PayStatus::Paid);
    assert_eq!(paid.version, 1);

    let err = ctx
        .hike
        .update_draft(
            current.record.id,
            UpdateCompensationInput {
                basic_amount: Some(45_000),
                earnings: None,
                deductions: None,
            },
            None,
        )
        .await
        .expect_err("paid record must not be editable");
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");

    let err = ctx
        .hike
        .mark_paid(current.record.id, None)
        .await
        .expect_err("already paid");
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn mark_paid_requires_an_enabled_record() {
    let ctx = TestContext::new().await.unwrap();
    let current = ctx.seed_employee(40_000).await.unwrap();

    let application = ctx
        .hike
        .apply_hike(
            current.record.id,
            ApplyHikeInput {
                start_date: ist_morning(2024, 2, 1),
                hike_percent: 10.0,
            },
            None,
        )
        .await
        .unwrap();

    let err = ctx
        .hike
        .mark_paid(application.new_record.record.id, None)
        .await
        .expect_err("disabled candidate cannot be paid");
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn stale_version_mutations_affect_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let detail = ctx.seed_employee(40_000).await.unwrap();
    let record_id = detail.record.id;

    // A successful edit moves the record to version 1 ...
    ctx.hike
        .update_draft(
            record_id,
            UpdateCompensationInput {
                basic_amount: Some(42_000),
                earnings: None,
                deductions: None,
            },
            None,
        )
        .await
        .unwrap();

    // ... so a write still carrying version 0 must hit zero rows and the
    // transaction as a whole must roll back.
    let records = ctx.records.clone();
    let now = ctx.clock.now();
    let err = DatabaseTransaction::run(ctx.records.pool(), move |tx| {
        Box::pin(async move {
            let updated = records
                .update_draft_amounts(tx, record_id, 0, 99_999, 99_999, 0, 99_999, now)
                .await?;
            if !updated {
                return Err(AppError::Conflict("stale version".to_string()));
            }
            Ok(())
        })
    })
    .await
    .expect_err("stale write must conflict");
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    let stored = ctx.records.find_by_id(record_id).await.unwrap().unwrap();
    assert_eq!(stored.basic_amount, 42_000);
    assert_eq!(stored.version, 1);
}
