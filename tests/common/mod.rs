use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use paylinkr_be::database::init_database;
use paylinkr_be::database::models::{
    CompensationDetail, ComponentMode, CreateCompensationInput, PayComponentInput,
};
use paylinkr_be::database::repositories::CompensationRepository;
use paylinkr_be::services::{FixedClock, HikeService, ReconciliationService};

// Test database wrapper
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        Ok(TestDb {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

// Everything a scenario needs: isolated database, pinned clock, services.
pub struct TestContext {
    pub db: TestDb,
    pub records: CompensationRepository,
    pub clock: Arc<FixedClock>,
    pub hike: HikeService,
    pub reconciliation: ReconciliationService,
}

impl TestContext {
    /// Context with the clock pinned to 2024-01-05 06:00 UTC (11:30 IST).
    pub async fn new() -> Result<Self> {
        Self::at(utc(2024, 1, 5, 6, 0)).await
    }

    pub async fn at(now: DateTime<Utc>) -> Result<Self> {
        let db = TestDb::new().await?;
        let records = CompensationRepository::new(db.pool.clone());
        let clock = Arc::new(FixedClock::new(now));
        let hike = HikeService::new(records.clone(), clock.clone());
        let reconciliation = ReconciliationService::new(records.clone(), clock.clone());

        Ok(TestContext {
            db,
            records,
            clock,
            hike,
            reconciliation,
        })
    }

    /// Seed one employee with a realistic component mix and return the
    /// enabled record.
    pub async fn seed_employee(&self, basic_amount: i64) -> Result<CompensationDetail> {
        let input = CreateCompensationInput {
            employee_id: Uuid::new_v4(),
            basic_amount,
            earnings: vec![
                PayComponentInput {
                    label: "House Rent Allowance".to_string(),
                    amount: None,
                    percent_of_basic: Some(40.0),
                    mode: ComponentMode::Percent,
                },
                PayComponentInput {
                    label: "Conveyance".to_string(),
                    amount: Some(1_600),
                    percent_of_basic: None,
                    mode: ComponentMode::Fixed,
                },
            ],
            deductions: vec![
                PayComponentInput {
                    label: "Provident Fund".to_string(),
                    amount: None,
                    percent_of_basic: Some(12.0),
                    mode: ComponentMode::Percent,
                },
                PayComponentInput {
                    label: "Professional Tax".to_string(),
                    amount: Some(200),
                    percent_of_basic: None,
                    mode: ComponentMode::Fixed,
                },
            ],
        };

        let detail = self.hike.create_compensation(input, None).await?;
        Ok(detail)
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// An instant that falls on the given IST calendar day (11:30 IST).
pub fn ist_morning(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    utc(y, m, d, 6, 0)
}
