use std::sync::Arc;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use database::repositories::CompensationRepository;
pub use error::AppError;
pub use services::{Clock, HikeService, ReconciliationService, SystemClock};

pub struct AppState {
    pub records: CompensationRepository,
    pub hike_service: HikeService,
    pub reconciliation_service: ReconciliationService,
    pub clock: Arc<dyn Clock>,
}
