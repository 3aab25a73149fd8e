use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use paylinkr_be::database::{init_database, repositories::CompensationRepository};
use paylinkr_be::middleware::{RequestIdMiddleware, RequestInfoMiddleware};
use paylinkr_be::services::{Clock, SystemClock, scheduler::spawn_reconciliation_loop};
use paylinkr_be::{AppState, Config, HikeService, ReconciliationService, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("PayLinkr API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    println!("🚀 Starting PayLinkr API server...");

    // Load configuration
    let config = Config::from_env()?;
    println!(
        "📋 Configuration loaded (environment: {})",
        config.environment
    );

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    println!("✅ Database initialized");

    // Initialize repositories and services
    let records = CompensationRepository::new(pool.clone());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let hike_service = HikeService::new(records.clone(), clock.clone());
    let reconciliation_service = ReconciliationService::new(records.clone(), clock.clone());

    // Periodic hike promotion; first pass runs right away
    spawn_reconciliation_loop(
        reconciliation_service.clone(),
        Duration::from_secs(config.reconcile_interval_secs),
    );

    let app_state = web::Data::new(AppState {
        records,
        hike_service,
        reconciliation_service,
        clock,
    });
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    println!("🌐 Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(RequestInfoMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
