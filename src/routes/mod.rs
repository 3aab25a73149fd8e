use actix_web::web;

pub mod activity;
pub mod compensation;
pub mod reconciliation;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(compensation::configure)
            .configure(reconciliation::configure)
            .configure(activity::configure),
    );
}
