use actix_web::web;

use crate::handlers::reconciliation;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reconciliation")
            .route("/run", web::post().to(reconciliation::run_reconciliation)),
    );
}
