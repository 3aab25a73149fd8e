use actix_web::web;

use crate::handlers::compensation;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/compensation")
            .route("", web::post().to(compensation::create_compensation))
            .route(
                "/employee/{employee_id}",
                web::get().to(compensation::get_current_compensation),
            )
            .route(
                "/employee/{employee_id}/history",
                web::get().to(compensation::get_history),
            )
            .route(
                "/employee/{employee_id}/pending-hike",
                web::get().to(compensation::get_pending_hike),
            )
            .route("/{id}/hike", web::post().to(compensation::apply_hike))
            .route("/{id}", web::put().to(compensation::update_compensation))
            .route("/{id}/mark-paid", web::post().to(compensation::mark_paid)),
    );
}
