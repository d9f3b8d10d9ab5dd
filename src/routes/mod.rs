// Route exports
pub mod feedback;
pub mod tenders;

use actix_web::web;

pub use tenders::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(tenders::configure)
            .configure(feedback::configure),
    );
}
