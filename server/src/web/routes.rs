// server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{checkout_handlers, health_handlers};

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .service(
        web::scope("/health")
          .route("", web::get().to(health_handlers::health_check_handler))
          .route("/redis", web::get().to(health_handlers::queue_health_handler)),
      )
      .service(
        web::scope("/checkouts")
          .route("", web::post().to(checkout_handlers::create_checkout_handler))
          .route("", web::get().to(checkout_handlers::list_checkouts_handler)),
      ),
  );
}
