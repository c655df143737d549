// server/src/web/handlers/health_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// Round-trips to the stock store.
pub async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match app_state.store.ping().await {
    Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
    Err(e) => {
      warn!(error = %e, "Store health check failed.");
      HttpResponse::ServiceUnavailable().json(json!({
        "status": "error",
        "message": "Failed to reach the database",
      }))
    }
  }
}

/// Round-trips to the job queue and reports its backlog.
pub async fn queue_health_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match app_state.queue.len().await {
    Ok(depth) => HttpResponse::Ok().json(json!({
      "status": "ok",
      "queue_key": app_state.config.queue_key,
      "queue_depth": depth,
    })),
    Err(e) => {
      warn!(error = %e, "Queue health check failed.");
      HttpResponse::ServiceUnavailable().json(json!({
        "status": "error",
        "message": "Failed to reach the job queue",
      }))
    }
  }
}
