// server/src/main.rs

mod config;
mod errors;
mod seed;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::errors::Result as AppResult;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use flash_sale::{CheckoutStore, Fulfiller, JobQueue, PgCheckoutStore, RedisJobQueue, WorkerPool};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy(); // RUST_LOG override
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn connect_database(config: &AppConfig) -> AppResult<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .connect(&config.database_url)
    .await?;
  tracing::info!("Successfully connected to the database.");
  Ok(pool)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env()?);
  init_tracing(app_config.log_format);
  tracing::info!("Starting flash sale checkout server...");

  // Stock store + ledger
  let pg_store = PgCheckoutStore::new(connect_database(&app_config).await?);
  if app_config.run_migrations {
    pg_store.migrate().await?;
  }
  let store: Arc<dyn CheckoutStore> = Arc::new(pg_store);
  if app_config.seed_db {
    seed::seed_products(store.as_ref()).await?;
  }

  // Job queue
  let redis_queue = RedisJobQueue::connect_with_key(&app_config.redis_url, app_config.queue_key.clone()).await?;
  redis_queue.ping().await?;
  let queue: Arc<dyn JobQueue> = Arc::new(redis_queue);

  let workers = WorkerPool::spawn(
    app_config.worker_pool(),
    Arc::clone(&queue),
    Fulfiller::new(Arc::clone(&store)),
  );

  let app_state = AppState::new(store, queue, Arc::clone(&app_config));
  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  let server_result = match HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  {
    Ok(server) => server.run().await,
    Err(e) => Err(e),
  };

  // Workers finish the job in hand before exiting.
  tracing::info!("HTTP server stopped; draining checkout workers.");
  let stats = workers.shutdown().await;
  tracing::info!(
    fulfilled = stats.fulfilled,
    out_of_stock = stats.out_of_stock,
    not_found = stats.not_found,
    failed = stats.failed,
    "Checkout workers stopped."
  );

  server_result?;
  Ok(())
}
