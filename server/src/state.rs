// server/src/state.rs
use crate::config::AppConfig;
use flash_sale::{AdmissionService, CheckoutStore, JobQueue};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub admission: AdmissionService,
  pub store: Arc<dyn CheckoutStore>,
  pub queue: Arc<dyn JobQueue>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(store: Arc<dyn CheckoutStore>, queue: Arc<dyn JobQueue>, config: Arc<AppConfig>) -> Self {
    Self {
      admission: AdmissionService::new(Arc::clone(&store), Arc::clone(&queue)),
      store,
      queue,
      config,
    }
  }
}
