// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset

use flash_sale::{
  AdmissionService, CheckoutStore, Discount, Fulfiller, JobQueue, MemoryCheckoutStore, MemoryJobQueue, Product, UserId,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn dec(raw: &str) -> Decimal {
  Decimal::from_str(raw).unwrap()
}

/// In-memory store and queue plus the services built on them.
pub struct Harness {
  pub store: MemoryCheckoutStore,
  pub queue: MemoryJobQueue,
  pub admission: AdmissionService,
  pub fulfiller: Fulfiller,
}

impl Harness {
  pub fn new() -> Self {
    let store = MemoryCheckoutStore::new();
    let queue = MemoryJobQueue::new();
    let store_dyn: Arc<dyn CheckoutStore> = Arc::new(store.clone());
    let queue_dyn: Arc<dyn JobQueue> = Arc::new(queue.clone());
    Self {
      admission: AdmissionService::new(Arc::clone(&store_dyn), queue_dyn),
      fulfiller: Fulfiller::new(store_dyn),
      store,
      queue,
    }
  }

  pub fn queue_handle(&self) -> Arc<dyn JobQueue> {
    Arc::new(self.queue.clone())
  }

  pub async fn seed(&self, price: &str, discount: &str, stock: u32) -> Product {
    let product = Product::new(
      "Flash Sale Item",
      dec(price),
      Discount::new(dec(discount)).unwrap(),
      stock,
      UserId::new(),
    );
    self.store.upsert_product(&product).await.unwrap();
    product
  }
}
