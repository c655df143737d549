// core/src/store/memory.rs

//! In-process store.
//!
//! Every product row tracks its committed quantity and the quantity reserved
//! by open transactions. The conditional decrement reserves under the row lock
//! (the in-memory equivalent of `UPDATE ... WHERE stock >= n`), commit turns the
//! reservation into a real decrement and publishes the ledger entries in the
//! same critical section, and dropping an uncommitted transaction releases it.
//! Readers only ever see committed state.
//!
//! Unlike a Postgres row lock, an open reservation does not make a rival wait:
//! the rival's decrement sees only the unreserved quantity and reports zero
//! rows straight away, even if the first transaction later rolls back. This can
//! under-fulfil a job that Postgres would have served. It never oversells.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{LedgerEntry, Product, ProductId, ProductSnapshot, UserId};
use crate::store::{CheckoutStore, StockTransaction};

#[derive(Debug)]
struct StockRow {
  product: Product,
  reserved: u32,
}

impl StockRow {
  fn unreserved(&self) -> u32 {
    self.product.available_quantity.saturating_sub(self.reserved)
  }
}

#[derive(Debug, Default)]
struct State {
  rows: HashMap<ProductId, StockRow>,
  ledger: Vec<LedgerEntry>,
}

/// Thread-safe in-memory [`CheckoutStore`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckoutStore {
  state: Arc<Mutex<State>>,
  unavailable: Arc<AtomicBool>,
}

impl MemoryCheckoutStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Simulates an outage: every operation fails with an infrastructure error
  /// until switched back.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Committed stock for a product, including soft-deleted ones.
  pub fn stock_of(&self, product_id: ProductId) -> Option<u32> {
    self.state.lock().rows.get(&product_id).map(|row| row.product.available_quantity)
  }

  /// Soft-deletes a product. Returns `false` if it does not exist.
  pub fn soft_delete(&self, product_id: ProductId) -> bool {
    match self.state.lock().rows.get_mut(&product_id) {
      Some(row) => {
        row.product.deleted_at = Some(chrono::Utc::now());
        true
      }
      None => false,
    }
  }

  /// Snapshot of the committed ledger in append order.
  pub fn ledger(&self) -> Vec<LedgerEntry> {
    self.state.lock().ledger.clone()
  }

  /// Sum of ledger quantities for one product.
  pub fn sold_quantity(&self, product_id: ProductId) -> u64 {
    self
      .state
      .lock()
      .ledger
      .iter()
      .filter(|e| e.product_id == product_id)
      .map(|e| u64::from(e.quantity))
      .sum()
  }

  fn ensure_available(&self) -> CheckoutResult<()> {
    ensure_available(&self.unavailable)
  }
}

fn ensure_available(flag: &AtomicBool) -> CheckoutResult<()> {
  if flag.load(Ordering::SeqCst) {
    return Err(CheckoutError::infrastructure(
      "stock store",
      anyhow::anyhow!("in-memory store marked unavailable"),
    ));
  }
  Ok(())
}

#[async_trait]
impl CheckoutStore for MemoryCheckoutStore {
  async fn find_product(&self, product_id: ProductId) -> CheckoutResult<Option<Product>> {
    self.ensure_available()?;
    let guard = self.state.lock();
    Ok(
      guard
        .rows
        .get(&product_id)
        .filter(|row| !row.product.is_deleted())
        .map(|row| row.product.clone()),
    )
  }

  async fn begin(&self) -> CheckoutResult<Box<dyn StockTransaction>> {
    self.ensure_available()?;
    Ok(Box::new(MemoryTransaction {
      state: Arc::clone(&self.state),
      unavailable: Arc::clone(&self.unavailable),
      reservations: Vec::new(),
      staged: Vec::new(),
      finished: false,
    }))
  }

  async fn entries_for_user(&self, user_id: UserId) -> CheckoutResult<Vec<LedgerEntry>> {
    self.ensure_available()?;
    let mut entries: Vec<LedgerEntry> = self
      .state
      .lock()
      .ledger
      .iter()
      .filter(|e| e.user_id == user_id)
      .cloned()
      .collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
  }

  async fn upsert_product(&self, product: &Product) -> CheckoutResult<()> {
    self.ensure_available()?;
    let mut guard = self.state.lock();
    match guard.rows.get_mut(&product.id) {
      Some(row) => row.product = product.clone(),
      None => {
        guard.rows.insert(
          product.id,
          StockRow {
            product: product.clone(),
            reserved: 0,
          },
        );
      }
    }
    Ok(())
  }

  async fn ping(&self) -> CheckoutResult<()> {
    self.ensure_available()
  }
}

struct MemoryTransaction {
  state: Arc<Mutex<State>>,
  unavailable: Arc<AtomicBool>,
  reservations: Vec<(ProductId, u32)>,
  staged: Vec<LedgerEntry>,
  finished: bool,
}

#[async_trait]
impl StockTransaction for MemoryTransaction {
  async fn load_product(&mut self, product_id: ProductId) -> CheckoutResult<Option<ProductSnapshot>> {
    ensure_available(&self.unavailable)?;
    let guard = self.state.lock();
    Ok(
      guard
        .rows
        .get(&product_id)
        .filter(|row| !row.product.is_deleted())
        .map(|row| row.product.snapshot()),
    )
  }

  async fn conditional_decrement(&mut self, product_id: ProductId, quantity: u32) -> CheckoutResult<u64> {
    ensure_available(&self.unavailable)?;
    let mut guard = self.state.lock();
    let row = match guard.rows.get_mut(&product_id) {
      Some(row) if !row.product.is_deleted() => row,
      _ => return Ok(0),
    };
    if row.unreserved() < quantity {
      return Ok(0);
    }
    row.reserved += quantity;
    self.reservations.push((product_id, quantity));
    Ok(1)
  }

  async fn append_entry(&mut self, entry: &LedgerEntry) -> CheckoutResult<()> {
    ensure_available(&self.unavailable)?;
    self.staged.push(entry.clone());
    Ok(())
  }

  async fn commit(self: Box<Self>) -> CheckoutResult<()> {
    let mut this = self;
    ensure_available(&this.unavailable)?;
    let state = Arc::clone(&this.state);
    let mut guard = state.lock();

    // Validate everything before mutating anything, so a failed commit leaves
    // no partial state behind (Drop then releases the reservations).
    for (product_id, quantity) in &this.reservations {
      let consistent = guard
        .rows
        .get(product_id)
        .map_or(false, |row| row.product.available_quantity >= *quantity && row.reserved >= *quantity);
      if !consistent {
        event!(Level::ERROR, %product_id, "Reserved stock vanished before commit.");
        return Err(CheckoutError::infrastructure(
          "stock store commit",
          anyhow::anyhow!("stock row {} changed underneath an open transaction", product_id),
        ));
      }
    }

    for (product_id, quantity) in this.reservations.drain(..) {
      if let Some(row) = guard.rows.get_mut(&product_id) {
        row.product.available_quantity -= quantity;
        row.reserved -= quantity;
      }
    }
    guard.ledger.append(&mut this.staged);
    this.finished = true;
    Ok(())
  }
}

impl Drop for MemoryTransaction {
  fn drop(&mut self) {
    if self.finished || self.reservations.is_empty() {
      return;
    }
    let mut guard = self.state.lock();
    for (product_id, quantity) in self.reservations.drain(..) {
      if let Some(row) = guard.rows.get_mut(&product_id) {
        row.reserved = row.reserved.saturating_sub(quantity);
      }
    }
    event!(Level::DEBUG, "Rolled back uncommitted in-memory transaction.");
  }
}
