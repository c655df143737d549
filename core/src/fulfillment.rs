// core/src/fulfillment.rs

//! The fulfillment routine: one transaction that checks, decrements and
//! records a sale.
//!
//! The early quantity check on the loaded snapshot only saves work; it can be
//! stale by the time we write. What keeps stock from going negative is the
//! store's conditional decrement, which re-checks the quantity in the same
//! atomic write. A zero row count from it means another worker got there
//! first.

use std::sync::Arc;
use tracing::{event, instrument, Level};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{CheckoutJob, LedgerEntry};
use crate::store::CheckoutStore;

#[derive(Clone)]
pub struct Fulfiller {
  store: Arc<dyn CheckoutStore>,
}

impl Fulfiller {
  pub fn new(store: Arc<dyn CheckoutStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<dyn CheckoutStore> {
    &self.store
  }

  /// Runs one job to commit or rollback. Not retried on failure.
  ///
  /// Returns the committed ledger entry. Any error leaves stock and ledger
  /// untouched, since the transaction is dropped before commit. Jobs built in
  /// process skip `decode`, so a zero quantity is rejected here as well.
  #[instrument(
    name = "Fulfiller::fulfill",
    skip(self, job),
    fields(job_id = %job.job_id, product_id = %job.product_id, quantity = job.quantity),
    err(Display)
  )]
  pub async fn fulfill(&self, job: &CheckoutJob) -> CheckoutResult<LedgerEntry> {
    if job.quantity == 0 {
      return Err(CheckoutError::Validation(format!("job {} carries a zero quantity", job.job_id)));
    }
    let product_id = job.product_id;
    let mut tx = self.store.begin().await?;

    let snapshot = tx
      .load_product(product_id)
      .await?
      .ok_or(CheckoutError::ProductNotFound { product_id })?;

    if snapshot.available_quantity < job.quantity {
      event!(Level::DEBUG, available = snapshot.available_quantity, "Fast-path stock rejection.");
      return Err(CheckoutError::InsufficientStock {
        product_id,
        requested: job.quantity,
      });
    }

    let rows_affected = tx.conditional_decrement(product_id, job.quantity).await?;
    if rows_affected == 0 {
      event!(Level::DEBUG, "Conditional decrement matched no row; stock taken concurrently.");
      return Err(CheckoutError::InsufficientStock {
        product_id,
        requested: job.quantity,
      });
    }

    let entry = LedgerEntry::for_job(job, &snapshot);
    tx.append_entry(&entry).await?;
    tx.commit().await?;

    event!(Level::INFO, entry_id = %entry.id, total = %entry.total, "Checkout fulfilled.");
    Ok(entry)
  }
}
