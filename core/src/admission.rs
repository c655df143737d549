// core/src/admission.rs

//! Admission: validate a checkout request, confirm the product exists, and
//! enqueue a job. Never touches stock; whether the checkout succeeds is decided
//! later by fulfillment.

use std::sync::Arc;
use tracing::{event, instrument, Level};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{CheckoutJob, JobId, ProductId, UserId};
use crate::queue::JobQueue;
use crate::store::CheckoutStore;

#[derive(Clone)]
pub struct AdmissionService {
  store: Arc<dyn CheckoutStore>,
  queue: Arc<dyn JobQueue>,
}

impl AdmissionService {
  pub fn new(store: Arc<dyn CheckoutStore>, queue: Arc<dyn JobQueue>) -> Self {
    Self { store, queue }
  }

  /// Accepts a checkout for asynchronous processing and returns its job id.
  ///
  /// # Errors
  /// * `Validation` for malformed ids or a quantity that is not a positive
  ///   integer. Nothing is enqueued.
  /// * `ProductNotFound` if the product is unknown or soft-deleted.
  /// * `Infrastructure` if the store lookup or the enqueue fails.
  ///
  /// Stock is deliberately not checked; a job for a sold-out product is still
  /// accepted and rejected by fulfillment.
  #[instrument(name = "AdmissionService::enqueue_checkout", skip(self), err(Display))]
  pub async fn enqueue_checkout(&self, user_id: &str, product_id: &str, quantity: i64) -> CheckoutResult<JobId> {
    let user_id = UserId::parse(user_id)?;
    let product_id = ProductId::parse(product_id)?;
    let quantity = validate_quantity(quantity)?;

    if self.store.find_product(product_id).await?.is_none() {
      event!(Level::DEBUG, %product_id, "Rejecting checkout for missing product.");
      return Err(CheckoutError::ProductNotFound { product_id });
    }

    let job = CheckoutJob::new(user_id, product_id, quantity);
    self.queue.push(&job).await?;
    event!(Level::INFO, job_id = %job.job_id, %user_id, %product_id, quantity, "Checkout job enqueued.");
    Ok(job.job_id)
  }
}

fn validate_quantity(quantity: i64) -> CheckoutResult<u32> {
  if quantity <= 0 {
    return Err(CheckoutError::Validation(format!(
      "quantity must be greater than 0, got {}",
      quantity
    )));
  }
  // Stock columns are 32-bit; anything larger could never be fulfilled.
  u32::try_from(quantity)
    .ok()
    .filter(|q| *q <= i32::MAX as u32)
    .ok_or_else(|| CheckoutError::Validation(format!("quantity {} is too large", quantity)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quantity_must_be_positive_and_bounded() {
    assert_eq!(validate_quantity(1).unwrap(), 1);
    assert_eq!(validate_quantity(i32::MAX as i64).unwrap(), i32::MAX as u32);
    assert!(validate_quantity(0).is_err());
    assert!(validate_quantity(-4).is_err());
    assert!(validate_quantity(i32::MAX as i64 + 1).is_err());
  }
}
