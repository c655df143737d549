// core/src/model/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{JobId, ProductId, UserId};

/// A checkout intent travelling from admission to fulfillment.
///
/// Immutable once created. The serialized form is the flat record
/// `{job_id, user_id, product_id, quantity, enqueued_at}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutJob {
  pub job_id: JobId,
  pub user_id: UserId,
  pub product_id: ProductId,
  pub quantity: u32,
  pub enqueued_at: DateTime<Utc>,
}

impl CheckoutJob {
  /// Builds a job with a fresh identifier, stamped now.
  pub fn new(user_id: UserId, product_id: ProductId, quantity: u32) -> Self {
    Self {
      job_id: JobId::new(),
      user_id,
      product_id,
      quantity,
      enqueued_at: Utc::now(),
    }
  }

  pub fn encode(&self) -> CheckoutResult<Vec<u8>> {
    Ok(serde_json::to_vec(self)?)
  }

  pub fn decode(bytes: &[u8]) -> CheckoutResult<Self> {
    let job: CheckoutJob = serde_json::from_slice(bytes)?;
    if job.quantity == 0 {
      return Err(CheckoutError::Validation(format!(
        "job {} carries a non-positive quantity",
        job.job_id
      )));
    }
    Ok(job)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  #[test]
  fn wire_record_has_exactly_the_five_fields() {
    let job = CheckoutJob::new(UserId::new(), ProductId::new(), 2);
    let value: serde_json::Value = serde_json::from_slice(&job.encode().unwrap()).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["enqueued_at", "job_id", "product_id", "quantity", "user_id"]);
  }

  #[test]
  fn decode_preserves_all_fields() {
    let job = CheckoutJob::new(UserId::new(), ProductId::new(), 7);
    let back = CheckoutJob::decode(&job.encode().unwrap()).unwrap();
    assert_eq!(back, job);
  }

  #[test]
  fn decode_rejects_zero_quantity_and_garbage() {
    let raw = format!(
      r#"{{"job_id":"{}","user_id":"{}","product_id":"{}","quantity":0,"enqueued_at":"2024-01-01T00:00:00Z"}}"#,
      JobId::new(),
      UserId::new(),
      ProductId::new()
    );
    assert_eq!(CheckoutJob::decode(raw.as_bytes()).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(CheckoutJob::decode(b"{not json").unwrap_err().kind(), ErrorKind::Infrastructure);
  }
}
