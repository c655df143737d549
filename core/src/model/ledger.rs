// core/src/model/ledger.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{CheckoutJob, Discount, EntryId, ProductId, ProductSnapshot, UserId};
use crate::pricing;

/// One fulfilled, stock-backed sale. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub id: EntryId,
  pub user_id: UserId,
  pub product_id: ProductId,
  pub quantity: u32,
  pub unit_price: Decimal,
  pub discount: Discount,
  pub total: Decimal,
  pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
  /// Prices `job` at the snapshot's price and discount.
  pub fn for_job(job: &CheckoutJob, snapshot: &ProductSnapshot) -> Self {
    Self {
      id: EntryId::new(),
      user_id: job.user_id,
      product_id: job.product_id,
      quantity: job.quantity,
      unit_price: snapshot.unit_price,
      discount: snapshot.discount,
      total: pricing::line_total(snapshot.unit_price, snapshot.discount, job.quantity),
      created_at: Utc::now(),
    }
  }
}
