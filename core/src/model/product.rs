// core/src/model/product.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::model::{ProductId, UserId};

/// A discount percentage, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
  pub const NONE: Discount = Discount(Decimal::ZERO);

  pub fn new(percent: Decimal) -> Result<Self, CheckoutError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
      return Err(CheckoutError::Validation(format!(
        "discount must be between 0 and 100, got {}",
        percent
      )));
    }
    Ok(Self(percent))
  }

  pub fn percent(self) -> Decimal {
    self.0
  }
}

impl TryFrom<Decimal> for Discount {
  type Error = CheckoutError;

  fn try_from(value: Decimal) -> Result<Self, Self::Error> {
    Discount::new(value)
  }
}

impl From<Discount> for Decimal {
  fn from(discount: Discount) -> Self {
    discount.0
  }
}

/// A product / stock record.
///
/// `available_quantity` is unsigned, so a negative stock level cannot even be
/// represented; the conditional decrement is what keeps it from underflowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub unit_price: Decimal,
  pub discount: Discount,
  pub available_quantity: u32,
  pub owner: UserId,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
  pub fn new(name: impl Into<String>, unit_price: Decimal, discount: Discount, available_quantity: u32, owner: UserId) -> Self {
    Self {
      id: ProductId::new(),
      name: name.into(),
      unit_price,
      discount,
      available_quantity,
      owner,
      deleted_at: None,
    }
  }

  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }

  pub fn snapshot(&self) -> ProductSnapshot {
    ProductSnapshot {
      product_id: self.id,
      unit_price: self.unit_price,
      discount: self.discount,
      available_quantity: self.available_quantity,
    }
  }
}

/// Price, discount and quantity as read at the start of a fulfillment.
///
/// The quantity here can be stale by the time the decrement runs; the price and
/// discount are what the ledger entry is billed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSnapshot {
  pub product_id: ProductId,
  pub unit_price: Decimal,
  pub discount: Discount,
  pub available_quantity: u32,
}
