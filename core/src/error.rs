// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::ProductId;

/// The closed set of failure categories a checkout can end in.
///
/// Callers branch on this, never on the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// Malformed request; rejected before touching the queue.
  Validation,
  /// The product does not exist or is soft-deleted.
  NotFound,
  /// Not enough stock left at decision time.
  InsufficientStock,
  /// Store or queue unavailable, undecodable payload, etc.
  Infrastructure,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Product not found: {product_id}")]
  ProductNotFound { product_id: ProductId },

  #[error("Insufficient stock for product {product_id} (requested {requested})")]
  InsufficientStock { product_id: ProductId, requested: u32 },

  #[error("Infrastructure failure during {context}. Source: {source}")]
  Infrastructure {
    context: &'static str,
    #[source]
    source: AnyhowError,
  },
}

impl CheckoutError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      CheckoutError::Validation(_) => ErrorKind::Validation,
      CheckoutError::ProductNotFound { .. } => ErrorKind::NotFound,
      CheckoutError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
      CheckoutError::Infrastructure { .. } => ErrorKind::Infrastructure,
    }
  }

  /// Business rejections are expected outcomes of fulfillment, not system failures.
  pub fn is_business_rejection(&self) -> bool {
    matches!(self.kind(), ErrorKind::NotFound | ErrorKind::InsufficientStock)
  }

  pub fn infrastructure(context: &'static str, source: impl Into<AnyhowError>) -> Self {
    CheckoutError::Infrastructure {
      context,
      source: source.into(),
    }
  }
}

impl From<AnyhowError> for CheckoutError {
  fn from(err: AnyhowError) -> Self {
    // An anyhow chain may already carry a CheckoutError; keep its kind intact
    // instead of burying it under Infrastructure.
    match err.downcast::<CheckoutError>() {
      Ok(inner) => inner,
      Err(err) => CheckoutError::Infrastructure {
        context: "external operation",
        source: err,
      },
    }
  }
}

impl From<serde_json::Error> for CheckoutError {
  fn from(err: serde_json::Error) -> Self {
    CheckoutError::infrastructure("job payload codec", err)
  }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for CheckoutError {
  fn from(err: sqlx::Error) -> Self {
    CheckoutError::infrastructure("stock store", err)
  }
}

#[cfg(feature = "postgres")]
impl From<sqlx::migrate::MigrateError> for CheckoutError {
  fn from(err: sqlx::migrate::MigrateError) -> Self {
    CheckoutError::infrastructure("schema migration", err)
  }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CheckoutError {
  fn from(err: redis::RedisError) -> Self {
    CheckoutError::infrastructure("job queue", err)
  }
}

pub type CheckoutResult<T, E = CheckoutError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_are_closed_and_stable() {
    let pid = ProductId::new();
    assert_eq!(CheckoutError::Validation("x".into()).kind(), ErrorKind::Validation);
    assert_eq!(CheckoutError::ProductNotFound { product_id: pid }.kind(), ErrorKind::NotFound);
    assert_eq!(
      CheckoutError::InsufficientStock { product_id: pid, requested: 3 }.kind(),
      ErrorKind::InsufficientStock
    );
    assert_eq!(
      CheckoutError::infrastructure("test", anyhow::anyhow!("down")).kind(),
      ErrorKind::Infrastructure
    );
  }

  #[test]
  fn anyhow_wrapping_preserves_checkout_kind() {
    let pid = ProductId::new();
    let wrapped = AnyhowError::new(CheckoutError::ProductNotFound { product_id: pid });
    let back = CheckoutError::from(wrapped);
    assert_eq!(back.kind(), ErrorKind::NotFound);

    let opaque = CheckoutError::from(anyhow::anyhow!("connection refused"));
    assert_eq!(opaque.kind(), ErrorKind::Infrastructure);
    assert!(!opaque.is_business_rejection());
  }
}
