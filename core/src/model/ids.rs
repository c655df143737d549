// core/src/model/ids.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CheckoutError;

macro_rules! uuid_id {
  ($(#[$meta:meta])* $name:ident, $label:literal) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(Uuid);

    impl $name {
      pub fn new() -> Self {
        Self(Uuid::new_v4())
      }

      pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
      }

      pub const fn into_uuid(self) -> Uuid {
        self.0
      }

      /// Parses a caller-supplied identifier. Malformed input is a validation error.
      pub fn parse(raw: &str) -> Result<Self, CheckoutError> {
        Uuid::parse_str(raw.trim())
          .map(Self)
          .map_err(|e| CheckoutError::Validation(format!("invalid {} '{}': {}", $label, raw, e)))
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
      }
    }

    impl From<Uuid> for $name {
      fn from(uuid: Uuid) -> Self {
        Self(uuid)
      }
    }
  };
}

uuid_id!(
  /// Identifies a product / stock row.
  ProductId,
  "product id"
);
uuid_id!(
  /// Identifies the buyer that requested a checkout.
  UserId,
  "user id"
);
uuid_id!(
  /// Unique per admission, not per retry.
  JobId,
  "job id"
);
uuid_id!(EntryId, "ledger entry id");
