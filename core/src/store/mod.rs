// core/src/store/mod.rs

//! The Stock Store and Checkout Ledger.
//!
//! Both live behind one transactional seam: a fulfillment opens a
//! [`StockTransaction`], and the stock decrement and the ledger append it makes
//! become visible together on commit, or not at all.
//!
//! Implementations:
//!  - [`MemoryCheckoutStore`] for tests and single-process runs.
//!  - `PgCheckoutStore` (feature `postgres`) backed by sqlx.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryCheckoutStore;
#[cfg(feature = "postgres")]
pub use postgres::PgCheckoutStore;

use async_trait::async_trait;

use crate::error::CheckoutResult;
use crate::model::{LedgerEntry, Product, ProductId, ProductSnapshot, UserId};

/// Persistent product stock plus the append-only checkout ledger.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
  /// Looks up a live (not soft-deleted) product outside any transaction.
  /// Used by admission as a cheap existence check.
  async fn find_product(&self, product_id: ProductId) -> CheckoutResult<Option<Product>>;

  /// Opens a transaction. Dropping it without calling `commit` rolls back.
  async fn begin(&self) -> CheckoutResult<Box<dyn StockTransaction>>;

  /// Ledger entries for one buyer, newest first.
  async fn entries_for_user(&self, user_id: UserId) -> CheckoutResult<Vec<LedgerEntry>>;

  /// Inserts or replaces a catalog row. Catalog management proper lives
  /// outside this crate; this exists for seeding and tests.
  async fn upsert_product(&self, product: &Product) -> CheckoutResult<()>;

  /// Round-trips to the backing store.
  async fn ping(&self) -> CheckoutResult<()>;
}

/// One atomic unit of fulfillment work.
#[async_trait]
pub trait StockTransaction: Send {
  /// Reads price, discount and quantity for pricing and the fast-path check.
  async fn load_product(&mut self, product_id: ProductId) -> CheckoutResult<Option<ProductSnapshot>>;

  /// Decrements stock by `quantity` only if at least `quantity` remains at the
  /// moment of the write. Returns the number of rows affected: 0 or 1.
  async fn conditional_decrement(&mut self, product_id: ProductId, quantity: u32) -> CheckoutResult<u64>;

  /// Stages a ledger entry in this transaction.
  async fn append_entry(&mut self, entry: &LedgerEntry) -> CheckoutResult<()>;

  async fn commit(self: Box<Self>) -> CheckoutResult<()>;
}
