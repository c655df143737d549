// core/src/store/postgres.rs

//! PostgreSQL implementation of the stock store and ledger.
//!
//! The race-safety of fulfillment rests entirely on [`CONDITIONAL_DECREMENT_SQL`]:
//! the quantity check and the write are one statement, so concurrent workers
//! (in this process or any other) can never take the stock below zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{event, instrument, Level};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{Discount, EntryId, LedgerEntry, Product, ProductId, ProductSnapshot, UserId};
use crate::store::{CheckoutStore, StockTransaction};

pub const FIND_PRODUCT_SQL: &str = "SELECT id, name, price, discount, stock, created_by, deleted_at \
   FROM products WHERE id = $1 AND deleted_at IS NULL";

pub const CONDITIONAL_DECREMENT_SQL: &str = "UPDATE products SET stock = stock - $2, updated_at = now() \
   WHERE id = $1 AND stock >= $2 AND deleted_at IS NULL";

pub const INSERT_CHECKOUT_SQL: &str = "INSERT INTO checkouts \
   (id, user_id, product_id, quantity, price, discount, total_price, created_at, updated_at) \
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)";

pub const LIST_USER_CHECKOUTS_SQL: &str = "SELECT id, user_id, product_id, quantity, price, discount, total_price, created_at \
   FROM checkouts WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC";

pub const UPSERT_PRODUCT_SQL: &str = "INSERT INTO products (id, name, price, discount, stock, created_by, deleted_at) \
   VALUES ($1, $2, $3, $4, $5, $6, $7) \
   ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, price = EXCLUDED.price, discount = EXCLUDED.discount, \
   stock = EXCLUDED.stock, deleted_at = EXCLUDED.deleted_at, updated_at = now()";

#[derive(Debug, FromRow)]
struct ProductRow {
  id: Uuid,
  name: String,
  price: Decimal,
  discount: Decimal,
  stock: i32,
  created_by: Uuid,
  deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
  type Error = CheckoutError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    let available_quantity = u32::try_from(row.stock).map_err(|e| {
      CheckoutError::infrastructure("decoding products.stock", anyhow::anyhow!("negative stock {}: {}", row.stock, e))
    })?;
    let discount = Discount::new(row.discount)
      .map_err(|e| CheckoutError::infrastructure("decoding products.discount", anyhow::Error::new(e)))?;
    Ok(Product {
      id: ProductId::from_uuid(row.id),
      name: row.name,
      unit_price: row.price,
      discount,
      available_quantity,
      owner: UserId::from_uuid(row.created_by),
      deleted_at: row.deleted_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct CheckoutRow {
  id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  price: Decimal,
  discount: Decimal,
  total_price: Decimal,
  created_at: DateTime<Utc>,
}

impl TryFrom<CheckoutRow> for LedgerEntry {
  type Error = CheckoutError;

  fn try_from(row: CheckoutRow) -> Result<Self, Self::Error> {
    let quantity = u32::try_from(row.quantity)
      .map_err(|e| CheckoutError::infrastructure("decoding checkouts.quantity", anyhow::Error::new(e)))?;
    let discount = Discount::new(row.discount)
      .map_err(|e| CheckoutError::infrastructure("decoding checkouts.discount", anyhow::Error::new(e)))?;
    Ok(LedgerEntry {
      id: EntryId::from_uuid(row.id),
      user_id: UserId::from_uuid(row.user_id),
      product_id: ProductId::from_uuid(row.product_id),
      quantity,
      unit_price: row.price,
      discount,
      total: row.total_price,
      created_at: row.created_at,
    })
  }
}

fn to_db_quantity(quantity: u32) -> CheckoutResult<i32> {
  i32::try_from(quantity).map_err(|_| CheckoutError::Validation(format!("quantity {} exceeds storable range", quantity)))
}

#[derive(Debug, Clone)]
pub struct PgCheckoutStore {
  pool: PgPool,
}

impl PgCheckoutStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> CheckoutResult<Self> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Applies the bundled schema migrations (products + checkouts tables).
  pub async fn migrate(&self) -> CheckoutResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    event!(Level::INFO, "Checkout schema migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
  #[instrument(name = "PgCheckoutStore::find_product", skip(self), err(Display))]
  async fn find_product(&self, product_id: ProductId) -> CheckoutResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(FIND_PRODUCT_SQL)
      .bind(product_id.into_uuid())
      .fetch_optional(&self.pool)
      .await?;
    row.map(Product::try_from).transpose()
  }

  async fn begin(&self) -> CheckoutResult<Box<dyn StockTransaction>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgStockTransaction { tx }))
  }

  #[instrument(name = "PgCheckoutStore::entries_for_user", skip(self), err(Display))]
  async fn entries_for_user(&self, user_id: UserId) -> CheckoutResult<Vec<LedgerEntry>> {
    let rows: Vec<CheckoutRow> = sqlx::query_as(LIST_USER_CHECKOUTS_SQL)
      .bind(user_id.into_uuid())
      .fetch_all(&self.pool)
      .await?;
    rows.into_iter().map(LedgerEntry::try_from).collect()
  }

  async fn upsert_product(&self, product: &Product) -> CheckoutResult<()> {
    let stock = i32::try_from(product.available_quantity)
      .map_err(|_| CheckoutError::Validation(format!("stock {} exceeds storable range", product.available_quantity)))?;
    sqlx::query(UPSERT_PRODUCT_SQL)
      .bind(product.id.into_uuid())
      .bind(&product.name)
      .bind(product.unit_price)
      .bind(product.discount.percent())
      .bind(stock)
      .bind(product.owner.into_uuid())
      .bind(product.deleted_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn ping(&self) -> CheckoutResult<()> {
    sqlx::query("SELECT 1").execute(&self.pool).await?;
    Ok(())
  }
}

struct PgStockTransaction {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTransaction for PgStockTransaction {
  async fn load_product(&mut self, product_id: ProductId) -> CheckoutResult<Option<ProductSnapshot>> {
    let row: Option<ProductRow> = sqlx::query_as(FIND_PRODUCT_SQL)
      .bind(product_id.into_uuid())
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(row.map(Product::try_from).transpose()?.map(|p| p.snapshot()))
  }

  async fn conditional_decrement(&mut self, product_id: ProductId, quantity: u32) -> CheckoutResult<u64> {
    let rows_affected = sqlx::query(CONDITIONAL_DECREMENT_SQL)
      .bind(product_id.into_uuid())
      .bind(to_db_quantity(quantity)?)
      .execute(&mut *self.tx)
      .await?
      .rows_affected();
    Ok(rows_affected)
  }

  async fn append_entry(&mut self, entry: &LedgerEntry) -> CheckoutResult<()> {
    sqlx::query(INSERT_CHECKOUT_SQL)
      .bind(entry.id.into_uuid())
      .bind(entry.user_id.into_uuid())
      .bind(entry.product_id.into_uuid())
      .bind(to_db_quantity(entry.quantity)?)
      .bind(entry.unit_price)
      .bind(entry.discount.percent())
      .bind(entry.total)
      .bind(entry.created_at)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn commit(self: Box<Self>) -> CheckoutResult<()> {
    self.tx.commit().await?;
    Ok(())
  }
}
