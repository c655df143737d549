// server/src/seed.rs

//! Demo catalog for local runs (`SEED_DB=true`). Ids are fixed so repeated
//! startups refresh the same rows and load scripts can hard-code them.

use flash_sale::{CheckoutStore, Discount, Product, ProductId, UserId};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::errors::Result;

const SEED_OWNER: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001);

struct SeedProduct {
  id: u128,
  name: &'static str,
  price_cents: i64,
  discount_percent: i64,
  stock: u32,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
  SeedProduct {
    id: 0x5eed_0000_0000_4000_8000_0000_0000_0101,
    name: "Flash Sale Sneakers",
    price_cents: 100_00,
    discount_percent: 10,
    stock: 10,
  },
  SeedProduct {
    id: 0x5eed_0000_0000_4000_8000_0000_0000_0102,
    name: "Limited Edition Hoodie",
    price_cents: 59_90,
    discount_percent: 25,
    stock: 100,
  },
  SeedProduct {
    id: 0x5eed_0000_0000_4000_8000_0000_0000_0103,
    name: "Collector Vinyl",
    price_cents: 34_99,
    discount_percent: 0,
    stock: 1,
  },
];

pub async fn seed_products(store: &dyn CheckoutStore) -> Result<()> {
  for seed in SEED_PRODUCTS {
    let product = Product {
      id: ProductId::from_uuid(Uuid::from_u128(seed.id)),
      name: seed.name.to_string(),
      unit_price: Decimal::new(seed.price_cents, 2),
      discount: Discount::new(Decimal::from(seed.discount_percent))?,
      available_quantity: seed.stock,
      owner: UserId::from_uuid(SEED_OWNER),
      deleted_at: None,
    };
    store.upsert_product(&product).await?;
    info!(product_id = %product.id, name = %product.name, stock = product.available_quantity, "Seeded product.");
  }
  Ok(())
}
