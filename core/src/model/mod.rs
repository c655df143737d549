// core/src/model/mod.rs

//! Value types flowing through admission, the queue and fulfillment.

pub mod ids;
pub mod job;
pub mod ledger;
pub mod product;

pub use ids::{EntryId, JobId, ProductId, UserId};
pub use job::CheckoutJob;
pub use ledger::LedgerEntry;
pub use product::{Discount, Product, ProductSnapshot};
