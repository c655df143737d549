// src/lib.rs

//! Flash-sale checkout core.
//!
//! Checkout requests are split in two:
//!  - Admission ([`AdmissionService`]) validates the request, confirms the
//!    product exists and enqueues a [`CheckoutJob`]. It returns a job id
//!    immediately and never touches stock.
//!  - Fulfillment ([`Fulfiller`]), driven by a [`WorkerPool`], pops jobs and
//!    runs each in one store transaction: conditional stock decrement plus a
//!    ledger append, committed together or not at all.
//!
//! Oversell protection lives in the store's conditional decrement, not in any
//! in-process lock, so it holds across any number of workers and processes.
//!
//! Backends:
//!  - stores: [`MemoryCheckoutStore`], `PgCheckoutStore` (feature `postgres`)
//!  - queues: [`MemoryJobQueue`], `RedisJobQueue` (feature `redis`)

pub mod admission;
pub mod error;
pub mod fulfillment;
pub mod model;
pub mod pricing;
pub mod queue;
pub mod store;
pub mod worker;

// --- Re-exports for the Public API ---

pub use crate::admission::AdmissionService;
pub use crate::error::{CheckoutError, CheckoutResult, ErrorKind};
pub use crate::fulfillment::Fulfiller;
pub use crate::model::{CheckoutJob, Discount, EntryId, JobId, LedgerEntry, Product, ProductId, ProductSnapshot, UserId};
pub use crate::queue::{JobQueue, MemoryJobQueue};
pub use crate::store::{CheckoutStore, MemoryCheckoutStore, StockTransaction};
pub use crate::worker::{WorkerPool, WorkerPoolConfig, WorkerStats, WorkerStatsSnapshot};

#[cfg(feature = "postgres")]
pub use crate::store::PgCheckoutStore;
#[cfg(feature = "redis")]
pub use crate::queue::RedisJobQueue;
