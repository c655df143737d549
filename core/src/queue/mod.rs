// core/src/queue/mod.rs

//! The Job Queue between admission and the worker pool.
//!
//! Delivery is at-most-once: a popped job is gone from the queue, and a worker
//! that dies before committing it loses it. Ordering across jobs is best-effort
//! FIFO; per-product correctness is enforced by the store, not here.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryJobQueue;
#[cfg(feature = "redis")]
pub use self::redis::RedisJobQueue;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CheckoutResult;
use crate::model::CheckoutJob;

/// Redis list used when no key is configured.
pub const DEFAULT_QUEUE_KEY: &str = "checkout_queue";

/// Default bound on a blocking pop.
pub const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait JobQueue: Send + Sync {
  async fn push(&self, job: &CheckoutJob) -> CheckoutResult<()>;

  /// Waits up to `timeout` for a job. `Ok(None)` means the wait elapsed with
  /// nothing to do and is not an error.
  ///
  /// A payload that cannot be decoded is removed from the queue and reported
  /// as an error for this pop only.
  async fn pop(&self, timeout: Duration) -> CheckoutResult<Option<CheckoutJob>>;

  /// Number of jobs currently waiting.
  async fn len(&self) -> CheckoutResult<u64>;
}
