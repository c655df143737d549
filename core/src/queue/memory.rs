// core/src/queue/memory.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{event, Level};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::CheckoutJob;
use crate::queue::JobQueue;

#[derive(Debug, Default)]
struct Inner {
  items: Mutex<VecDeque<Vec<u8>>>,
  notify: Notify,
  unavailable: AtomicBool,
}

/// In-process queue holding encoded payloads, so every job still goes through
/// the wire codec. Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobQueue {
  inner: Arc<Inner>,
}

impl MemoryJobQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Enqueues bytes as-is, bypassing the encoder.
  pub fn push_raw(&self, payload: Vec<u8>) {
    self.inner.items.lock().push_back(payload);
    self.inner.notify.notify_one();
  }

  /// While set, push/pop/len fail with an infrastructure error.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.inner.unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn ensure_available(&self) -> CheckoutResult<()> {
    if self.inner.unavailable.load(Ordering::SeqCst) {
      return Err(CheckoutError::infrastructure(
        "job queue",
        anyhow::anyhow!("in-memory queue marked unavailable"),
      ));
    }
    Ok(())
  }

  fn take_next(&self) -> Option<(Vec<u8>, bool)> {
    let mut items = self.inner.items.lock();
    items.pop_front().map(|payload| (payload, !items.is_empty()))
  }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
  async fn push(&self, job: &CheckoutJob) -> CheckoutResult<()> {
    self.ensure_available()?;
    let payload = job.encode()?;
    self.push_raw(payload);
    Ok(())
  }

  async fn pop(&self, timeout: Duration) -> CheckoutResult<Option<CheckoutJob>> {
    let deadline = Instant::now() + timeout;
    loop {
      self.ensure_available()?;
      if let Some((payload, more)) = self.take_next() {
        if more {
          // hand the remaining backlog to another waiter
          self.inner.notify.notify_one();
        }
        return match CheckoutJob::decode(&payload) {
          Ok(job) => Ok(Some(job)),
          Err(e) => {
            event!(Level::WARN, error = %e, bytes = payload.len(), "Dropping undecodable job payload.");
            Err(e)
          }
        };
      }
      if tokio::time::timeout_at(deadline, self.inner.notify.notified()).await.is_err() {
        return Ok(None);
      }
    }
  }

  async fn len(&self) -> CheckoutResult<u64> {
    self.ensure_available()?;
    Ok(self.inner.items.lock().len() as u64)
  }
}
