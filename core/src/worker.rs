// core/src/worker.rs

//! Fixed-size pool of fulfillment workers.
//!
//! Each worker is an independent tokio task looping `pop -> fulfill`. Workers
//! share nothing except the queue and store handles and a set of counters;
//! adding workers adds throughput, never oversell risk.
//!
//! Shutdown is cooperative. A worker checks the signal between jobs, so a job
//! it already popped always runs to commit or rollback before the task exits.
//! The pop itself is never cancelled mid-flight, since a cancelled `BRPOP` can
//! lose the job it was about to return.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{event, Instrument, Level};

use crate::error::ErrorKind;
use crate::fulfillment::Fulfiller;
use crate::queue::{JobQueue, DEFAULT_POP_TIMEOUT};

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
  pub workers: usize,
  /// Upper bound on each blocking pop; also the worst-case shutdown latency.
  pub pop_timeout: Duration,
  /// Pause after the queue itself errors, so an outage does not turn into a hot loop.
  pub error_backoff: Duration,
}

impl Default for WorkerPoolConfig {
  fn default() -> Self {
    Self {
      workers: 5,
      pop_timeout: DEFAULT_POP_TIMEOUT,
      error_backoff: Duration::from_millis(500),
    }
  }
}

/// Outcome counters shared by all workers of a pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
  fulfilled: AtomicU64,
  out_of_stock: AtomicU64,
  not_found: AtomicU64,
  failed: AtomicU64,
  idle_polls: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
  pub fulfilled: u64,
  pub out_of_stock: u64,
  pub not_found: u64,
  /// Infrastructure and decode failures, both on pop and during fulfillment.
  pub failed: u64,
  pub idle_polls: u64,
}

impl WorkerStatsSnapshot {
  /// Jobs that reached a terminal outcome.
  pub fn processed(&self) -> u64 {
    self.fulfilled + self.out_of_stock + self.not_found + self.failed
  }
}

impl WorkerStats {
  pub fn snapshot(&self) -> WorkerStatsSnapshot {
    WorkerStatsSnapshot {
      fulfilled: self.fulfilled.load(Ordering::Relaxed),
      out_of_stock: self.out_of_stock.load(Ordering::Relaxed),
      not_found: self.not_found.load(Ordering::Relaxed),
      failed: self.failed.load(Ordering::Relaxed),
      idle_polls: self.idle_polls.load(Ordering::Relaxed),
    }
  }

  fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }
}

pub struct WorkerPool {
  shutdown_tx: broadcast::Sender<()>,
  handles: Vec<JoinHandle<()>>,
  stats: Arc<WorkerStats>,
}

impl WorkerPool {
  /// Starts `config.workers` workers (at least one) on the current runtime.
  pub fn spawn(config: WorkerPoolConfig, queue: Arc<dyn JobQueue>, fulfiller: Fulfiller) -> Self {
    let worker_count = config.workers.max(1);
    let (shutdown_tx, _) = broadcast::channel(1);
    let stats = Arc::new(WorkerStats::default());

    let handles = (0..worker_count)
      .map(|worker_id| {
        let worker = Worker {
          id: worker_id,
          queue: Arc::clone(&queue),
          fulfiller: fulfiller.clone(),
          stats: Arc::clone(&stats),
          shutdown: shutdown_tx.subscribe(),
          stopping: false,
          config: config.clone(),
        };
        let span = tracing::info_span!("checkout_worker", worker_id);
        tokio::spawn(worker.run().instrument(span))
      })
      .collect();

    event!(Level::INFO, workers = worker_count, pop_timeout_ms = config.pop_timeout.as_millis() as u64, "Worker pool started.");
    Self {
      shutdown_tx,
      handles,
      stats,
    }
  }

  pub fn stats(&self) -> Arc<WorkerStats> {
    Arc::clone(&self.stats)
  }

  pub fn worker_count(&self) -> usize {
    self.handles.len()
  }

  /// Signals every worker and waits for all of them to exit.
  pub async fn shutdown(self) -> WorkerStatsSnapshot {
    // No receivers left just means every worker already stopped.
    let _ = self.shutdown_tx.send(());
    for handle in self.handles {
      if let Err(join_err) = handle.await {
        event!(Level::ERROR, error = %join_err, "Checkout worker task ended abnormally.");
      }
    }
    let snapshot = self.stats.snapshot();
    event!(Level::INFO, ?snapshot, "Worker pool stopped.");
    snapshot
  }
}

struct Worker {
  id: usize,
  queue: Arc<dyn JobQueue>,
  fulfiller: Fulfiller,
  stats: Arc<WorkerStats>,
  shutdown: broadcast::Receiver<()>,
  stopping: bool,
  config: WorkerPoolConfig,
}

impl Worker {
  async fn run(mut self) {
    event!(Level::DEBUG, "Worker started.");
    while !self.shutdown_requested() {
      match self.queue.pop(self.config.pop_timeout).await {
        Ok(None) => WorkerStats::bump(&self.stats.idle_polls),
        Ok(Some(job)) => match self.fulfiller.fulfill(&job).await {
          Ok(_) => WorkerStats::bump(&self.stats.fulfilled),
          Err(err) => match err.kind() {
            ErrorKind::InsufficientStock => {
              event!(Level::INFO, job_id = %job.job_id, product_id = %job.product_id, "Checkout rejected: insufficient stock.");
              WorkerStats::bump(&self.stats.out_of_stock);
            }
            ErrorKind::NotFound => {
              event!(Level::INFO, job_id = %job.job_id, product_id = %job.product_id, "Checkout rejected: product not found.");
              WorkerStats::bump(&self.stats.not_found);
            }
            ErrorKind::Validation | ErrorKind::Infrastructure => {
              event!(Level::ERROR, job_id = %job.job_id, error = %err, "Checkout job failed; dropping it.");
              WorkerStats::bump(&self.stats.failed);
            }
          },
        },
        Err(err) => {
          event!(Level::ERROR, worker_id = self.id, error = %err, "Queue pop failed; backing off.");
          WorkerStats::bump(&self.stats.failed);
          self.backoff().await;
        }
      }
    }
    event!(Level::DEBUG, "Worker stopped.");
  }

  fn shutdown_requested(&mut self) -> bool {
    if self.stopping {
      return true;
    }
    self.stopping = match self.shutdown.try_recv() {
      Err(TryRecvError::Empty) => false,
      Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => true,
    };
    self.stopping
  }

  async fn backoff(&mut self) {
    tokio::select! {
      _ = tokio::time::sleep(self.config.error_backoff) => {}
      _ = self.shutdown.recv() => self.stopping = true,
    }
  }
}
