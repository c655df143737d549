// tests/worker_pool_tests.rs
mod common;
use common::*;
use flash_sale::{CheckoutJob, JobQueue, UserId, WorkerPool, WorkerPoolConfig};
use serial_test::serial;
use std::time::Duration;

fn fast_config(workers: usize) -> WorkerPoolConfig {
  WorkerPoolConfig {
    workers,
    pop_timeout: Duration::from_millis(50),
    error_backoff: Duration::from_millis(20),
  }
}

/// Polls until the queue is empty and `done` holds, or gives up after ~5s.
async fn wait_until(h: &Harness, done: impl Fn() -> bool) {
  for _ in 0..250 {
    if h.queue.len().await.unwrap_or(1) == 0 && done() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  panic!("worker pool did not drain in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_pool_drains_admitted_jobs_without_oversell() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("100", "10", 10).await;
  let pid = product.id.to_string();

  for _ in 0..20 {
    h.admission
      .enqueue_checkout(&UserId::new().to_string(), &pid, 1)
      .await
      .unwrap();
  }

  let pool = WorkerPool::spawn(fast_config(5), h.queue_handle(), h.fulfiller.clone());
  assert_eq!(pool.worker_count(), 5);
  let stats = pool.stats();
  wait_until(&h, || stats.snapshot().processed() == 20).await;

  let snapshot = pool.shutdown().await;
  assert_eq!(snapshot.fulfilled, 10);
  assert_eq!(snapshot.out_of_stock, 10);
  assert_eq!(snapshot.failed, 0);
  assert_eq!(h.store.stock_of(product.id), Some(0));
  assert!(h.store.ledger().iter().all(|e| e.total == dec("90.00")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_business_rejections_do_not_stop_workers() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("1", "0", 1).await;
  let user = UserId::new().to_string();
  let pid = product.id.to_string();

  h.admission.enqueue_checkout(&user, &pid, 1).await.unwrap();
  h.admission.enqueue_checkout(&user, &pid, 1).await.unwrap();
  // Deleted after admission: fulfillment sees it as gone.
  let doomed = h.seed("1", "0", 3).await;
  h.admission
    .enqueue_checkout(&user, &doomed.id.to_string(), 1)
    .await
    .unwrap();
  h.store.soft_delete(doomed.id);

  let pool = WorkerPool::spawn(fast_config(1), h.queue_handle(), h.fulfiller.clone());
  let stats = pool.stats();
  wait_until(&h, || stats.snapshot().processed() == 3).await;

  // Still alive: a later job is processed by the same single worker.
  let restocked = h.seed("1", "0", 1).await;
  h.admission
    .enqueue_checkout(&user, &restocked.id.to_string(), 1)
    .await
    .unwrap();
  wait_until(&h, || stats.snapshot().processed() == 4).await;

  let snapshot = pool.shutdown().await;
  assert_eq!(snapshot.fulfilled, 2);
  assert_eq!(snapshot.out_of_stock, 1);
  assert_eq!(snapshot.not_found, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_workers_survive_infrastructure_errors() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("1", "0", 5).await;
  let pid = product.id.to_string();
  let user = UserId::new().to_string();

  h.queue.push_raw(b"{\"garbage\":true}".to_vec());
  let pool = WorkerPool::spawn(fast_config(2), h.queue_handle(), h.fulfiller.clone());
  let stats = pool.stats();
  wait_until(&h, || stats.snapshot().failed >= 1).await;

  // Queue outage: pops fail and back off, nothing is lost once it recovers.
  h.admission.enqueue_checkout(&user, &pid, 2).await.unwrap();
  h.queue.set_unavailable(true);
  tokio::time::sleep(Duration::from_millis(100)).await;
  h.queue.set_unavailable(false);
  wait_until(&h, || stats.snapshot().fulfilled == 1).await;

  // Store outage during fulfillment: that job is dropped, the worker keeps going.
  let failed_before = stats.snapshot().failed;
  h.store.set_unavailable(true);
  h.queue.push(&CheckoutJob::new(UserId::new(), product.id, 1)).await.unwrap();
  wait_until(&h, || stats.snapshot().failed > failed_before).await;
  h.store.set_unavailable(false);
  h.admission.enqueue_checkout(&user, &pid, 1).await.unwrap();
  wait_until(&h, || stats.snapshot().fulfilled == 2).await;

  let snapshot = pool.shutdown().await;
  assert!(snapshot.failed >= 2);
  assert_eq!(h.store.stock_of(product.id), Some(2));
  assert_eq!(h.store.sold_quantity(product.id), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_shutdown_returns_promptly_when_idle() {
  setup_tracing();
  let h = Harness::new();
  let pool = WorkerPool::spawn(fast_config(3), h.queue_handle(), h.fulfiller.clone());
  tokio::time::sleep(Duration::from_millis(120)).await;

  let snapshot = tokio::time::timeout(Duration::from_secs(2), pool.shutdown())
    .await
    .expect("shutdown should finish within a pop timeout");
  assert_eq!(snapshot.processed(), 0);
  assert!(snapshot.idle_polls > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_zero_workers_still_starts_one() {
  setup_tracing();
  let h = Harness::new();
  let pool = WorkerPool::spawn(fast_config(0), h.queue_handle(), h.fulfiller.clone());
  assert_eq!(pool.worker_count(), 1);
  pool.shutdown().await;
}
