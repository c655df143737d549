// tests/admission_tests.rs
mod common;
use common::*;
use flash_sale::{ErrorKind, JobQueue, ProductId, UserId};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn test_enqueue_returns_job_id_and_queues_job() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("20", "0", 0).await;
  let user = UserId::new();

  // Sold-out stock is not checked at admission.
  let job_id = h
    .admission
    .enqueue_checkout(&user.to_string(), &product.id.to_string(), 2)
    .await
    .unwrap();

  assert_eq!(h.queue.len().await.unwrap(), 1);
  let job = h.queue.pop(Duration::ZERO).await.unwrap().expect("job should be queued");
  assert_eq!(job.job_id, job_id);
  assert_eq!(job.user_id, user);
  assert_eq!(job.product_id, product.id);
  assert_eq!(job.quantity, 2);
  assert_eq!(h.store.stock_of(product.id), Some(0));
}

#[tokio::test]
#[serial]
async fn test_each_admission_gets_a_fresh_job_id() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("20", "0", 5).await;
  let user = UserId::new().to_string();
  let pid = product.id.to_string();

  let first = h.admission.enqueue_checkout(&user, &pid, 1).await.unwrap();
  let second = h.admission.enqueue_checkout(&user, &pid, 1).await.unwrap();
  assert_ne!(first, second);
  assert_eq!(h.queue.len().await.unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_validation_errors_never_reach_the_queue() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("20", "0", 5).await;
  let user = UserId::new().to_string();
  let pid = product.id.to_string();

  let cases: [(&str, &str, i64); 5] = [
    ("not-a-uuid", pid.as_str(), 1),
    (user.as_str(), "", 1),
    (user.as_str(), pid.as_str(), 0),
    (user.as_str(), pid.as_str(), -3),
    (user.as_str(), pid.as_str(), i64::MAX),
  ];
  for (u, p, q) in cases {
    let err = h.admission.enqueue_checkout(u, p, q).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation, "case ({u}, {p}, {q})");
  }
  assert_eq!(h.queue.len().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_missing_or_deleted_product_is_not_found() {
  setup_tracing();
  let h = Harness::new();
  let user = UserId::new().to_string();

  let err = h
    .admission
    .enqueue_checkout(&user, &ProductId::new().to_string(), 1)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let product = h.seed("20", "0", 5).await;
  h.store.soft_delete(product.id);
  let err = h
    .admission
    .enqueue_checkout(&user, &product.id.to_string(), 1)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(h.queue.len().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_queue_outage_surfaces_as_infrastructure() {
  setup_tracing();
  let h = Harness::new();
  let product = h.seed("20", "0", 5).await;
  h.queue.set_unavailable(true);

  let err = h
    .admission
    .enqueue_checkout(&UserId::new().to_string(), &product.id.to_string(), 1)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Infrastructure);

  h.queue.set_unavailable(false);
  assert_eq!(h.queue.len().await.unwrap(), 0);
}
