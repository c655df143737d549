use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flash_sale::{
  CheckoutJob, CheckoutStore, Discount, Fulfiller, JobQueue, MemoryCheckoutStore, MemoryJobQueue, Product, UserId,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

async fn seeded_store(stock: u32) -> (Arc<dyn CheckoutStore>, Product) {
  let store: Arc<dyn CheckoutStore> = Arc::new(MemoryCheckoutStore::new());
  let product = Product::new("bench", Decimal::new(1999, 2), Discount::NONE, stock, UserId::new());
  store.upsert_product(&product).await.unwrap();
  (store, product)
}

// --- Single job, uncontended ---

fn bench_single_fulfillment(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let (store, product) = rt.block_on(seeded_store(u32::MAX / 2));
  let fulfiller = Fulfiller::new(store);

  c.bench_function("fulfill_single_job", |b| {
    b.to_async(&rt).iter(|| {
      let fulfiller = fulfiller.clone();
      let job = CheckoutJob::new(UserId::new(), product.id, 1);
      async move { fulfiller.fulfill(&job).await.unwrap() }
    })
  });
}

// --- Many tasks racing for a small stock ---

fn bench_contended_fulfillment(c: &mut Criterion) {
  let mut group = c.benchmark_group("ContendedFulfillment");
  let rt = Runtime::new().unwrap();

  for concurrency in [8usize, 64, 256].iter() {
    group.throughput(Throughput::Elements(*concurrency as u64));
    group.bench_with_input(BenchmarkId::from_parameter(concurrency), concurrency, |b, &n| {
      b.to_async(&rt).iter(|| async move {
        // Stock covers half of the demand, so both outcomes are exercised.
        let (store, product) = seeded_store((n / 2) as u32).await;
        let fulfiller = Fulfiller::new(store);
        let handles: Vec<_> = (0..n)
          .map(|_| {
            let fulfiller = fulfiller.clone();
            let job = CheckoutJob::new(UserId::new(), product.id, 1);
            tokio::spawn(async move { fulfiller.fulfill(&job).await.is_ok() })
          })
          .collect();
        let mut ok = 0;
        for handle in handles {
          if handle.await.unwrap() {
            ok += 1;
          }
        }
        assert_eq!(ok, n / 2);
      })
    });
  }
  group.finish();
}

// --- Queue round trip through the wire codec ---

fn bench_queue_round_trip(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let queue = MemoryJobQueue::new();
  let job = CheckoutJob::new(UserId::new(), flash_sale::ProductId::new(), 3);

  c.bench_function("memory_queue_push_pop", |b| {
    b.to_async(&rt).iter(|| {
      let queue = queue.clone();
      let job = job.clone();
      async move {
        queue.push(&job).await.unwrap();
        queue.pop(Duration::ZERO).await.unwrap().unwrap()
      }
    })
  });
}

criterion_group!(
  benches,
  bench_single_fulfillment,
  bench_contended_fulfillment,
  bench_queue_round_trip
);
criterion_main!(benches);
