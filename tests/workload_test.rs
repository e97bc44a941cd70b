// bounded_queues/tests/workload_test.rs

use bounded_queues::workload::{self, Config};
use bounded_queues::{BoundedQueue, ClosableQueue, ConfigError, PopError, PushError, RunError};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;


fn quick(capacity: usize, producers: usize, consumers: usize, items: u64) -> Config {
   Config {
      capacity,
      producers,
      consumers,
      items,
      produce_delay: Duration::ZERO,
   }
}

#[test]
fn test_one_producer_four_consumers_matches_closed_form() {
   let report = workload::run(&quick(4, 1, 4, 100)).unwrap();
   assert_eq!(report.total, 4950);
   assert_eq!(report.expected, 4950);
   assert_eq!(report.pushed, 100);
   assert_eq!(report.rejected, 0);
   assert_eq!(report.partial_sums.len(), 4);
   assert!(report.is_match());
}

#[test]
fn test_zero_items_run() {
   let report = workload::run(&quick(1, 1, 1, 0)).unwrap();
   assert_eq!(report.total, 0);
   assert_eq!(report.expected, 0);
   assert_eq!(report.partial_sums, vec![0]);
   assert!(report.is_match());
}

#[test]
fn test_many_producers_close_once_after_all() {
   let report = workload::run(&quick(8, 3, 2, 10)).unwrap();
   assert_eq!(report.pushed, 30);
   assert_eq!(report.total, 3 * 45);
   assert_eq!(report.total, report.pushed_sum);
   assert!(report.is_match());
}

#[test]
fn test_with_producer_delay() {
   let config = Config {
      produce_delay: Duration::from_micros(200),
      ..quick(2, 2, 3, 25)
   };
   let report = workload::run(&config).unwrap();
   assert!(report.is_match(), "{:?}", report);
}

#[test]
fn test_invalid_config_fails_before_spawning() {
   let err = workload::run(&quick(0, 1, 1, 10)).unwrap_err();
   assert!(matches!(err, RunError::Config(ConfigError::ZeroCapacity)));

   let err = workload::run(&quick(4, 1, 0, 10)).unwrap_err();
   assert!(matches!(err, RunError::Config(ConfigError::ZeroConsumers)));

   let err = workload::run(&quick(4, 0, 1, 10)).unwrap_err();
   assert!(matches!(err, RunError::Config(ConfigError::ZeroProducers)));
}

#[test]
fn test_pre_closed_queue_rejects_all_producers() {
   let q = BoundedQueue::with_capacity(4);
   q.close();
   let report = workload::run_on(&q, &quick(4, 2, 2, 50)).unwrap();
   assert_eq!(report.pushed, 0);
   assert_eq!(report.rejected, 2);
   assert_eq!(report.total, 0);
   assert!(!report.is_match());
}

#[test]
fn test_run_on_uses_queue_capacity_not_config() {
   let q = BoundedQueue::with_capacity(3);
   // capacity in the config is irrelevant once the queue exists
   let report = workload::run_on(&q, &quick(0, 2, 2, 40)).unwrap();
   assert_eq!(report.total, 2 * 780);
   assert!(report.is_match());
   assert_eq!(ClosableQueue::capacity(&q), 3);
}

#[test]
fn test_expected_sum_saturates_instead_of_overflowing() {
   let config = quick(1, 3, 1, u64::MAX);
   assert_eq!(config.expected_sum(), u128::MAX);
}

// Wraps the real queue and panics on the n-th pop.
struct FaultyQueue {
   inner: BoundedQueue<u64>,
   pops_left: AtomicUsize,
}

impl ClosableQueue<u64> for FaultyQueue {
   fn push(&self, item: u64) -> Result<(), PushError<u64>> {
      self.inner.push(item)
   }
   fn pop(&self) -> Result<u64, PopError> {
      if self.pops_left.fetch_sub(1, Ordering::SeqCst) == 0 {
         panic!("injected consumer failure");
      }
      self.inner.pop()
   }
   fn close(&self) -> bool {
      self.inner.close()
   }
   fn is_closed(&self) -> bool {
      self.inner.is_closed()
   }
   fn capacity(&self) -> usize {
      self.inner.capacity()
   }
   fn available(&self) -> bool {
      ClosableQueue::available(&self.inner)
   }
   fn empty(&self) -> bool {
      self.inner.is_empty()
   }
}

#[test]
fn test_consumer_panic_aborts_run_without_hanging() {
   let q = FaultyQueue {
      inner: BoundedQueue::with_capacity(2),
      pops_left: AtomicUsize::new(5),
   };
   // one consumer, so once it dies the producer would park forever
   // unless the dying consumer closes the queue
   let err = workload::run_on(&q, &quick(2, 1, 1, 1_000)).unwrap_err();
   assert!(matches!(err, RunError::WorkerPanicked));
   assert!(q.is_closed());
}
