//! Producer/consumer driver.
//!
//! Producers push `0..items` into one shared queue, consumers pop until the
//! queue is exhausted and report partial sums, and the driver joins every
//! worker before aggregating.

use crate::error::{ConfigError, RunError};
use crate::{BoundedQueue, ClosableQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
   /// Slots in the shared queue.
   pub capacity: usize,
   pub producers: usize,
   pub consumers: usize,
   /// Items pushed by each producer: `0..items`.
   pub items: u64,
   /// Simulated work before every push. Zero disables it.
   pub produce_delay: Duration,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         capacity: 32,
         producers: 1,
         consumers: 4,
         items: 100,
         produce_delay: Duration::from_millis(1),
      }
   }
}

impl Config {
   pub fn validate(&self) -> Result<(), ConfigError> {
      if self.capacity == 0 {
         return Err(ConfigError::ZeroCapacity);
      }
      self.validate_workers()
   }

   // Everything but `capacity`, which only matters when we build the queue.
   fn validate_workers(&self) -> Result<(), ConfigError> {
      if self.consumers == 0 {
         return Err(ConfigError::ZeroConsumers);
      }
      if self.producers == 0 {
         return Err(ConfigError::ZeroProducers);
      }
      Ok(())
   }

   /// `producers * (0 + 1 + ... + items-1)`, saturating at `u128::MAX`.
   pub fn expected_sum(&self) -> u128 {
      let n = u128::from(self.items);
      // n < 2^64, so n * (n - 1) fits
      let per_producer = if n == 0 { 0 } else { n * (n - 1) / 2 };
      per_producer.saturating_mul(self.producers as u128)
   }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
   /// Sum of every item the consumers received.
   pub total: u128,
   /// Closed-form sum for the configuration.
   pub expected: u128,
   /// Sum of every push the queue accepted.
   pub pushed_sum: u128,
   /// Per-consumer sums, indexed by consumer id.
   pub partial_sums: Vec<u128>,
   /// Accepted pushes across all producers.
   pub pushed: u64,
   /// Producers that stopped early on a closed queue.
   pub rejected: usize,
   pub elapsed: Duration,
}

impl Report {
   pub fn is_match(&self) -> bool {
      self.total == self.expected
   }
}

/// Validates `config`, builds a [`BoundedQueue`] and runs the workload on it.
pub fn run(config: &Config) -> Result<Report, RunError> {
   config.validate()?;
   let queue = BoundedQueue::new(config.capacity)?;
   run_on(&queue, config)
}

/// Runs the workload on a caller-supplied, still-open queue.
///
/// `config.capacity` is ignored here: the queue already has its own.
/// Returns once every producer and consumer has been joined. The last
/// producer to finish closes the queue.
pub fn run_on<Q: ClosableQueue<u64>>(queue: &Q, config: &Config) -> Result<Report, RunError> {
   config.validate_workers()?;
   info!(
      producers = config.producers,
      consumers = config.consumers,
      items = config.items,
      capacity = queue.capacity(),
      "starting workload"
   );

   let remaining = &AtomicUsize::new(config.producers);
   let start = Instant::now();

   let (produced, partial_sums) = crossbeam::scope(|s| {
      let producers: Vec<_> = (0..config.producers)
         .map(|id| s.spawn(move |_| produce(queue, id, config, remaining)))
         .collect();
      let consumers: Vec<_> = (0..config.consumers)
         .map(|id| s.spawn(move |_| consume(queue, id)))
         .collect();

      let produced = producers
         .into_iter()
         .map(|h| h.join())
         .collect::<Result<Vec<_>, _>>();
      let partial_sums = consumers
         .into_iter()
         .map(|h| h.join())
         .collect::<Result<Vec<_>, _>>();
      (produced, partial_sums)
   })
   .map_err(|_| RunError::WorkerPanicked)?;

   let elapsed = start.elapsed();
   let produced = produced.map_err(|_| RunError::WorkerPanicked)?;
   let partial_sums = partial_sums.map_err(|_| RunError::WorkerPanicked)?;

   let report = Report {
      total: partial_sums.iter().sum(),
      expected: config.expected_sum(),
      pushed_sum: produced.iter().map(|p| p.pushed_sum).sum(),
      pushed: produced.iter().map(|p| p.pushed).sum(),
      rejected: produced.iter().filter(|p| p.rejected).count(),
      partial_sums,
      elapsed,
   };
   if !report.is_match() {
      warn!(total = %report.total, expected = %report.expected, "consumer total differs from closed form");
   }
   Ok(report)
}

struct Produced {
   pushed: u64,
   pushed_sum: u128,
   rejected: bool,
}

fn produce<Q: ClosableQueue<u64>>(
   queue: &Q,
   id: usize,
   config: &Config,
   remaining: &AtomicUsize,
) -> Produced {
   let _done = ProducerDone { queue, remaining };
   debug!(producer = id, items = config.items, "producer started");

   let mut out = Produced { pushed: 0, pushed_sum: 0, rejected: false };
   for item in 0..config.items {
      if !config.produce_delay.is_zero() {
         thread::sleep(config.produce_delay);
      }
      if let Err(err) = queue.push(item) {
         // the queue never reopens, so no retry
         debug!(producer = id, item, %err, "producer giving up");
         out.rejected = true;
         break;
      }
      out.pushed += 1;
      out.pushed_sum += u128::from(item);
   }

   debug!(producer = id, pushed = out.pushed, "producer finished");
   out
}

fn consume<Q: ClosableQueue<u64>>(queue: &Q, id: usize) -> u128 {
   let _guard = CloseOnPanic { queue };

   let mut partial_sum = 0u128;
   let mut received = 0u64;
   while let Ok(item) = queue.pop() {
      partial_sum += u128::from(item);
      received += 1;
   }

   debug!(consumer = id, received, partial_sum = %partial_sum, "consumer exhausted");
   partial_sum
}

// Counts a producer out on every exit path, unwinding included. The last
// one closes the queue so consumers can drain and stop.
struct ProducerDone<'a, Q: ClosableQueue<u64>> {
   queue: &'a Q,
   remaining: &'a AtomicUsize,
}

impl<Q: ClosableQueue<u64>> Drop for ProducerDone<'_, Q> {
   fn drop(&mut self) {
      if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 && self.queue.close() {
         debug!("last producer closed the queue");
      }
   }
}

// A dead consumer must not leave producers parked on a full queue.
struct CloseOnPanic<'a, Q: ClosableQueue<u64>> {
   queue: &'a Q,
}

impl<Q: ClosableQueue<u64>> Drop for CloseOnPanic<'_, Q> {
   fn drop(&mut self) {
      if thread::panicking() {
         warn!("consumer panicked, closing queue");
         self.queue.close();
      }
   }
}
