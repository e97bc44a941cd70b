use thiserror::Error;

/// Returned by the push family. Every variant hands the rejected item back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError<T> {
   /// The queue was closed; it will never accept another item.
   #[error("push on a closed queue")]
   Closed(T),
   /// Only from `try_push`: no free slot right now.
   #[error("push on a full queue")]
   Full(T),
   /// Only from `push_timeout`: no slot freed up before the deadline.
   #[error("timed out waiting for a free slot")]
   Timeout(T),
}

impl<T> PushError<T> {
   pub fn into_inner(self) -> T {
      match self {
         PushError::Closed(item) | PushError::Full(item) | PushError::Timeout(item) => item,
      }
   }

   pub fn is_closed(&self) -> bool {
      matches!(self, PushError::Closed(_))
   }
}

/// Returned by the pop family.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
   /// Closed and drained. The normal end of a consumer loop.
   #[error("queue is closed and drained")]
   Exhausted,
   /// Only from `try_pop`: nothing buffered, but the queue is still open.
   #[error("queue is empty")]
   Empty,
   /// Only from `pop_timeout`.
   #[error("timed out waiting for an item")]
   Timeout,
}

impl PopError {
   pub fn is_exhausted(&self) -> bool {
      matches!(self, PopError::Exhausted)
   }
}

/// Queue construction failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
   #[error("queue capacity must be greater than zero")]
   ZeroCapacity,
   #[error("could not allocate storage for {capacity} slots")]
   Alloc { capacity: usize },
}

/// Rejected workload parameters, reported before any thread starts.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
   #[error("queue capacity must be greater than zero")]
   ZeroCapacity,
   #[error("number of consumers must be greater than zero")]
   ZeroConsumers,
   #[error("number of producers must be greater than zero")]
   ZeroProducers,
   #[error("items must be non-negative")]
   NegativeItems,
}

#[derive(Debug, Error)]
pub enum RunError {
   #[error(transparent)]
   Config(#[from] ConfigError),
   #[error(transparent)]
   Queue(#[from] QueueError),
   #[error("a worker thread panicked")]
   WorkerPanicked,
}
