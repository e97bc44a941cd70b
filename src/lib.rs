pub mod bounded;
pub mod error;
pub mod workload;

pub use bounded::BoundedQueue;
pub use bounded::Iter;
pub use error::{ConfigError, PopError, PushError, QueueError, RunError};

/// Common interface for closable queues.
pub trait ClosableQueue<T: Send>: Send + Sync {
    /// Blocks while the queue is full. Fails with `PushError::Closed` once
    /// the queue has been closed, handing the item back.
    fn push(&self, item: T) -> Result<(), PushError<T>>;
    /// Blocks while the queue is empty. Fails with `PopError::Exhausted`
    /// once the queue is closed and drained.
    fn pop(&self) -> Result<T, PopError>;

    /// Ends production. Returns `true` only for the call that closed it.
    fn close(&self) -> bool;
    fn is_closed(&self) -> bool;
    /// Maximum number of buffered items.
    fn capacity(&self) -> usize;

    /// True when a subsequent `push` *may* succeed without blocking.
    fn available(&self) -> bool;
    /// True when a subsequent `pop` would block or fail.
    fn empty(&self) -> bool;
}
