mod queue;
mod ring;

pub use queue::BoundedQueue;
pub use queue::Iter;
