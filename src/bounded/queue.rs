// Bounded closable MPMC queue
//
// One mutex over a fixed ring plus two condition variables: `not_full`
// parks producers, `not_empty` parks consumers. `close` is a one-way
// "nothing more will be produced" flag. Producers are rejected from then
// on, consumers drain what is buffered and then see `Exhausted`.

use super::ring::Ring;
use crate::error::{PopError, PushError, QueueError};
use crate::ClosableQueue;
use std::{
   fmt,
   sync::{Condvar, Mutex, MutexGuard, PoisonError},
   time::{Duration, Instant},
};
use tracing::{debug, trace};

/*──────────────────────────────────────────────────────────────────────────*/
/*  State                                                                   */
/*──────────────────────────────────────────────────────────────────────────*/

struct State<T> {
   ring  : Ring<T>,
   closed: bool, // false -> true, never back
}

pub struct BoundedQueue<T> {
   state    : Mutex<State<T>>,
   not_empty: Condvar, // an item became available, or closed
   not_full : Condvar, // a slot became available, or closed
   capacity : usize,
}

/*────────────────────────────  constructors  ──────────────────────────────*/

impl<T> BoundedQueue<T> {
   /// Builds an open, empty queue holding at most `capacity` items.
   ///
   /// Fails on a zero capacity, or if the slots cannot be allocated.
   pub fn new(capacity: usize) -> Result<Self, QueueError> {
      if capacity == 0 {
         return Err(QueueError::ZeroCapacity);
      }
      let ring = Ring::try_new(capacity).map_err(|_| QueueError::Alloc { capacity })?;
      debug_assert_eq!(ring.capacity(), capacity);
      trace!(capacity, "bounded queue created");

      Ok(Self {
         state    : Mutex::new(State { ring, closed: false }),
         not_empty: Condvar::new(),
         not_full : Condvar::new(),
         capacity,
      })
   }

   /// Like [`new`](Self::new) but panics instead of returning an error.
   pub fn with_capacity(capacity: usize) -> Self {
      assert!(capacity > 0, "capacity must be greater than zero");
      Self::new(capacity).unwrap_or_else(|err| panic!("{err}"))
   }

   // Every transition finishes without running caller code under the lock,
   // so a poisoned guard still protects a consistent ring.
   #[inline]
   fn lock(&self) -> MutexGuard<'_, State<T>> {
      self.state.lock().unwrap_or_else(PoisonError::into_inner)
   }
}

/*──────────────────────────── queue operations ────────────────────────────*/

impl<T> BoundedQueue<T> {
   /// Enqueues `item`, blocking while the queue is full and still open.
   ///
   /// Returns `PushError::Closed(item)` if the queue is closed before or
   /// while waiting, even when a slot is free.
   pub fn push(&self, item: T) -> Result<(), PushError<T>> {
      let mut state = self.lock();
      if state.closed {
         return Err(PushError::Closed(item));
      }

      while state.ring.is_full() && !state.closed {
         state = self.not_full.wait(state).unwrap_or_else(PoisonError::into_inner);
      }
      // closed while we were parked
      if state.closed {
         return Err(PushError::Closed(item));
      }

      self.enqueue(&mut state, item)
   }

   /// Dequeues the oldest item, blocking while the queue is empty and open.
   ///
   /// `PopError::Exhausted` means closed and drained. It is the normal end
   /// of a consumer loop, not a failure.
   pub fn pop(&self) -> Result<T, PopError> {
      let mut state = self.lock();
      while state.ring.is_empty() && !state.closed {
         state = self.not_empty.wait(state).unwrap_or_else(PoisonError::into_inner);
      }

      self.dequeue(&mut state).ok_or(PopError::Exhausted)
   }

   /// Marks the queue closed and wakes every parked producer and consumer.
   ///
   /// Idempotent. Returns `true` only for the call that did the closing.
   pub fn close(&self) -> bool {
      let mut state = self.lock();
      let first = !state.closed;
      state.closed = true;
      self.not_empty.notify_all();
      self.not_full.notify_all();

      if first {
         debug!(buffered = state.ring.len(), capacity = self.capacity, "queue closed");
      }
      first
   }

   /// Non-blocking push: `Full` instead of waiting.
   pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
      let mut state = self.lock();
      if state.closed {
         return Err(PushError::Closed(item));
      }
      if state.ring.is_full() {
         return Err(PushError::Full(item));
      }
      self.enqueue(&mut state, item)
   }

   /// Non-blocking pop: `Empty` while open, `Exhausted` once closed.
   pub fn try_pop(&self) -> Result<T, PopError> {
      let mut state = self.lock();
      match self.dequeue(&mut state) {
         Some(item) => Ok(item),
         None if state.closed => Err(PopError::Exhausted),
         None => Err(PopError::Empty),
      }
   }

   /// [`push`](Self::push) that gives up after `timeout` with
   /// `PushError::Timeout(item)`. Spurious wakeups do not extend the wait.
   pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<(), PushError<T>> {
      let Some(deadline) = Instant::now().checked_add(timeout) else {
         return self.push(item);
      };

      let mut state = self.lock();
      if state.closed {
         return Err(PushError::Closed(item));
      }

      while state.ring.is_full() && !state.closed {
         let now = Instant::now();
         if now >= deadline {
            return Err(PushError::Timeout(item));
         }
         let (guard, _) = self
            .not_full
            .wait_timeout(state, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
         state = guard;
      }
      if state.closed {
         return Err(PushError::Closed(item));
      }

      self.enqueue(&mut state, item)
   }

   /// [`pop`](Self::pop) that gives up after `timeout` with
   /// `PopError::Timeout`.
   pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopError> {
      let Some(deadline) = Instant::now().checked_add(timeout) else {
         return self.pop();
      };

      let mut state = self.lock();
      while state.ring.is_empty() && !state.closed {
         let now = Instant::now();
         if now >= deadline {
            return Err(PopError::Timeout);
         }
         let (guard, _) = self
            .not_empty
            .wait_timeout(state, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
         state = guard;
      }

      self.dequeue(&mut state).ok_or(PopError::Exhausted)
   }

   // Caller holds the lock and has checked `closed` and free space.
   #[inline]
   fn enqueue(&self, state: &mut State<T>, item: T) -> Result<(), PushError<T>> {
      state.ring.push_back(item).map_err(PushError::Full)?;
      self.not_empty.notify_one();
      Ok(())
   }

   #[inline]
   fn dequeue(&self, state: &mut State<T>) -> Option<T> {
      let item = state.ring.pop_front()?;
      self.not_full.notify_one();
      Some(item)
   }
}

/*──────────────────────────────  observers  ───────────────────────────────*/

impl<T> BoundedQueue<T> {
   #[inline]
   pub fn capacity(&self) -> usize {
      self.capacity
   }

   pub fn len(&self) -> usize {
      self.lock().ring.len()
   }

   pub fn is_empty(&self) -> bool {
      self.lock().ring.is_empty()
   }

   pub fn is_full(&self) -> bool {
      self.lock().ring.is_full()
   }

   pub fn is_closed(&self) -> bool {
      self.lock().closed
   }

   /// Blocking iterator over popped items. Ends once the queue is
   /// closed and drained.
   pub fn iter(&self) -> Iter<'_, T> {
      Iter { queue: self }
   }
}

impl<T> fmt::Debug for BoundedQueue<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let state = self.lock();
      f.debug_struct("BoundedQueue")
         .field("capacity", &self.capacity)
         .field("len", &state.ring.len())
         .field("closed", &state.closed)
         .finish()
   }
}

/*──────────────────────────────  iteration  ───────────────────────────────*/

pub struct Iter<'a, T> {
   queue: &'a BoundedQueue<T>,
}

impl<T> Iterator for Iter<'_, T> {
   type Item = T;

   fn next(&mut self) -> Option<T> {
      self.queue.pop().ok()
   }
}

impl<'a, T> IntoIterator for &'a BoundedQueue<T> {
   type Item = T;
   type IntoIter = Iter<'a, T>;

   fn into_iter(self) -> Iter<'a, T> {
      self.iter()
   }
}

/*──────────────────────────── trait interface ─────────────────────────────*/

impl<T: Send> ClosableQueue<T> for BoundedQueue<T> {
   fn push(&self, item: T) -> Result<(), PushError<T>> {
      BoundedQueue::push(self, item)
   }

   fn pop(&self) -> Result<T, PopError> {
      BoundedQueue::pop(self)
   }

   fn close(&self) -> bool {
      BoundedQueue::close(self)
   }

   fn is_closed(&self) -> bool {
      BoundedQueue::is_closed(self)
   }

   fn capacity(&self) -> usize {
      self.capacity
   }

   fn available(&self) -> bool {
      let state = self.lock();
      !state.closed && !state.ring.is_full()
   }

   fn empty(&self) -> bool {
      self.lock().ring.is_empty()
   }
}
