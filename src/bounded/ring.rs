// Fixed-capacity circular buffer
//
// Plain (non-atomic) head/tail/count ring. It is only ever touched through
// the queue's mutex, so nothing here synchronizes on its own.

use std::collections::TryReserveError;

/*──────────────────────────────────────────────────────────────────────────*/
/*  Ring                                                                    */
/*──────────────────────────────────────────────────────────────────────────*/

pub(crate) struct Ring<T> {
   buf  : Box<[Option<T>]>, // `None` outside the live window
   head : usize,            // oldest live slot
   tail : usize,            // next slot to write
   count: usize,            // live slots, 0..=buf.len()
}

impl<T> Ring<T> {
   /// Allocates `cap` empty slots without aborting on allocation failure.
   pub(crate) fn try_new(cap: usize) -> Result<Self, TryReserveError> {
      debug_assert!(cap > 0);

      let mut slots = Vec::new();
      slots.try_reserve_exact(cap)?;
      slots.resize_with(cap, || None);

      Ok(Self {
         buf  : slots.into_boxed_slice(),
         head : 0,
         tail : 0,
         count: 0,
      })
   }

   #[inline]
   pub(crate) fn capacity(&self) -> usize {
      self.buf.len()
   }

   #[inline]
   pub(crate) fn len(&self) -> usize {
      self.count
   }

   #[inline]
   pub(crate) fn is_empty(&self) -> bool {
      self.count == 0
   }

   #[inline]
   pub(crate) fn is_full(&self) -> bool {
      self.count == self.buf.len()
   }

   #[inline]
   fn advance(&self, i: usize) -> usize {
      (i + 1) % self.buf.len()
   }

   /// Writes at `tail`. Hands the item back when every slot is live.
   pub(crate) fn push_back(&mut self, item: T) -> Result<(), T> {
      if self.is_full() {
         return Err(item);
      }
      debug_assert!(self.buf[self.tail].is_none());
      self.buf[self.tail] = Some(item);
      self.tail = self.advance(self.tail);
      self.count += 1;
      Ok(())
   }

   /// Takes the slot at `head`, leaving `None` behind.
   pub(crate) fn pop_front(&mut self) -> Option<T> {
      if self.is_empty() {
         return None;
      }
      let item = self.buf[self.head].take();
      debug_assert!(item.is_some());
      self.head = self.advance(self.head);
      self.count -= 1;
      item
   }
}
