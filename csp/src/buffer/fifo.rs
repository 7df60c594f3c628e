use super::{ChannelDataStore, StoreState};
use crate::error::BufferSizeError;

use std::collections::VecDeque;

/// Bounded FIFO policy. Writers block while `capacity` values are unread.
#[derive(Debug)]
pub struct Buffer<T> {
  items: VecDeque<T>,
  capacity: usize,
}

impl<T> Buffer<T> {
  /// Creates a FIFO buffer holding up to `capacity` values.
  ///
  /// # Errors
  ///
  /// Returns `BufferSizeError` if `capacity` is 0. Use
  /// [`ZeroBuffer`](super::ZeroBuffer) for an unbuffered channel.
  pub fn new(capacity: usize) -> Result<Self, BufferSizeError> {
    if capacity == 0 {
      return Err(BufferSizeError::new("fifo"));
    }
    Ok(Self {
      items: VecDeque::with_capacity(capacity),
      capacity,
    })
  }

  /// A one-slot buffer, which lets a writer run one value ahead of its reader.
  pub fn single() -> Self {
    Self {
      items: VecDeque::with_capacity(1),
      capacity: 1,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for Buffer<T> {
  fn put(&mut self, value: T) {
    debug_assert!(self.items.len() < self.capacity, "put into a full fifo buffer");
    self.items.push_back(value);
  }

  fn get(&mut self) -> Option<T> {
    self.items.pop_front()
  }

  fn state(&self) -> StoreState {
    match self.items.len() {
      0 => StoreState::Empty,
      n if n >= self.capacity => StoreState::Full,
      _ => StoreState::Partial,
    }
  }

  fn len(&self) -> usize {
    self.items.len()
  }

  fn clear(&mut self) {
    self.items.clear();
  }

  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>> {
    Box::new(Buffer {
      items: VecDeque::with_capacity(self.capacity),
      capacity: self.capacity,
    })
  }
}
