use super::{ChannelDataStore, StoreState};
use crate::error::BufferSizeError;

use std::collections::VecDeque;

/// Unbounded FIFO. In reality, bounded by available memory.
#[derive(Debug)]
pub struct InfiniteBuffer<T> {
  items: VecDeque<T>,
  initial_capacity: usize,
}

impl<T> InfiniteBuffer<T> {
  pub fn new() -> Self {
    Self {
      items: VecDeque::with_capacity(super::DEFAULT_INFINITE_CAPACITY),
      initial_capacity: super::DEFAULT_INFINITE_CAPACITY,
    }
  }

  /// Creates an unbounded buffer whose first allocation holds
  /// `initial_capacity` values.
  pub fn with_capacity(initial_capacity: usize) -> Result<Self, BufferSizeError> {
    if initial_capacity == 0 {
      return Err(BufferSizeError::new("infinite"));
    }
    Ok(Self {
      items: VecDeque::with_capacity(initial_capacity),
      initial_capacity,
    })
  }
}

impl<T> Default for InfiniteBuffer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for InfiniteBuffer<T> {
  fn put(&mut self, value: T) {
    self.items.push_back(value);
  }

  fn get(&mut self) -> Option<T> {
    self.items.pop_front()
  }

  fn state(&self) -> StoreState {
    if self.items.is_empty() {
      StoreState::Empty
    } else {
      StoreState::Partial
    }
  }

  fn len(&self) -> usize {
    self.items.len()
  }

  fn clear(&mut self) {
    self.items.clear();
  }

  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>> {
    Box::new(InfiniteBuffer {
      items: VecDeque::with_capacity(self.initial_capacity),
      initial_capacity: self.initial_capacity,
    })
  }
}
