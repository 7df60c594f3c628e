use super::{ChannelDataStore, StoreState};
use crate::error::BufferSizeError;

use std::collections::VecDeque;

/// When full, the value being written is discarded. Writers never block.
#[derive(Debug)]
pub struct OverflowingBuffer<T> {
  items: VecDeque<T>,
  capacity: usize,
}

impl<T> OverflowingBuffer<T> {
  pub fn new(capacity: usize) -> Result<Self, BufferSizeError> {
    if capacity == 0 {
      return Err(BufferSizeError::new("overflowing"));
    }
    Ok(Self {
      items: VecDeque::with_capacity(capacity),
      capacity,
    })
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for OverflowingBuffer<T> {
  fn put(&mut self, value: T) {
    if self.items.len() < self.capacity {
      self.items.push_back(value);
    }
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
    Box::new(OverflowingBuffer {
      items: VecDeque::with_capacity(self.capacity),
      capacity: self.capacity,
    })
  }
}
