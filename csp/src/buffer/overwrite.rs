//! Lossy policies that never block a writer: when full, an unread value is
//! replaced instead.

use super::{ChannelDataStore, StoreState};
use crate::error::BufferSizeError;

use std::collections::VecDeque;

fn ring<T>(capacity: usize, kind: &'static str) -> Result<VecDeque<T>, BufferSizeError> {
  if capacity == 0 {
    return Err(BufferSizeError::new(kind));
  }
  Ok(VecDeque::with_capacity(capacity))
}

#[inline]
fn occupancy(len: usize) -> StoreState {
  if len == 0 {
    StoreState::Empty
  } else {
    StoreState::Partial
  }
}

/// When full, a write replaces the most recently written unread value.
///
/// The reader therefore always sees the latest value, preceded by at most
/// `capacity - 1` older ones in FIFO order.
#[derive(Debug)]
pub struct OverwriteNewestBuffer<T> {
  items: VecDeque<T>,
  capacity: usize,
}

impl<T> OverwriteNewestBuffer<T> {
  pub fn new(capacity: usize) -> Result<Self, BufferSizeError> {
    Ok(Self {
      items: ring(capacity, "overwrite-newest")?,
      capacity,
    })
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for OverwriteNewestBuffer<T> {
  fn put(&mut self, value: T) {
    if self.items.len() == self.capacity {
      if let Some(last) = self.items.back_mut() {
        *last = value;
      }
    } else {
      self.items.push_back(value);
    }
  }

  fn get(&mut self) -> Option<T> {
    self.items.pop_front()
  }

  fn state(&self) -> StoreState {
    occupancy(self.items.len())
  }

  fn len(&self) -> usize {
    self.items.len()
  }

  fn clear(&mut self) {
    self.items.clear();
  }

  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>> {
    Box::new(OverwriteNewestBuffer {
      items: VecDeque::with_capacity(self.capacity),
      capacity: self.capacity,
    })
  }
}

/// When full, a write drops the oldest unread value to make room.
///
/// The reader sees the most recent `capacity` values in FIFO order.
#[derive(Debug)]
pub struct OverwriteOldestBuffer<T> {
  items: VecDeque<T>,
  capacity: usize,
}

impl<T> OverwriteOldestBuffer<T> {
  pub fn new(capacity: usize) -> Result<Self, BufferSizeError> {
    Ok(Self {
      items: ring(capacity, "overwrite-oldest")?,
      capacity,
    })
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for OverwriteOldestBuffer<T> {
  fn put(&mut self, value: T) {
    if self.items.len() == self.capacity {
      self.items.pop_front();
    }
    self.items.push_back(value);
  }

  fn get(&mut self) -> Option<T> {
    self.items.pop_front()
  }

  fn state(&self) -> StoreState {
    occupancy(self.items.len())
  }

  fn len(&self) -> usize {
    self.items.len()
  }

  fn clear(&mut self) {
    self.items.clear();
  }

  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>> {
    Box::new(OverwriteOldestBuffer {
      items: VecDeque::with_capacity(self.capacity),
      capacity: self.capacity,
    })
  }
}
