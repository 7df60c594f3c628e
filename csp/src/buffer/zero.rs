use super::{ChannelDataStore, StoreState};

/// The rendezvous policy: a single hand-off slot.
///
/// A deposited value makes the store `Full` until the reader takes it, and
/// the writer is held until then.
#[derive(Debug)]
pub struct ZeroBuffer<T> {
  slot: Option<T>,
}

impl<T> ZeroBuffer<T> {
  pub fn new() -> Self {
    Self { slot: None }
  }
}

impl<T> Default for ZeroBuffer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Send + 'static> ChannelDataStore<T> for ZeroBuffer<T> {
  fn put(&mut self, value: T) {
    debug_assert!(self.slot.is_none(), "rendezvous slot already occupied");
    self.slot = Some(value);
  }

  fn get(&mut self) -> Option<T> {
    self.slot.take()
  }

  fn state(&self) -> StoreState {
    if self.slot.is_some() {
      StoreState::Full
    } else {
      StoreState::Empty
    }
  }

  fn len(&self) -> usize {
    self.slot.is_some() as usize
  }

  fn clear(&mut self) {
    self.slot = None;
  }

  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>> {
    Box::new(ZeroBuffer::new())
  }

  fn is_rendezvous(&self) -> bool {
    true
  }
}
