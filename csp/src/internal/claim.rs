use parking_lot::{Condvar, Mutex};

/// A binary ownership token that, unlike a mutex guard, can be taken in one
/// call and given back in a later one, from any handle sharing it.
#[derive(Debug, Default)]
pub(crate) struct Claim {
  held: Mutex<bool>,
  freed: Condvar,
}

impl Claim {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Blocks until the claim is free, then takes it.
  pub(crate) fn claim(&self) {
    let mut held = self.held.lock();
    while *held {
      self.freed.wait(&mut held);
    }
    *held = true;
  }

  pub(crate) fn release(&self) {
    let mut held = self.held.lock();
    debug_assert!(*held, "releasing a claim that is not held");
    *held = false;
    self.freed.notify_one();
  }
}
