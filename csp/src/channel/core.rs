//! The two-party rendezvous state machine shared by every channel flavour.
//!
//! One mutex guards the buffering store, the registered Alternative and the
//! poison state. Readers wait on `readable`, writers on `writable`. The core
//! assumes at most one writer and one reader are inside it at a time; the
//! shared ends add the outer locks that make that true.

use super::filter::FilterChain;
use crate::alt::AltHandle;
use crate::buffer::{ChannelDataStore, StoreState};
use crate::error::PoisonError;
use crate::poison::PoisonState;

use parking_lot::{Condvar, Mutex, MutexGuard};

use std::fmt;

struct CoreState<T> {
  store: Box<dyn ChannelDataStore<T>>,
  /// The Alternative currently waiting on the reading end, if any.
  alt: Option<AltHandle>,
  poison: PoisonState,
  /// Values deposited / taken so far. A rendezvous writer holding ticket `n`
  /// is released once `taken >= n`.
  deposited: u64,
  taken: u64,
}

pub(crate) struct ChannelCore<T> {
  state: Mutex<CoreState<T>>,
  readable: Condvar,
  writable: Condvar,
  read_filters: FilterChain<T>,
  write_filters: FilterChain<T>,
}

impl<T> fmt::Debug for ChannelCore<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("ChannelCore")
      .field("len", &state.store.len())
      .field("state", &state.store.state())
      .field("alt_registered", &state.alt.is_some())
      .field("poison", &state.poison)
      .field("read_filters", &self.read_filters.len())
      .field("write_filters", &self.write_filters.len())
      .finish()
  }
}

impl<T: Send + 'static> ChannelCore<T> {
  pub(crate) fn new(store: Box<dyn ChannelDataStore<T>>, immunity: u32) -> Self {
    Self {
      state: Mutex::new(CoreState {
        store,
        alt: None,
        poison: PoisonState::new(immunity),
        deposited: 0,
        taken: 0,
      }),
      readable: Condvar::new(),
      writable: Condvar::new(),
      read_filters: FilterChain::default(),
      write_filters: FilterChain::default(),
    }
  }

  pub(crate) fn with_filters(mut self, read: FilterChain<T>, write: FilterChain<T>) -> Self {
    self.read_filters = read;
    self.write_filters = write;
    self
  }

  /// Deposits `value`, blocking while the store is full and, for rendezvous
  /// stores, until the reader has taken it.
  pub(crate) fn write(&self, value: T) -> Result<(), PoisonError> {
    let value = self.write_filters.apply(value);
    let mut state = self.state.lock();

    // --- Phase 1: Wait for the policy to accept ---
    loop {
      state.poison.check()?;
      if state.store.state() != StoreState::Full {
        break;
      }
      self.writable.wait(&mut state);
    }

    // --- Phase 2: Deposit and wake the reading side ---
    state.store.put(value);
    state.deposited += 1;
    let ticket = state.deposited;
    match &state.alt {
      Some(alt) => alt.schedule(),
      None => {
        self.readable.notify_one();
      }
    }

    // --- Phase 3: Rendezvous hand-off ---
    if state.store.is_rendezvous() {
      while state.taken < ticket {
        state.poison.check()?;
        self.writable.wait(&mut state);
      }
    }
    Ok(())
  }

  pub(crate) fn read(&self) -> Result<T, PoisonError> {
    let value = {
      let mut state = self.state.lock();
      let value = self.wait_for_value(&mut state)?;
      self.release_writer(&mut state);
      value
    };
    Ok(self.read_filters.apply(value))
  }

  /// Removes the next value without releasing a rendezvous writer. Must be
  /// paired with [`complete_read`](Self::complete_read).
  pub(crate) fn take(&self) -> Result<T, PoisonError> {
    let value = self.wait_for_value(&mut self.state.lock())?;
    Ok(self.read_filters.apply(value))
  }

  /// Finishes a read started by [`take`](Self::take): releases a rendezvous
  /// writer, or a writer blocked on a full buffer.
  pub(crate) fn complete_read(&self) {
    let mut state = self.state.lock();
    self.release_writer(&mut state);
  }

  fn wait_for_value(&self, state: &mut MutexGuard<'_, CoreState<T>>) -> Result<T, PoisonError> {
    loop {
      state.poison.check()?;
      if let Some(value) = state.store.get() {
        return Ok(value);
      }
      self.readable.wait(state);
    }
  }

  fn release_writer(&self, state: &mut MutexGuard<'_, CoreState<T>>) {
    state.taken += 1;
    // Broadcast: a writer waiting for its hand-off and one waiting for room
    // share this condition.
    self.writable.notify_all();
  }

  /// `true` if a read would not block right now. Stale as soon as it returns
  /// if other writers are active.
  pub(crate) fn pending(&self) -> bool {
    let state = self.state.lock();
    state.poison.is_poisoned() || !state.store.is_empty()
  }

  pub(crate) fn len(&self) -> usize {
    self.state.lock().store.len()
  }

  pub(crate) fn immunity(&self) -> u32 {
    self.state.lock().poison.immunity()
  }

  pub(crate) fn is_poisoned(&self) -> bool {
    self.state.lock().poison.is_poisoned()
  }

  pub(crate) fn check_poison(&self) -> Result<(), PoisonError> {
    self.state.lock().poison.check()
  }

  pub(crate) fn poison(&self, strength: u32) {
    let mut state = self.state.lock();
    if state.poison.apply(strength, "channel") {
      self.readable.notify_all();
      self.writable.notify_all();
      if let Some(alt) = &state.alt {
        alt.schedule();
      }
    }
  }

  // --- Guard support for the reading end ---

  pub(crate) fn reader_enable(&self, alt: &AltHandle) -> bool {
    let mut state = self.state.lock();
    if state.poison.is_poisoned() || !state.store.is_empty() {
      return true;
    }
    if let Some(current) = &state.alt {
      assert!(
        current.same_as(alt),
        "channel input is already enabled by another Alternative"
      );
    }
    state.alt = Some(alt.clone());
    false
  }

  pub(crate) fn reader_disable(&self) -> bool {
    let mut state = self.state.lock();
    state.alt = None;
    state.poison.is_poisoned() || !state.store.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::buffer::{Buffer, ZeroBuffer};

  use std::sync::Arc;
  use std::thread;
  use std::time::Duration;

  #[test]
  fn rendezvous_writer_waits_for_taker() {
    let core = Arc::new(ChannelCore::new(Box::new(ZeroBuffer::<i32>::new()), 0));
    let writer_core = Arc::clone(&core);
    let writer = thread::spawn(move || writer_core.write(5));

    thread::sleep(Duration::from_millis(50));
    assert!(!writer.is_finished(), "rendezvous write returned before the read");
    assert!(core.pending());

    assert_eq!(core.read().unwrap(), 5);
    writer.join().unwrap().unwrap();
    assert!(!core.pending());
  }

  #[test]
  fn split_read_holds_writer_until_completed() {
    let core = Arc::new(ChannelCore::new(Box::new(ZeroBuffer::<&str>::new()), 0));
    let writer_core = Arc::clone(&core);
    let writer = thread::spawn(move || writer_core.write("x"));

    assert_eq!(core.take().unwrap(), "x");
    thread::sleep(Duration::from_millis(50));
    assert!(!writer.is_finished(), "writer released before the read completed");

    core.complete_read();
    writer.join().unwrap().unwrap();
  }

  #[test]
  fn buffered_write_blocks_only_when_full() {
    let core = ChannelCore::new(Box::new(Buffer::<i32>::new(2).unwrap()), 0);
    core.write(1).unwrap();
    core.write(2).unwrap();
    assert_eq!(core.len(), 2);
    assert_eq!(core.read().unwrap(), 1);
    core.write(3).unwrap();
    assert_eq!(core.read().unwrap(), 2);
    assert_eq!(core.read().unwrap(), 3);
  }

  #[test]
  fn poison_wakes_blocked_reader() {
    let core = Arc::new(ChannelCore::<u8>::new(Box::new(ZeroBuffer::new()), 0));
    let reader_core = Arc::clone(&core);
    let reader = thread::spawn(move || reader_core.read());

    thread::sleep(Duration::from_millis(20));
    core.poison(3);
    assert_eq!(reader.join().unwrap().unwrap_err().strength(), 3);
    assert!(core.is_poisoned());
  }
}
