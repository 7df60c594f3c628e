//! Channel end handles.
//!
//! `Sender`/`Receiver` are the single-owner ends of a one-to-one channel (and
//! the unshared halves of any-to-one / one-to-any channels). `SharedSender`
//! and `SharedReceiver` can be cloned and handed to many processes; an outer
//! mutex per direction lets exactly one of them at a time into the channel
//! core. Contention is resolved in the lock's admission order, which is fair
//! in practice but not strictly FIFO.

use super::core::ChannelCore;
use crate::alt::{AltHandle, Guard};
use crate::error::PoisonError;
use crate::poison::Poisonable;

use parking_lot::Mutex;

use std::fmt;
use std::sync::Arc;

/// Runs `complete_read` when an extended read ends, even if its body panics.
struct ExtendedRead<'a, T: Send + 'static> {
  core: &'a ChannelCore<T>,
}

impl<T: Send + 'static> Drop for ExtendedRead<'_, T> {
  fn drop(&mut self) {
    self.core.complete_read();
  }
}

fn extended_read<T, R, F>(core: &ChannelCore<T>, action: F) -> Result<R, PoisonError>
where
  T: Send + 'static,
  F: FnOnce(T) -> R,
{
  let value = core.take()?;
  let _release = ExtendedRead { core };
  Ok(action(value))
}

// --- One-to-one ends ---

/// The writing end of a channel, owned by a single process.
pub struct Sender<T: Send + 'static> {
  pub(crate) core: Arc<ChannelCore<T>>,
}

/// The reading end of a channel, owned by a single process.
///
/// A `Receiver` is a [`Guard`]: it is ready when a read would not block
/// (a value is available, or the channel is poisoned).
pub struct Receiver<T: Send + 'static> {
  pub(crate) core: Arc<ChannelCore<T>>,
}

impl<T: Send + 'static> fmt::Debug for Sender<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender").field("core", &self.core).finish()
  }
}

impl<T: Send + 'static> fmt::Debug for Receiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver").field("core", &self.core).finish()
  }
}

impl<T: Send + 'static> Sender<T> {
  /// Writes a value, blocking until the channel's buffering policy accepts it
  /// and, for an unbuffered channel, until the reader has taken it.
  ///
  /// # Errors
  ///
  /// Returns `PoisonError` if the channel is, or becomes while blocked,
  /// poisoned.
  pub fn write(&self, value: T) -> Result<(), PoisonError> {
    self.core.write(value)
  }

  /// Poisons the channel if `strength` exceeds its immunity.
  pub fn poison(&self, strength: u32) {
    self.core.poison(strength);
  }

  pub fn immunity(&self) -> u32 {
    self.core.immunity()
  }

  pub fn is_poisoned(&self) -> bool {
    self.core.is_poisoned()
  }
}

impl<T: Send + 'static> Receiver<T> {
  /// Reads the next value, blocking until one is available.
  ///
  /// # Errors
  ///
  /// Returns `PoisonError` if the channel is, or becomes while blocked,
  /// poisoned.
  pub fn read(&self) -> Result<T, PoisonError> {
    self.core.read()
  }

  /// Reads a value and runs `action` on it before the writer is released.
  ///
  /// On an unbuffered channel the writer stays blocked until `action`
  /// returns, which lets a process forward a value down a pipeline without
  /// the upstream writer running ahead.
  pub fn read_extended<R>(&self, action: impl FnOnce(T) -> R) -> Result<R, PoisonError> {
    extended_read(&self.core, action)
  }

  /// `true` if [`read`](Self::read) would return without blocking.
  ///
  /// The answer may be stale by the time the caller acts on it.
  pub fn pending(&self) -> bool {
    self.core.pending()
  }

  /// Number of buffered values (0 or 1 for an unbuffered channel).
  pub fn len(&self) -> usize {
    self.core.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Poisons the channel if `strength` exceeds its immunity.
  pub fn poison(&self, strength: u32) {
    self.core.poison(strength);
  }

  pub fn immunity(&self) -> u32 {
    self.core.immunity()
  }

  pub fn is_poisoned(&self) -> bool {
    self.core.is_poisoned()
  }
}

impl<T: Send + 'static> Guard for Receiver<T> {
  fn enable(&self, alt: &AltHandle) -> bool {
    self.core.reader_enable(alt)
  }

  fn disable(&self) -> bool {
    self.core.reader_disable()
  }
}

impl<T: Send + 'static> Poisonable for Sender<T> {
  fn poison(&self, strength: u32) {
    Sender::poison(self, strength);
  }
}

impl<T: Send + 'static> Poisonable for Receiver<T> {
  fn poison(&self, strength: u32) {
    Receiver::poison(self, strength);
  }
}

// --- Shared ends ---

/// A cloneable writing end. Concurrent writers are serialised: one at a time
/// performs the full write protocol while the others wait on entry.
pub struct SharedSender<T: Send + 'static> {
  pub(crate) core: Arc<ChannelCore<T>>,
  pub(crate) write_lock: Arc<Mutex<()>>,
}

/// A cloneable reading end. Concurrent readers are serialised. Shared
/// readers cannot take part in an [`Alternative`](crate::alt::Alternative).
pub struct SharedReceiver<T: Send + 'static> {
  pub(crate) core: Arc<ChannelCore<T>>,
  pub(crate) read_lock: Arc<Mutex<()>>,
}

impl<T: Send + 'static> Clone for SharedSender<T> {
  fn clone(&self) -> Self {
    Self {
      core: Arc::clone(&self.core),
      write_lock: Arc::clone(&self.write_lock),
    }
  }
}

impl<T: Send + 'static> Clone for SharedReceiver<T> {
  fn clone(&self) -> Self {
    Self {
      core: Arc::clone(&self.core),
      read_lock: Arc::clone(&self.read_lock),
    }
  }
}

impl<T: Send + 'static> fmt::Debug for SharedSender<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SharedSender").field("core", &self.core).finish()
  }
}

impl<T: Send + 'static> fmt::Debug for SharedReceiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SharedReceiver").field("core", &self.core).finish()
  }
}

impl<T: Send + 'static> SharedSender<T> {
  /// Writes a value once no other writer on this channel is mid-write.
  /// See [`Sender::write`].
  pub fn write(&self, value: T) -> Result<(), PoisonError> {
    let _writer = self.write_lock.lock();
    self.core.write(value)
  }

  /// Poisons the channel. Does not wait for the writer lock, so a writer
  /// blocked inside the channel is released with the poison.
  pub fn poison(&self, strength: u32) {
    self.core.poison(strength);
  }

  pub fn immunity(&self) -> u32 {
    self.core.immunity()
  }

  pub fn is_poisoned(&self) -> bool {
    self.core.is_poisoned()
  }
}

impl<T: Send + 'static> SharedReceiver<T> {
  /// Reads a value once no other reader on this channel is mid-read.
  /// See [`Receiver::read`].
  pub fn read(&self) -> Result<T, PoisonError> {
    let _reader = self.read_lock.lock();
    self.core.read()
  }

  /// See [`Receiver::read_extended`]. Other readers stay locked out until
  /// `action` returns.
  pub fn read_extended<R>(&self, action: impl FnOnce(T) -> R) -> Result<R, PoisonError> {
    let _reader = self.read_lock.lock();
    extended_read(&self.core, action)
  }

  /// `true` if a value is buffered or the channel is poisoned. Does not take
  /// the reader lock, so another clone may consume the value first.
  pub fn pending(&self) -> bool {
    self.core.pending()
  }

  /// Poisons the channel. Does not wait for the reader lock.
  pub fn poison(&self, strength: u32) {
    self.core.poison(strength);
  }

  pub fn immunity(&self) -> u32 {
    self.core.immunity()
  }

  pub fn is_poisoned(&self) -> bool {
    self.core.is_poisoned()
  }
}

impl<T: Send + 'static> Poisonable for SharedSender<T> {
  fn poison(&self, strength: u32) {
    SharedSender::poison(self, strength);
  }
}

impl<T: Send + 'static> Poisonable for SharedReceiver<T> {
  fn poison(&self, strength: u32) {
    SharedReceiver::poison(self, strength);
  }
}
