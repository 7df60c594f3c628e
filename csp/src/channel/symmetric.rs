//! Channels whose writing end is a guard too.
//!
//! Both ends of a symmetric channel can be offered in an Alternative. The
//! commitment is made by a two-member alting barrier: once both sides have
//! chosen (or directly called) the channel, the barrier completes and the
//! value is then handed over on an ordinary rendezvous channel.

use super::{one2one, Receiver, Sender};
use crate::alt::{AltHandle, Guard};
use crate::barrier::AltingBarrier;
use crate::error::PoisonError;
use crate::poison::Poisonable;

use std::cell::Cell;

/// Creates a symmetric channel.
///
/// ```
/// use fibre_csp::channel::symmetric;
/// use fibre_csp::{Alternative, Guard};
/// use std::thread;
///
/// let (tx, rx) = symmetric::<u8>();
/// let writer = thread::spawn(move || {
///   let mut alt = Alternative::new(vec![&tx as &dyn Guard]);
///   assert_eq!(alt.select(), 0);
///   tx.write(7).unwrap();
/// });
/// assert_eq!(rx.read().unwrap(), 7);
/// writer.join().unwrap();
/// ```
pub fn symmetric<T: Send + 'static>() -> (SymmetricSender<T>, SymmetricReceiver<T>) {
  let (write_side, read_side) = AltingBarrier::pair();
  let (tx, rx) = one2one();
  (
    SymmetricSender {
      barrier: write_side,
      tx,
      synced: Cell::new(false),
    },
    SymmetricReceiver {
      barrier: read_side,
      rx,
      synced: Cell::new(false),
    },
  )
}

/// The writing end of a [`symmetric`] channel.
///
/// Poisoning either end releases the peer wherever it is blocked: waiting on
/// the barrier, selecting the channel in an Alternative, or inside the data
/// hand-off. A poisoned end is always ready as a guard.
#[derive(Debug)]
pub struct SymmetricSender<T: Send + 'static> {
  barrier: AltingBarrier,
  tx: Sender<T>,
  /// Set when an Alternative selected this end, so the barrier is already
  /// crossed for the next write.
  synced: Cell<bool>,
}

/// The reading end of a [`symmetric`] channel.
#[derive(Debug)]
pub struct SymmetricReceiver<T: Send + 'static> {
  barrier: AltingBarrier,
  rx: Receiver<T>,
  synced: Cell<bool>,
}

impl<T: Send + 'static> SymmetricSender<T> {
  /// Writes a value once the reader has committed to the channel.
  ///
  /// # Errors
  ///
  /// Returns `PoisonError` if the channel is, or becomes while blocked,
  /// poisoned.
  pub fn write(&self, value: T) -> Result<(), PoisonError> {
    self.tx.core.check_poison()?;
    if !self.synced.replace(false) {
      self.barrier.sync();
    }
    self.tx.write(value)
  }

  /// `true` if the reader is already offering the channel, so a
  /// [`write`](Self::write) would not wait for it. Also `true` once poisoned.
  ///
  /// The answer may be stale by the time the caller acts on it.
  pub fn pending(&self) -> bool {
    self.tx.is_poisoned() || self.synced.get() || self.barrier.poll()
  }

  pub fn poison(&self, strength: u32) {
    self.tx.poison(strength);
    if self.tx.is_poisoned() {
      self.barrier.abort();
    }
  }

  pub fn is_poisoned(&self) -> bool {
    self.tx.is_poisoned()
  }
}

impl<T: Send + 'static> SymmetricReceiver<T> {
  /// Reads a value once the writer has committed to the channel.
  ///
  /// # Errors
  ///
  /// Returns `PoisonError` if the channel is, or becomes while blocked,
  /// poisoned.
  pub fn read(&self) -> Result<T, PoisonError> {
    self.rx.core.check_poison()?;
    if !self.synced.replace(false) {
      self.barrier.sync();
    }
    self.rx.read()
  }

  /// `true` if the writer is already offering the channel, so a
  /// [`read`](Self::read) would not wait for it. Also `true` once poisoned.
  ///
  /// The answer may be stale by the time the caller acts on it.
  pub fn pending(&self) -> bool {
    self.rx.is_poisoned() || self.synced.get() || self.barrier.poll()
  }

  pub fn poison(&self, strength: u32) {
    self.rx.poison(strength);
    if self.rx.is_poisoned() {
      self.barrier.abort();
    }
  }

  pub fn is_poisoned(&self) -> bool {
    self.rx.is_poisoned()
  }
}

impl<T: Send + 'static> Guard for SymmetricSender<T> {
  fn enable(&self, alt: &AltHandle) -> bool {
    if self.tx.is_poisoned() {
      return true;
    }
    let synced = self.barrier.enable(alt);
    self.synced.set(synced);
    synced
  }

  fn disable(&self) -> bool {
    let synced = self.barrier.disable();
    self.synced.set(synced);
    synced || self.tx.is_poisoned()
  }

  fn is_multiway(&self) -> bool {
    true
  }
}

impl<T: Send + 'static> Guard for SymmetricReceiver<T> {
  fn enable(&self, alt: &AltHandle) -> bool {
    if self.rx.is_poisoned() {
      return true;
    }
    let synced = self.barrier.enable(alt);
    self.synced.set(synced);
    synced
  }

  fn disable(&self) -> bool {
    let synced = self.barrier.disable();
    self.synced.set(synced);
    synced || self.rx.is_poisoned()
  }

  fn is_multiway(&self) -> bool {
    true
  }
}

impl<T: Send + 'static> Poisonable for SymmetricSender<T> {
  fn poison(&self, strength: u32) {
    SymmetricSender::poison(self, strength);
  }
}

impl<T: Send + 'static> Poisonable for SymmetricReceiver<T> {
  fn poison(&self, strength: u32) {
    SymmetricReceiver::poison(self, strength);
  }
}
