// src/channel/mod.rs

//! Synchronous CSP channels.
//!
//! Every channel is a single shared core plus a buffering policy.
//! Arity is expressed by the kind of end handles returned:
//!
//! | constructor | writing end      | reading end      |
//! |-------------|------------------|------------------|
//! | `one2one`   | [`Sender`]       | [`Receiver`]     |
//! | `any2one`   | [`SharedSender`] | [`Receiver`]     |
//! | `one2any`   | [`Sender`]       | [`SharedReceiver`] |
//! | `any2any`   | [`SharedSender`] | [`SharedReceiver`] |
//!
//! Only the single-owner [`Receiver`] can be used as a guard in an
//! [`Alternative`](crate::alt::Alternative). For a channel whose writing end
//! is also a guard, see [`symmetric`].
//!
//! Channels have no notion of closing. A process network is shut down by
//! [poisoning](Sender::poison) its channels.

mod config;
mod core;
mod ends;
mod filter;
mod symmetric;

pub use config::ChannelConfig;
pub use ends::{Receiver, Sender, SharedReceiver, SharedSender};
pub use filter::Filter;
pub use symmetric::{symmetric, SymmetricReceiver, SymmetricSender};

use self::core::ChannelCore;
use self::filter::FilterChain;
use crate::buffer::{BufferPolicy, ChannelDataStore, ZeroBuffer};
use crate::error::BufferSizeError;

use parking_lot::Mutex;

use std::fmt;
use std::sync::Arc;

// --- Channel Constructors ---

/// Creates an unbuffered one-to-one channel.
pub fn one2one<T: Send + 'static>() -> (Sender<T>, Receiver<T>) {
  ChannelBuilder::new().one2one()
}

/// Creates an unbuffered channel with any number of writers and one reader.
pub fn any2one<T: Send + 'static>() -> (SharedSender<T>, Receiver<T>) {
  ChannelBuilder::new().any2one()
}

/// Creates an unbuffered channel with one writer and any number of readers.
pub fn one2any<T: Send + 'static>() -> (Sender<T>, SharedReceiver<T>) {
  ChannelBuilder::new().one2any()
}

/// Creates an unbuffered channel with any number of writers and readers.
pub fn any2any<T: Send + 'static>() -> (SharedSender<T>, SharedReceiver<T>) {
  ChannelBuilder::new().any2any()
}

/// Configures and creates channels.
///
/// The builder holds a template store; each channel it creates gets a fresh,
/// empty store of the same structure, so one builder can stamp out arrays of
/// independent channels.
///
/// ```
/// use fibre_csp::buffer::BufferPolicy;
/// use fibre_csp::channel::ChannelBuilder;
///
/// let builder = ChannelBuilder::<u32>::new()
///   .policy(BufferPolicy::Fifo { capacity: 2 })
///   .unwrap()
///   .immunity(1);
/// let (tx, rx) = builder.one2one();
/// tx.write(1).unwrap();
/// tx.write(2).unwrap();
/// assert_eq!(rx.read().unwrap(), 1);
/// ```
pub struct ChannelBuilder<T: Send + 'static> {
  store: Box<dyn ChannelDataStore<T>>,
  immunity: u32,
  read_filters: FilterChain<T>,
  write_filters: FilterChain<T>,
}

impl<T: Send + 'static> fmt::Debug for ChannelBuilder<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelBuilder")
      .field("rendezvous", &self.store.is_rendezvous())
      .field("immunity", &self.immunity)
      .field("read_filters", &self.read_filters)
      .field("write_filters", &self.write_filters)
      .finish()
  }
}

impl<T: Send + 'static> Default for ChannelBuilder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Send + 'static> ChannelBuilder<T> {
  /// An unbuffered, non-immune channel template.
  pub fn new() -> Self {
    Self {
      store: Box::new(ZeroBuffer::new()),
      immunity: 0,
      read_filters: FilterChain::default(),
      write_filters: FilterChain::default(),
    }
  }

  pub fn from_config(config: &ChannelConfig) -> Result<Self, BufferSizeError> {
    Ok(Self {
      store: config.policy.build()?,
      immunity: config.immunity,
      read_filters: FilterChain::default(),
      write_filters: FilterChain::default(),
    })
  }

  /// Uses one of the built-in buffering policies.
  pub fn policy(mut self, policy: BufferPolicy) -> Result<Self, BufferSizeError> {
    self.store = policy.build()?;
    Ok(self)
  }

  /// Uses a custom buffering store as the template.
  pub fn store(mut self, store: impl ChannelDataStore<T> + 'static) -> Self {
    self.store = Box::new(store);
    self
  }

  /// Poison at or below `immunity` will be ignored by created channels.
  pub fn immunity(mut self, immunity: u32) -> Self {
    self.immunity = immunity;
    self
  }

  /// Adds a filter applied to every value a reader takes, after any read
  /// filters added before it.
  pub fn read_filter(mut self, filter: impl Filter<T> + 'static) -> Self {
    self.read_filters.push(Arc::new(filter));
    self
  }

  /// Adds a filter applied to every value written, before it enters the
  /// channel. Runs after any write filters added before it.
  pub fn write_filter(mut self, filter: impl Filter<T> + 'static) -> Self {
    self.write_filters.push(Arc::new(filter));
    self
  }

  fn core(&self) -> Arc<ChannelCore<T>> {
    let core = ChannelCore::new(self.store.clone_empty(), self.immunity)
      .with_filters(self.read_filters.clone(), self.write_filters.clone());
    Arc::new(core)
  }

  pub fn one2one(&self) -> (Sender<T>, Receiver<T>) {
    let core = self.core();
    (
      Sender {
        core: Arc::clone(&core),
      },
      Receiver { core },
    )
  }

  pub fn any2one(&self) -> (SharedSender<T>, Receiver<T>) {
    let core = self.core();
    (
      SharedSender {
        core: Arc::clone(&core),
        write_lock: Arc::new(Mutex::new(())),
      },
      Receiver { core },
    )
  }

  pub fn one2any(&self) -> (Sender<T>, SharedReceiver<T>) {
    let core = self.core();
    (
      Sender {
        core: Arc::clone(&core),
      },
      SharedReceiver {
        core,
        read_lock: Arc::new(Mutex::new(())),
      },
    )
  }

  pub fn any2any(&self) -> (SharedSender<T>, SharedReceiver<T>) {
    let core = self.core();
    (
      SharedSender {
        core: Arc::clone(&core),
        write_lock: Arc::new(Mutex::new(())),
      },
      SharedReceiver {
        core,
        read_lock: Arc::new(Mutex::new(())),
      },
    )
  }

  // --- Arrays, for fan-out / fan-in topologies ---

  pub fn one2one_array(&self, n: usize) -> Vec<(Sender<T>, Receiver<T>)> {
    (0..n).map(|_| self.one2one()).collect()
  }

  pub fn any2one_array(&self, n: usize) -> Vec<(SharedSender<T>, Receiver<T>)> {
    (0..n).map(|_| self.any2one()).collect()
  }

  pub fn one2any_array(&self, n: usize) -> Vec<(Sender<T>, SharedReceiver<T>)> {
    (0..n).map(|_| self.one2any()).collect()
  }

  pub fn any2any_array(&self, n: usize) -> Vec<(SharedSender<T>, SharedReceiver<T>)> {
    (0..n).map(|_| self.any2any()).collect()
  }
}

/// Integer-payload channels.
///
/// Channels are generic, so an `i32` channel is already monomorphised to a
/// specialised copy; this module only names it.
pub mod ints {
  use super::{ChannelBuilder, Receiver, Sender, SharedReceiver, SharedSender};

  pub type IntSender = Sender<i32>;
  pub type IntReceiver = Receiver<i32>;
  pub type SharedIntSender = SharedSender<i32>;
  pub type SharedIntReceiver = SharedReceiver<i32>;
  pub type IntChannelBuilder = ChannelBuilder<i32>;

  pub fn one2one() -> (IntSender, IntReceiver) {
    super::one2one()
  }

  pub fn any2one() -> (SharedIntSender, IntReceiver) {
    super::any2one()
  }

  pub fn one2any() -> (IntSender, SharedIntReceiver) {
    super::one2any()
  }

  pub fn any2any() -> (SharedIntSender, SharedIntReceiver) {
    super::any2any()
  }
}

#[cfg(test)]
mod tests;
