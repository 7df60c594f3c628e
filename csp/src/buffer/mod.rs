//! Pluggable buffering policies for channels.
//!
//! A channel owns exactly one [`ChannelDataStore`] and consults it, under the
//! channel's lock, to decide whether a writer may deposit a value, whether a
//! reader can take one, and whether the writer must additionally wait for the
//! hand-off (rendezvous). Stores never synchronise on their own.
//!
//! When a store is used as a template (for example by
//! [`ChannelBuilder`](crate::channel::ChannelBuilder) creating an array of
//! channels), only its structure is copied through
//! [`ChannelDataStore::clone_empty`]; buffered data is never shared between
//! channel instances.

mod fifo;
mod infinite;
mod overflow;
mod overwrite;
mod zero;

pub use fifo::Buffer;
pub use infinite::InfiniteBuffer;
pub use overflow::OverflowingBuffer;
pub use overwrite::{OverwriteNewestBuffer, OverwriteOldestBuffer};
pub use zero::ZeroBuffer;

use crate::error::BufferSizeError;

/// The occupancy of a store as seen by the channel protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
  /// Nothing to read.
  Empty,
  /// Something to read, and room for a writer.
  Partial,
  /// Something to read and no room: a writer must wait.
  Full,
}

/// The contract between a channel and its buffering policy.
///
/// Implementations may be supplied from outside the crate. All methods are
/// called with the owning channel's lock held, so they must not block.
pub trait ChannelDataStore<T>: Send {
  /// Deposits a value. Only called when [`state`](Self::state) is not
  /// [`StoreState::Full`].
  fn put(&mut self, value: T);

  /// Removes the next value to be read, if any.
  fn get(&mut self) -> Option<T>;

  /// Current occupancy.
  fn state(&self) -> StoreState;

  /// Number of values currently held.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Discards every held value.
  fn clear(&mut self);

  /// A fresh, empty store with the same structure (kind and capacity).
  fn clone_empty(&self) -> Box<dyn ChannelDataStore<T>>;

  /// `true` if a writer must wait until its value has been taken, not just
  /// deposited.
  fn is_rendezvous(&self) -> bool {
    false
  }
}

const DEFAULT_INFINITE_CAPACITY: usize = 8;

#[cfg(feature = "serde")]
fn default_infinite_capacity() -> usize {
  DEFAULT_INFINITE_CAPACITY
}

/// A serialisable description of one of the built-in buffering policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BufferPolicy {
  /// Pure rendezvous: the writer waits until the reader has taken the value.
  #[default]
  Zero,
  /// Bounded FIFO; the writer blocks while the buffer is full.
  Fifo { capacity: usize },
  /// When full, the newest unread value is replaced.
  OverwriteNewest { capacity: usize },
  /// When full, the oldest unread value is dropped to make room.
  OverwriteOldest { capacity: usize },
  /// When full, the value being written is dropped.
  Overflow { capacity: usize },
  /// Never full; grows as needed.
  Infinite {
    #[cfg_attr(feature = "serde", serde(default = "default_infinite_capacity"))]
    initial_capacity: usize,
  },
}

impl BufferPolicy {
  /// An unbounded policy with the default initial allocation.
  pub fn infinite() -> Self {
    BufferPolicy::Infinite {
      initial_capacity: DEFAULT_INFINITE_CAPACITY,
    }
  }

  /// Builds an empty store implementing this policy.
  pub fn build<T: Send + 'static>(&self) -> Result<Box<dyn ChannelDataStore<T>>, BufferSizeError> {
    Ok(match *self {
      BufferPolicy::Zero => Box::new(ZeroBuffer::new()),
      BufferPolicy::Fifo { capacity } => Box::new(Buffer::new(capacity)?),
      BufferPolicy::OverwriteNewest { capacity } => Box::new(OverwriteNewestBuffer::new(capacity)?),
      BufferPolicy::OverwriteOldest { capacity } => Box::new(OverwriteOldestBuffer::new(capacity)?),
      BufferPolicy::Overflow { capacity } => Box::new(OverflowingBuffer::new(capacity)?),
      BufferPolicy::Infinite { initial_capacity } => Box::new(InfiniteBuffer::with_capacity(initial_capacity)?),
    })
  }
}
