// src/error.rs

use thiserror::Error;

/// The failure reported by a channel end or barrier that has been poisoned.
///
/// Poison is the one error a well-behaved process is expected to handle: it is
/// how a shutdown travels through a network of processes. The `strength` is the
/// strength the poison was injected with, so a process can decide whether to
/// absorb it or pass it on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[error("poisoned with strength {strength}")]
pub struct PoisonError {
  strength: u32,
}

impl PoisonError {
  #[inline]
  pub(crate) fn new(strength: u32) -> Self {
    debug_assert!(strength > 0, "poison strength must be positive");
    Self { strength }
  }

  /// The strength the poison was injected with.
  #[inline]
  pub fn strength(&self) -> u32 {
    self.strength
  }
}

/// Error returned when a buffering policy is constructed with no room for data.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("attempt to create a {kind} buffer with zero capacity")]
pub struct BufferSizeError {
  kind: &'static str,
}

impl BufferSizeError {
  pub(crate) fn new(kind: &'static str) -> Self {
    Self { kind }
  }

  /// The name of the buffer kind that rejected the capacity.
  pub fn kind(&self) -> &'static str {
    self.kind
  }
}

/// Errors from client/server connections.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
  /// One of the channels underneath the connection was poisoned.
  #[error(transparent)]
  Poisoned(#[from] PoisonError),

  /// A request/reply operation was called out of protocol order.
  #[error("`{operation}` called out of order: connection is {state}")]
  OutOfOrder {
    operation: &'static str,
    state: &'static str,
  },
}

/// A specialized `Result` for operations that can only fail through poison.
pub type Result<T, E = PoisonError> = std::result::Result<T, E>;
