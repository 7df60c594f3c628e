//! Strength-ranked poison bookkeeping shared by channels and barriers.
//!
//! Every poisonable instance carries an immunity threshold fixed at
//! construction. Poison at or below the threshold is absorbed; poison above it
//! is recorded permanently and reported to every subsequent (and every
//! blocked) operation on the instance. Recording is monotonic: a later, weaker
//! poison never lowers the recorded strength.

use crate::error::PoisonError;

/// Something that can be poisoned: a channel end, a barrier, a connection end.
pub trait Poisonable {
  /// Injects poison of the given strength.
  ///
  /// Has no effect if `strength` does not exceed the instance's immunity.
  fn poison(&self, strength: u32);
}

/// The poison state of one instance. Always accessed under that instance's lock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PoisonState {
  immunity: u32,
  strength: u32,
}

impl PoisonState {
  pub(crate) const fn new(immunity: u32) -> Self {
    Self {
      immunity,
      strength: 0,
    }
  }

  #[inline]
  pub(crate) fn immunity(&self) -> u32 {
    self.immunity
  }

  #[inline]
  pub(crate) fn is_poisoned(&self) -> bool {
    self.strength > 0
  }

  /// Fails with the recorded poison, if any.
  #[inline]
  pub(crate) fn check(&self) -> Result<(), PoisonError> {
    if self.strength > 0 {
      Err(PoisonError::new(self.strength))
    } else {
      Ok(())
    }
  }

  /// Applies `strength`. Returns `true` if the state changed and blocked
  /// parties must be woken.
  pub(crate) fn apply(&mut self, strength: u32, what: &'static str) -> bool {
    if strength <= self.immunity {
      tracing::trace!(strength, immunity = self.immunity, what, "poison absorbed by immunity");
      return false;
    }
    if strength <= self.strength {
      return false;
    }
    tracing::debug!(strength, previous = self.strength, what, "poison applied");
    self.strength = strength;
    true
  }
}
