// src/barrier/mod.rs

//! Multi-way synchronisation.
//!
//! A [`Barrier`] is an N-party rendezvous with dynamic membership, used
//! directly by processes that must move in lock-step. An [`AltingBarrier`]
//! is the same idea expressed as a [`Guard`](crate::alt::Guard), so a process
//! can offer to synchronise while also waiting on channels.

mod alting;

pub use alting::AltingBarrier;

use crate::error::PoisonError;
use crate::poison::{PoisonState, Poisonable};

use parking_lot::{Condvar, Mutex};

use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct BarrierState {
  enrolled: usize,
  /// Members still expected this cycle. `0 <= countdown <= enrolled`.
  countdown: usize,
  /// Completed cycles. A waiter is released once this moves past the value
  /// it observed on arrival.
  generation: u64,
  poison: PoisonState,
}

impl BarrierState {
  fn complete(&mut self) {
    self.countdown = self.enrolled;
    self.generation = self.generation.wrapping_add(1);
    tracing::trace!(
      generation = self.generation,
      enrolled = self.enrolled,
      "barrier cycle completed"
    );
  }
}

struct BarrierInner {
  state: Mutex<BarrierState>,
  released: Condvar,
}

/// An N-party barrier with dynamic enrollment.
///
/// `Barrier` is a cheap, cloneable handle; every clone refers to the same
/// barrier. Membership is a count, not a property of a handle: any holder may
/// [`enroll`](Barrier::enroll) a newcomer or [`resign`](Barrier::resign) on
/// behalf of a departing member.
///
/// ```
/// use fibre_csp::Barrier;
/// use std::thread;
///
/// let barrier = Barrier::new(3);
/// let handles: Vec<_> = (0..3)
///   .map(|_| {
///     let b = barrier.clone();
///     thread::spawn(move || b.sync())
///   })
///   .collect();
/// for h in handles {
///   h.join().unwrap().unwrap();
/// }
/// ```
#[derive(Clone)]
pub struct Barrier {
  inner: Arc<BarrierInner>,
}

impl fmt::Debug for Barrier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.state.lock();
    f.debug_struct("Barrier")
      .field("enrolled", &state.enrolled)
      .field("countdown", &state.countdown)
      .field("generation", &state.generation)
      .field("poison", &state.poison)
      .finish()
  }
}

impl Barrier {
  /// Creates a barrier expecting `enrolled` members per cycle.
  pub fn new(enrolled: usize) -> Self {
    Self::with_immunity(enrolled, 0)
  }

  /// Creates a barrier that ignores poison of strength `immunity` or less.
  pub fn with_immunity(enrolled: usize, immunity: u32) -> Self {
    Self {
      inner: Arc::new(BarrierInner {
        state: Mutex::new(BarrierState {
          enrolled,
          countdown: enrolled,
          generation: 0,
          poison: PoisonState::new(immunity),
        }),
        released: Condvar::new(),
      }),
    }
  }

  /// Arrives at the barrier and waits until every enrolled member has arrived
  /// (or resigned) this cycle.
  ///
  /// # Errors
  ///
  /// Returns `PoisonError` if the barrier is, or becomes while waiting,
  /// poisoned.
  ///
  /// # Panics
  ///
  /// Panics if the barrier has no enrolled members.
  pub fn sync(&self) -> Result<(), PoisonError> {
    let mut state = self.inner.state.lock();
    state.poison.check()?;
    assert!(state.enrolled > 0, "sync on a barrier with no enrolled members");

    state.countdown -= 1;
    if state.countdown == 0 {
      state.complete();
      self.inner.released.notify_all();
      return Ok(());
    }

    let arrived_in = state.generation;
    loop {
      self.inner.released.wait(&mut state);
      if state.generation != arrived_in {
        return Ok(());
      }
      state.poison.check()?;
    }
  }

  /// Adds one member. The newcomer is expected from the current cycle on.
  pub fn enroll(&self) {
    let mut state = self.inner.state.lock();
    state.enrolled += 1;
    state.countdown += 1;
    tracing::trace!(enrolled = state.enrolled, "barrier enroll");
  }

  /// Removes one member. If everyone else has already arrived this cycle,
  /// the resignation completes it.
  ///
  /// # Panics
  ///
  /// Panics if the barrier has no enrolled members.
  pub fn resign(&self) {
    let mut state = self.inner.state.lock();
    assert!(state.enrolled > 0, "resign from a barrier with no enrolled members");
    state.enrolled -= 1;
    state.countdown -= 1;
    tracing::trace!(enrolled = state.enrolled, "barrier resign");
    if state.countdown == 0 {
      state.complete();
      self.inner.released.notify_all();
    }
  }

  /// Resets membership to `enrolled`. Must only be called while no member is
  /// waiting in [`sync`](Self::sync).
  pub fn reset(&self, enrolled: usize) {
    let mut state = self.inner.state.lock();
    debug_assert_eq!(
      state.countdown, state.enrolled,
      "barrier reset while members are waiting"
    );
    state.enrolled = enrolled;
    state.countdown = enrolled;
  }

  /// Current number of members.
  pub fn enrolled(&self) -> usize {
    self.inner.state.lock().enrolled
  }

  /// Poisons the barrier if `strength` exceeds its immunity, failing every
  /// waiting and future `sync`.
  pub fn poison(&self, strength: u32) {
    let mut state = self.inner.state.lock();
    if state.poison.apply(strength, "barrier") {
      self.inner.released.notify_all();
    }
  }

  pub fn is_poisoned(&self) -> bool {
    self.inner.state.lock().poison.is_poisoned()
  }
}

impl Poisonable for Barrier {
  fn poison(&self, strength: u32) {
    Barrier::poison(self, strength);
  }
}
