//! The choice engine: waiting on several guards and committing to exactly one.
//!
//! An [`Alternative`] runs a two-phase protocol over its guards on every
//! selection:
//!
//! 1. **Enable**: each guard (in scan order) is asked whether it is ready and,
//!    if not, registers the Alternative's [`AltHandle`] so it can
//!    [`schedule`](AltHandle::schedule) it later. Scanning stops at the first
//!    ready guard.
//! 2. If nothing was ready, the selecting thread waits on the Alternative's own
//!    condition variable until a guard schedules it (or a timer deadline passes).
//! 3. **Disable**: every guard enabled before the provisional winner is
//!    deregistered, in reverse scan order, so the earliest ready guard in scan
//!    order wins. Readiness seen by a guard that loses stays in that guard's
//!    underlying structure for a later round.
//! 4. **Commit**: if a multiway guard (an alting barrier) completed during the
//!    round it has already bound every other member, so it overrides whatever
//!    the scan picked.
//!
//! A selection over zero guards, or with every guard masked out, blocks forever.

mod guards;

pub use guards::{Skip, Timer};

use parking_lot::{Condvar, Mutex};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event source that can take part in an [`Alternative`].
///
/// Both methods are called only by the selecting thread, and only in
/// enable/disable pairs within one selection.
pub trait Guard {
  /// Registers interest. Returns `true` if the guard is ready now, in which
  /// case it must not keep a reference to `alt`.
  fn enable(&self, alt: &AltHandle) -> bool;

  /// Deregisters. Returns `true` if the guard became (or still is) ready.
  fn disable(&self) -> bool;

  /// `true` for guards whose readiness is a commitment shared with other
  /// processes (alting barriers). Such a guard, once reported ready, must be
  /// the one selected.
  fn is_multiway(&self) -> bool {
    false
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Inactive,
  Enabling,
  Waiting,
  Ready,
}

#[derive(Debug)]
struct AltState {
  phase: Phase,
  /// Earliest deadline registered by a timer guard this round.
  timeout: Option<Instant>,
  /// Set by the alting-barrier coordinator when a barrier completes on behalf
  /// of this Alternative. At most one per round.
  triggered: bool,
}

#[derive(Debug)]
struct AltCore {
  state: Mutex<AltState>,
  cv: Condvar,
}

/// The handle a guard holds while enabled, used to wake the selecting process.
#[derive(Clone)]
pub struct AltHandle {
  core: Arc<AltCore>,
}

impl fmt::Debug for AltHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.core.state.lock();
    f.debug_struct("AltHandle")
      .field("phase", &state.phase)
      .field("timeout", &state.timeout)
      .finish()
  }
}

impl AltHandle {
  fn new() -> Self {
    Self {
      core: Arc::new(AltCore {
        state: Mutex::new(AltState {
          phase: Phase::Inactive,
          timeout: None,
          triggered: false,
        }),
        cv: Condvar::new(),
      }),
    }
  }

  /// Tells the Alternative that one of its enabled guards has become ready.
  ///
  /// Wakes the selecting thread if it is waiting; has no effect outside a
  /// selection.
  pub fn schedule(&self) {
    let mut state = self.core.state.lock();
    match state.phase {
      Phase::Enabling => state.phase = Phase::Ready,
      Phase::Waiting => {
        state.phase = Phase::Ready;
        self.core.cv.notify_one();
      }
      Phase::Inactive | Phase::Ready => {}
    }
  }

  /// Asks the Alternative to stop waiting at `deadline` at the latest.
  /// The earliest deadline registered during a round wins.
  pub fn set_timeout(&self, deadline: Instant) {
    let mut state = self.core.state.lock();
    state.timeout = Some(match state.timeout {
      Some(current) if current <= deadline => current,
      _ => deadline,
    });
  }

  /// `true` if both handles belong to the same Alternative.
  pub fn same_as(&self, other: &AltHandle) -> bool {
    Arc::ptr_eq(&self.core, &other.core)
  }

  /// Marks this Alternative as bound by a completed barrier.
  /// Returns `false` if it was already bound this round.
  pub(crate) fn trigger(&self) -> bool {
    let mut state = self.core.state.lock();
    !std::mem::replace(&mut state.triggered, true)
  }

  pub(crate) fn is_triggered(&self) -> bool {
    self.core.state.lock().triggered
  }

  fn begin(&self) {
    let mut state = self.core.state.lock();
    state.phase = Phase::Enabling;
    state.timeout = None;
    state.triggered = false;
  }

  fn wait(&self) {
    let mut state = self.core.state.lock();
    if state.phase == Phase::Enabling {
      state.phase = Phase::Waiting;
      while state.phase == Phase::Waiting {
        match state.timeout {
          Some(deadline) => {
            if self.core.cv.wait_until(&mut state, deadline).timed_out() {
              break;
            }
          }
          None => self.core.cv.wait(&mut state),
        }
      }
    }
    state.phase = Phase::Ready;
  }

  fn finish(&self) {
    self.core.state.lock().phase = Phase::Inactive;
  }
}

/// A reusable choice over a fixed, ordered set of guards.
///
/// Selection methods take `&mut self`, so one Alternative can never be used
/// by two processes at once.
pub struct Alternative<'a> {
  guards: Vec<&'a dyn Guard>,
  handle: AltHandle,
  favourite: usize,
  enabled: Vec<usize>,
}

impl fmt::Debug for Alternative<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Alternative")
      .field("guards", &self.guards.len())
      .field("favourite", &self.favourite)
      .finish()
  }
}

impl<'a> Alternative<'a> {
  /// Creates an Alternative over `guards`. Index `i` returned by a selection
  /// refers to `guards[i]`.
  pub fn new(guards: Vec<&'a dyn Guard>) -> Self {
    let capacity = guards.len();
    Self {
      guards,
      handle: AltHandle::new(),
      favourite: 0,
      enabled: Vec::with_capacity(capacity),
    }
  }

  pub fn len(&self) -> usize {
    self.guards.len()
  }

  pub fn is_empty(&self) -> bool {
    self.guards.is_empty()
  }

  /// Blocks until a guard is ready and returns its index. Scanning starts at
  /// the current favourite, which is left unchanged; use this when the caller
  /// does not care which ready guard wins.
  pub fn select(&mut self) -> usize {
    self.run(self.favourite, None)
  }

  /// Like [`select`](Self::select), but the lowest-indexed ready guard wins.
  pub fn pri_select(&mut self) -> usize {
    self.favourite = 0;
    self.run(0, None)
  }

  /// Like [`select`](Self::select), but scanning starts just after the
  /// previous winner. A guard that stays ready is chosen within `len() - 1`
  /// further selections.
  pub fn fair_select(&mut self) -> usize {
    let selected = self.run(self.favourite, None);
    self.favourite = (selected + 1) % self.guards.len();
    selected
  }

  /// [`select`](Self::select) considering only the guards whose
  /// precondition is `true`.
  ///
  /// # Panics
  ///
  /// Panics if `preconditions.len()` differs from the number of guards.
  pub fn select_masked(&mut self, preconditions: &[bool]) -> usize {
    self.check_mask(preconditions);
    self.run(self.favourite, Some(preconditions))
  }

  /// [`pri_select`](Self::pri_select) over the guards whose precondition is `true`.
  pub fn pri_select_masked(&mut self, preconditions: &[bool]) -> usize {
    self.check_mask(preconditions);
    self.favourite = 0;
    self.run(0, Some(preconditions))
  }

  /// [`fair_select`](Self::fair_select) over the guards whose precondition is `true`.
  pub fn fair_select_masked(&mut self, preconditions: &[bool]) -> usize {
    self.check_mask(preconditions);
    let selected = self.run(self.favourite, Some(preconditions));
    self.favourite = (selected + 1) % self.guards.len();
    selected
  }

  fn check_mask(&self, preconditions: &[bool]) {
    assert_eq!(
      preconditions.len(),
      self.guards.len(),
      "Alternative: precondition mask has {} entries for {} guards",
      preconditions.len(),
      self.guards.len()
    );
  }

  fn run(&mut self, start: usize, preconditions: Option<&[bool]>) -> usize {
    let n = self.guards.len();
    loop {
      self.handle.begin();
      self.enabled.clear();

      let mut selected = None;
      let mut committed = None;

      // --- Phase 1: Enable ---
      for k in 0..n {
        let i = (start + k) % n;
        if preconditions.is_some_and(|pre| !pre[i]) {
          continue;
        }
        let guard = self.guards[i];
        if guard.enable(&self.handle) {
          selected = Some(i);
          if guard.is_multiway() {
            committed = Some(i);
          }
          break;
        }
        self.enabled.push(i);
      }

      // --- Phase 2: Wait ---
      if selected.is_none() {
        self.handle.wait();
      }

      // --- Phase 3: Disable ---
      // Reverse scan order, so the last guard found ready is the earliest.
      for &i in self.enabled.iter().rev() {
        let guard = self.guards[i];
        if guard.disable() {
          selected = Some(i);
          if guard.is_multiway() {
            committed = Some(i);
          }
        }
      }
      self.handle.finish();

      // --- Phase 4: Commit ---
      if let Some(winner) = committed.or(selected) {
        return winner;
      }
      // Woken without a ready guard (a deadline raced its own alarm); go again.
    }
  }
}
