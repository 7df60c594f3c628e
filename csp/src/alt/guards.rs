//! Guards that are not backed by a channel or barrier.

use super::{AltHandle, Guard};

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// A guard that is always ready. Useful as the last, lowest-priority branch
/// of a [`pri_select`](super::Alternative::pri_select) to poll other guards.
#[derive(Debug, Default, Clone, Copy)]
pub struct Skip;

impl Skip {
  pub fn new() -> Self {
    Skip
  }
}

impl Guard for Skip {
  fn enable(&self, _alt: &AltHandle) -> bool {
    true
  }

  fn disable(&self) -> bool {
    true
  }
}

/// A deadline guard and process clock.
///
/// As a guard, it becomes ready once the current alarm has passed. A timer
/// with no alarm set never becomes ready.
#[derive(Debug, Default)]
pub struct Timer {
  alarm: Cell<Option<Instant>>,
}

impl Timer {
  pub fn new() -> Self {
    Self {
      alarm: Cell::new(None),
    }
  }

  /// The current time.
  pub fn now(&self) -> Instant {
    Instant::now()
  }

  /// Sets the instant at which this timer, as a guard, becomes ready.
  pub fn set_alarm(&self, at: Instant) {
    self.alarm.set(Some(at));
  }

  /// Sets the alarm `delay` from now.
  pub fn set_alarm_after(&self, delay: Duration) {
    self.set_alarm(Instant::now() + delay);
  }

  pub fn alarm(&self) -> Option<Instant> {
    self.alarm.get()
  }

  pub fn clear_alarm(&self) {
    self.alarm.set(None);
  }

  /// Blocks the calling process until `at`.
  pub fn after(&self, at: Instant) {
    let now = Instant::now();
    if at > now {
      thread::sleep(at - now);
    }
  }

  /// Blocks the calling process for `duration`.
  pub fn sleep(&self, duration: Duration) {
    thread::sleep(duration);
  }

  fn expired(&self) -> bool {
    self.alarm.get().is_some_and(|at| Instant::now() >= at)
  }
}

impl Guard for Timer {
  fn enable(&self, alt: &AltHandle) -> bool {
    match self.alarm.get() {
      Some(at) if Instant::now() >= at => true,
      Some(at) => {
        alt.set_timeout(at);
        false
      }
      None => false,
    }
  }

  fn disable(&self) -> bool {
    self.expired()
  }
}
