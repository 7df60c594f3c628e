// src/barrier/alting.rs

//! Barriers that can be offered as a guard.
//!
//! Each member of an alting barrier holds its own front end. A member
//! *offers* the barrier while one of its Alternatives has the front end
//! enabled. The barrier completes the moment every member is offering it,
//! and the member whose enable made that happen binds all the others: their
//! Alternatives are woken and must select the barrier.
//!
//! A process may offer several alting barriers in one selection, so two
//! barriers could otherwise complete at once and both claim the same
//! Alternative. All offers and completions are therefore serialised by one
//! process-wide coordinator lock, and a barrier completes only if none of its
//! members' Alternatives is already bound this round.

use crate::alt::{AltHandle, Alternative, Guard};

use generational_arena::{Arena, Index};
use parking_lot::Mutex;

use std::fmt;
use std::sync::Arc;

static COORDINATOR: Mutex<()> = parking_lot::const_mutex(());

#[derive(Debug, Default)]
struct Member {
  offering: bool,
  /// Set when the barrier completed while this member was waiting; cleared
  /// when its Alternative disables the front end.
  completed: bool,
  alt: Option<AltHandle>,
}

#[derive(Debug, Default)]
struct BaseState {
  members: Arena<Member>,
  cycles: u64,
  /// Once set, every offer is immediately ready and nobody waits again.
  aborted: bool,
}

impl BaseState {
  /// Completes the barrier if every member is offering and none is already
  /// bound elsewhere. `completer` is the member whose enable triggered the
  /// check, if any; it learns of the completion from the return value.
  fn try_complete(&mut self, completer: Option<Index>) -> bool {
    if self.members.is_empty() {
      return false;
    }
    let ready = self.members.iter().all(|(_, m)| {
      m.offering && m.alt.as_ref().is_some_and(|alt| !alt.is_triggered())
    });
    if !ready {
      return false;
    }

    for (index, member) in self.members.iter_mut() {
      member.offering = false;
      if let Some(alt) = member.alt.take() {
        alt.trigger();
        if Some(index) != completer {
          member.completed = true;
          alt.schedule();
        }
      }
    }
    self.cycles += 1;
    tracing::trace!(
      cycles = self.cycles,
      members = self.members.len(),
      "alting barrier completed"
    );
    true
  }
}

/// One member's front end of an alting barrier.
///
/// Front ends are created together with [`AltingBarrier::create`] and handed
/// out one per process. A front end is used by a single process; dropping it
/// resigns that member, which may complete the barrier for the others.
///
/// Alting barriers cannot be poisoned.
pub struct AltingBarrier {
  base: Arc<Mutex<BaseState>>,
  member: Index,
}

impl fmt::Debug for AltingBarrier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let base = self.base.lock();
    f.debug_struct("AltingBarrier")
      .field("member", &self.member)
      .field("enrolled", &base.members.len())
      .field("cycles", &base.cycles)
      .field("aborted", &base.aborted)
      .finish()
  }
}

impl AltingBarrier {
  /// Creates a barrier with `members` members and returns their front ends.
  ///
  /// # Panics
  ///
  /// Panics if `members` is zero.
  pub fn create(members: usize) -> Vec<AltingBarrier> {
    assert!(members > 0, "an alting barrier needs at least one member");
    let base = Arc::new(Mutex::new(BaseState::default()));
    let mut state = base.lock();
    let fronts = (0..members)
      .map(|_| AltingBarrier {
        base: Arc::clone(&base),
        member: state.members.insert(Member::default()),
      })
      .collect();
    drop(state);
    fronts
  }

  pub(crate) fn pair() -> (AltingBarrier, AltingBarrier) {
    let base = Arc::new(Mutex::new(BaseState::default()));
    let (first, second) = {
      let mut state = base.lock();
      (
        state.members.insert(Member::default()),
        state.members.insert(Member::default()),
      )
    };
    (
      AltingBarrier {
        base: Arc::clone(&base),
        member: first,
      },
      AltingBarrier { base, member: second },
    )
  }

  /// Enrolls a new member and returns its front end.
  pub fn expand(&self) -> AltingBarrier {
    let _coordinator = COORDINATOR.lock();
    let member = self.base.lock().members.insert(Member::default());
    AltingBarrier {
      base: Arc::clone(&self.base),
      member,
    }
  }

  /// Resigns this member. Same as dropping the front end.
  pub fn contract(self) {}

  /// Number of members currently enrolled.
  pub fn enrolled(&self) -> usize {
    self.base.lock().members.len()
  }

  /// `true` if every other member is offering the barrier right now, so a
  /// [`sync`](Self::sync) would complete without blocking.
  ///
  /// The answer may be stale by the time the caller acts on it.
  pub fn poll(&self) -> bool {
    let _coordinator = COORDINATOR.lock();
    let base = self.base.lock();
    base.aborted
      || base
        .members
        .iter()
        .all(|(index, m)| index == self.member || m.offering)
  }

  /// Releases every member, now and for good: waiting offers are woken and
  /// every later offer is ready at once. Used by channels built on the barrier
  /// when they are poisoned.
  pub(crate) fn abort(&self) {
    let _coordinator = COORDINATOR.lock();
    let mut base = self.base.lock();
    if std::mem::replace(&mut base.aborted, true) {
      return;
    }
    for (_, member) in base.members.iter_mut() {
      if let Some(alt) = &member.alt {
        alt.schedule();
      }
    }
    tracing::trace!(members = base.members.len(), "alting barrier aborted");
  }

  /// Blocks until every member has synchronised on (or selected) the barrier.
  pub fn sync(&self) {
    let mut alt = Alternative::new(vec![self as &dyn Guard]);
    alt.select();
  }
}

impl Guard for AltingBarrier {
  fn enable(&self, alt: &AltHandle) -> bool {
    let _coordinator = COORDINATOR.lock();
    let mut base = self.base.lock();
    if base.aborted {
      return true;
    }
    let Some(member) = base.members.get_mut(self.member) else {
      return false;
    };
    if let Some(current) = &member.alt {
      assert!(
        current.same_as(alt),
        "alting barrier front end is already enabled by another Alternative"
      );
    }
    member.offering = true;
    member.alt = Some(alt.clone());
    base.try_complete(Some(self.member))
  }

  fn disable(&self) -> bool {
    let _coordinator = COORDINATOR.lock();
    let mut base = self.base.lock();
    let Some(member) = base.members.get_mut(self.member) else {
      return false;
    };
    member.alt = None;
    member.offering = false;
    let completed = std::mem::take(&mut member.completed);
    completed || base.aborted
  }

  fn is_multiway(&self) -> bool {
    true
  }
}

impl Drop for AltingBarrier {
  fn drop(&mut self) {
    let _coordinator = COORDINATOR.lock();
    let mut base = self.base.lock();
    base.members.remove(self.member);
    base.try_complete(None);
  }
}
