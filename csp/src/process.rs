// src/process.rs

//! Running a network of processes.
//!
//! A process is any closure that runs to completion and reports whether it
//! ended because of poison. [`Parallel`] runs a set of them on OS threads, one
//! thread per process, and waits for all of them.

use crate::error::PoisonError;

use std::any::Any;
use std::fmt;
use std::panic;
use std::thread;

/// The outcome of a process: `Ok` for a normal finish, or the poison that
/// ended it.
pub type ProcessResult = Result<(), PoisonError>;

type Process<'a> = Box<dyn FnOnce() -> ProcessResult + Send + 'a>;

/// A set of processes to be run concurrently.
///
/// Processes may borrow from the caller's stack: they run on scoped threads
/// and all of them have finished when [`run`](Parallel::run) returns.
///
/// ```
/// use fibre_csp::{channel, Parallel};
///
/// let (tx, rx) = channel::one2one::<u32>();
/// let mut total = 0;
/// Parallel::new()
///   .add(|| (1..=3).try_for_each(|i| tx.write(i)))
///   .add(|| {
///     for _ in 0..3 {
///       total += rx.read()?;
///     }
///     Ok(())
///   })
///   .run()
///   .unwrap();
/// assert_eq!(total, 6);
/// ```
#[derive(Default)]
pub struct Parallel<'a> {
  processes: Vec<(Option<String>, Process<'a>)>,
}

impl fmt::Debug for Parallel<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<_> = self.processes.iter().map(|(name, _)| name.as_deref()).collect();
    f.debug_struct("Parallel").field("processes", &names).finish()
  }
}

impl<'a> Parallel<'a> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a process.
  pub fn add(mut self, process: impl FnOnce() -> ProcessResult + Send + 'a) -> Self {
    self.processes.push((None, Box::new(process)));
    self
  }

  /// Adds a process whose thread carries `name`, as shown in panics and
  /// debuggers.
  pub fn add_named(
    mut self,
    name: impl Into<String>,
    process: impl FnOnce() -> ProcessResult + Send + 'a,
  ) -> Self {
    self.processes.push((Some(name.into()), Box::new(process)));
    self
  }

  pub fn len(&self) -> usize {
    self.processes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.processes.is_empty()
  }

  /// Runs every process and waits for all of them to finish.
  ///
  /// The last process added runs on the calling thread.
  ///
  /// # Errors
  ///
  /// If any process ended poisoned, returns the strongest of those poisons.
  ///
  /// # Panics
  ///
  /// If a process panics, the panic is re-raised here once every other
  /// process has finished. Also panics if the OS refuses to spawn a thread.
  pub fn run(self) -> ProcessResult {
    let mut processes = self.processes;
    let Some((last_name, last)) = processes.pop() else {
      return Ok(());
    };

    thread::scope(|scope| {
      let handles: Vec<_> = processes
        .into_iter()
        .map(|(name, process)| {
          let mut builder = thread::Builder::new();
          if let Some(name) = &name {
            builder = builder.name(name.clone());
          }
          match builder.spawn_scoped(scope, process) {
            Ok(handle) => (name, handle),
            Err(e) => panic!("failed to spawn process thread: {e}"),
          }
        })
        .collect();

      let mut outcome = report(last_name.as_deref(), last(), Ok(()));
      let mut panicked: Option<Box<dyn Any + Send>> = None;
      for (name, handle) in handles {
        match handle.join() {
          Ok(result) => outcome = report(name.as_deref(), result, outcome),
          Err(payload) => {
            tracing::warn!(process = name.as_deref().unwrap_or("<unnamed>"), "process panicked");
            panicked.get_or_insert(payload);
          }
        }
      }
      if let Some(payload) = panicked {
        panic::resume_unwind(payload);
      }
      outcome
    })
  }
}

/// Folds one process's result into the running outcome, keeping the
/// strongest poison.
fn report(name: Option<&str>, result: ProcessResult, outcome: ProcessResult) -> ProcessResult {
  let Err(poison) = result else {
    return outcome;
  };
  tracing::warn!(
    process = name.unwrap_or("<unnamed>"),
    strength = poison.strength(),
    "process ended poisoned"
  );
  match outcome {
    Err(strongest) if strongest.strength() >= poison.strength() => Err(strongest),
    _ => Err(poison),
  }
}
