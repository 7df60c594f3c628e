//! Value transformations installed on a channel's ends.
//!
//! Write filters run in the writer's thread before the value enters the
//! channel; read filters run in the reader's thread after it leaves. Each
//! side applies its filters in the order they were added to the builder.

use std::fmt;
use std::sync::Arc;

/// Transforms each value passing one end of a channel.
///
/// Any `Fn(T) -> T + Send + Sync` closure is a filter.
///
/// ```
/// use fibre_csp::channel::ChannelBuilder;
///
/// let (tx, rx) = ChannelBuilder::<i32>::new()
///   .policy(fibre_csp::BufferPolicy::Fifo { capacity: 1 })
///   .unwrap()
///   .write_filter(|v: i32| v * 10)
///   .read_filter(|v: i32| v + 1)
///   .one2one();
/// tx.write(4).unwrap();
/// assert_eq!(rx.read().unwrap(), 41);
/// ```
pub trait Filter<T>: Send + Sync {
  fn filter(&self, value: T) -> T;
}

impl<T, F> Filter<T> for F
where
  F: Fn(T) -> T + Send + Sync,
{
  fn filter(&self, value: T) -> T {
    self(value)
  }
}

/// An ordered list of filters, shared between the channels one builder makes.
pub(crate) struct FilterChain<T> {
  filters: Vec<Arc<dyn Filter<T>>>,
}

impl<T> FilterChain<T> {
  pub(crate) fn push(&mut self, filter: Arc<dyn Filter<T>>) {
    self.filters.push(filter);
  }

  pub(crate) fn len(&self) -> usize {
    self.filters.len()
  }

  #[inline]
  pub(crate) fn apply(&self, value: T) -> T {
    self.filters.iter().fold(value, |value, f| f.filter(value))
  }
}

impl<T> Default for FilterChain<T> {
  fn default() -> Self {
    Self { filters: Vec::new() }
  }
}

impl<T> Clone for FilterChain<T> {
  fn clone(&self) -> Self {
    Self {
      filters: self.filters.clone(),
    }
  }
}

impl<T> fmt::Debug for FilterChain<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FilterChain").field("len", &self.filters.len()).finish()
  }
}
