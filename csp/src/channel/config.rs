use crate::buffer::BufferPolicy;

/// A plain-data description of a channel: its buffering policy and poison
/// immunity.
///
/// With the `serde` feature this can be loaded from any serde format, with
/// missing fields taking their defaults (unbuffered, no immunity):
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use fibre_csp::{buffer::BufferPolicy, ChannelConfig};
///
/// let config: ChannelConfig =
///   serde_json::from_str(r#"{ "policy": { "kind": "fifo", "capacity": 4 }, "immunity": 2 }"#).unwrap();
/// assert_eq!(config.policy, BufferPolicy::Fifo { capacity: 4 });
/// assert_eq!(config.immunity, 2);
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
  pub policy: BufferPolicy,
  /// Poison at or below this strength is ignored by the channel.
  pub immunity: u32,
}

impl ChannelConfig {
  pub fn new(policy: BufferPolicy) -> Self {
    Self { policy, immunity: 0 }
  }

  pub fn with_immunity(mut self, immunity: u32) -> Self {
    self.immunity = immunity;
    self
  }
}
