//! Communicating Sequential Processes for Rust.
//!
//! `fibre_csp` lets a program be written as a network of sequential processes,
//! one OS thread each, that interact only through synchronous channels and
//! barriers. A process can wait on several events at once with an
//! [`Alternative`], and a network is shut down by [poisoning](Poisonable) its
//! channels, which turns every further read or write into a [`PoisonError`]
//! instead of a hang.
//!
//! ```
//! use fibre_csp::{channel, Alternative, Guard, Parallel, Timer};
//! use std::time::Duration;
//!
//! let (tx, rx) = channel::one2one::<&str>();
//! Parallel::new()
//!   .add(|| tx.write("hello"))
//!   .add(|| {
//!     let timer = Timer::new();
//!     timer.set_alarm_after(Duration::from_secs(5));
//!     let mut alt = Alternative::new(vec![&rx as &dyn Guard, &timer]);
//!     match alt.pri_select() {
//!       0 => assert_eq!(rx.read()?, "hello"),
//!       _ => panic!("timed out"),
//!     }
//!     Ok(())
//!   })
//!   .run()
//!   .unwrap();
//! ```

pub mod alt;
pub mod barrier;
pub mod buffer;
pub mod channel;
pub mod connection;
pub mod error;
pub mod process;

mod internal;
mod poison;

pub use alt::{AltHandle, Alternative, Guard, Skip, Timer};
pub use barrier::{AltingBarrier, Barrier};
pub use buffer::BufferPolicy;
pub use channel::{
  any2any, any2one, one2any, one2one, ChannelBuilder, ChannelConfig, Filter, Receiver, Sender,
  SharedReceiver, SharedSender,
};
pub use error::{BufferSizeError, ConnectionError, PoisonError};
pub use poison::Poisonable;
pub use process::{Parallel, ProcessResult};
