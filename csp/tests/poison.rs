mod common;
use common::*;

use fibre_csp::{channel, ChannelBuilder, Parallel, PoisonError, Poisonable};

use std::thread;

#[test]
fn poison_reaches_both_ends() {
  init_tracing();
  let (tx, rx) = channel::one2one::<u32>();
  rx.poison(3);
  assert_eq!(tx.write(1), Err(rx.read().unwrap_err()));
  assert_eq!(tx.write(1).unwrap_err().strength(), 3);
  assert!(tx.is_poisoned());
}

#[test]
fn blocked_writer_is_released_by_poison() {
  let (tx, rx) = channel::one2one::<u32>();
  thread::scope(|s| {
    let writer = s.spawn(|| tx.write(1));
    thread::sleep(SHORT_TIMEOUT);
    rx.poison(2);
    assert_eq!(writer.join().unwrap().unwrap_err().strength(), 2);
  });
}

#[test]
fn stronger_poison_replaces_weaker() {
  let (tx, rx) = channel::one2one::<u32>();
  tx.poison(2);
  tx.poison(5);
  tx.poison(1);
  assert_eq!(rx.read().unwrap_err().strength(), 5);
}

#[test]
fn immune_channel_keeps_working() {
  let (tx, rx) = ChannelBuilder::<u32>::new().immunity(4).one2one();
  tx.poison(4);
  thread::scope(|s| {
    s.spawn(|| tx.write(10).unwrap());
    assert_eq!(rx.read().unwrap(), 10);
  });
  tx.poison(5);
  assert_eq!(rx.read().unwrap_err().strength(), 5);
}

/// A process that forwards values and passes on any poison it receives.
fn forward(input: &channel::Receiver<u32>, output: &channel::Sender<u32>) -> Result<(), PoisonError> {
  loop {
    let value = match input.read() {
      Ok(v) => v,
      Err(poison) => {
        output.poison(poison.strength());
        input.poison(poison.strength());
        return Err(poison);
      }
    };
    if let Err(poison) = output.write(value) {
      input.poison(poison.strength());
      return Err(poison);
    }
  }
}

#[test]
fn shutdown_cascades_through_a_pipeline() {
  init_tracing();
  let (tx0, rx0) = channel::one2one::<u32>();
  let (tx1, rx1) = channel::one2one::<u32>();
  let (tx2, rx2) = channel::one2one::<u32>();

  let result = Parallel::new()
    .add_named("stage-1", || forward(&rx0, &tx1))
    .add_named("stage-2", || forward(&rx1, &tx2))
    .add_named("driver", || {
      for i in 0..ITEMS_LOW as u32 {
        tx0.write(i)?;
        assert_eq!(rx2.read()?, i);
      }
      Poisonable::poison(&tx0, 7);
      Ok(())
    })
    .run();

  assert_eq!(result.unwrap_err().strength(), 7);
  assert_eq!(rx2.read().unwrap_err().strength(), 7);
}

#[test]
fn firebreak_absorbs_weak_poison() {
  // The immune channel shields the downstream stage from strength-1 poison.
  let (tx0, rx0) = channel::one2one::<u32>();
  let (tx1, rx1) = ChannelBuilder::<u32>::new().immunity(1).one2one();

  thread::scope(|s| {
    s.spawn(|| forward(&rx0, &tx1));
    tx0.poison(1);
    thread::sleep(SHORT_TIMEOUT);
    assert!(!rx1.is_poisoned());
    assert!(!rx1.pending());
    rx1.poison(3);
  });
  assert!(tx0.is_poisoned());
}

#[test]
fn symmetric_poison_ends_an_alting_consumer() {
  init_tracing();
  let (tx, rx) = channel::symmetric::<u32>();
  let (_ctl_tx, ctl_rx) = channel::one2one::<u32>();

  let consumer = thread::spawn(move || -> Result<u32, PoisonError> {
    let mut total = 0;
    loop {
      let mut alt = fibre_csp::Alternative::new(vec![&rx as &dyn fibre_csp::Guard, &ctl_rx]);
      match alt.select() {
        0 => total += rx.read()?,
        _ => total += ctl_rx.read()?,
      }
      if total > 1000 {
        return Ok(total);
      }
    }
  });

  tx.write(1).unwrap();
  tx.write(2).unwrap();
  thread::sleep(SHORT_TIMEOUT);
  assert!(!consumer.is_finished());

  tx.poison(7);
  assert_eq!(consumer.join().unwrap().unwrap_err().strength(), 7);
}
