use super::*;
use crate::alt::{Alternative, Guard};
use crate::buffer::{BufferPolicy, OverwriteOldestBuffer};

use std::thread;
use std::time::Duration;

#[test]
fn one2one_transfers_in_order() {
  let (tx, rx) = one2one::<u32>();
  let writer = thread::spawn(move || {
    for i in 0..10 {
      tx.write(i).unwrap();
    }
  });
  let got: Vec<u32> = (0..10).map(|_| rx.read().unwrap()).collect();
  writer.join().unwrap();
  assert_eq!(got, (0..10).collect::<Vec<_>>());
}

#[test]
fn builder_applies_policy_and_immunity() {
  let builder = ChannelBuilder::<i32>::new()
    .policy(BufferPolicy::OverwriteNewest { capacity: 1 })
    .unwrap()
    .immunity(3);
  let (tx, rx) = builder.one2one();
  tx.write(1).unwrap();
  tx.write(2).unwrap();
  assert_eq!(rx.len(), 1);
  assert_eq!(rx.read().unwrap(), 2);
  assert_eq!(tx.immunity(), 3);
}

#[test]
fn builder_rejects_zero_capacity() {
  let err = ChannelBuilder::<i32>::new()
    .policy(BufferPolicy::Fifo { capacity: 0 })
    .unwrap_err();
  assert_eq!(err.kind(), "fifo");
}

#[test]
fn builder_custom_store_is_not_shared() {
  let builder = ChannelBuilder::new().store(OverwriteOldestBuffer::<u8>::new(2).unwrap());
  let channels = builder.one2one_array(2);
  channels[0].0.write(1).unwrap();
  assert!(channels[0].1.pending());
  assert!(!channels[1].1.pending());
}

#[test]
fn from_config_builds_channel() {
  let config = ChannelConfig::new(BufferPolicy::Fifo { capacity: 2 }).with_immunity(1);
  let (tx, rx) = ChannelBuilder::<&str>::from_config(&config).unwrap().any2one();
  let tx2 = tx.clone();
  tx.write("a").unwrap();
  tx2.write("b").unwrap();
  assert_eq!(rx.read().unwrap(), "a");
  assert_eq!(rx.read().unwrap(), "b");
}

#[test]
fn arrays_have_requested_length() {
  let builder = ChannelBuilder::<u8>::new();
  assert_eq!(builder.any2one_array(3).len(), 3);
  assert_eq!(builder.one2any_array(4).len(), 4);
  assert_eq!(builder.any2any_array(0).len(), 0);
}

#[test]
fn extended_read_holds_writer() {
  let (tx, rx) = one2one::<u32>();
  let writer = thread::spawn(move || tx.write(9));

  let doubled = rx
    .read_extended(|v| {
      thread::sleep(Duration::from_millis(40));
      assert!(!writer.is_finished(), "writer released during extended read");
      (v * 2, writer)
    })
    .unwrap();
  assert_eq!(doubled.0, 18);
  doubled.1.join().unwrap().unwrap();
}

#[test]
fn shared_readers_each_get_distinct_values() {
  let (tx, rx) = one2any::<u32>();
  let readers: Vec<_> = (0..4)
    .map(|_| {
      let rx = rx.clone();
      thread::spawn(move || rx.read().unwrap())
    })
    .collect();
  for i in 0..4 {
    tx.write(i).unwrap();
  }
  let mut got: Vec<u32> = readers.into_iter().map(|r| r.join().unwrap()).collect();
  got.sort_unstable();
  assert_eq!(got, vec![0, 1, 2, 3]);
}

#[test]
fn poisoned_shared_reader_fails_all_clones() {
  let (tx, rx) = any2any::<u32>();
  let rx2 = rx.clone();
  tx.poison(2);
  assert_eq!(rx.read().unwrap_err().strength(), 2);
  assert_eq!(rx2.read().unwrap_err().strength(), 2);
  assert!(tx.write(1).is_err());
}

#[test]
fn int_channels() {
  let (tx, rx) = ints::one2one();
  let writer = thread::spawn(move || tx.write(-5));
  assert_eq!(rx.read().unwrap(), -5_i32);
  writer.join().unwrap().unwrap();
}

#[test]
fn symmetric_writer_guard_selected_after_reader_arrives() {
  let (tx, rx) = symmetric::<u32>();
  let reader = thread::spawn(move || {
    thread::sleep(Duration::from_millis(20));
    rx.read()
  });

  let mut alt = Alternative::new(vec![&tx as &dyn Guard]);
  assert_eq!(alt.select(), 0);
  tx.write(3).unwrap();
  assert_eq!(reader.join().unwrap().unwrap(), 3);
}

#[test]
fn symmetric_both_ends_alting() {
  let (tx, rx) = symmetric::<&str>();
  let writer = thread::spawn(move || {
    let mut alt = Alternative::new(vec![&tx as &dyn Guard]);
    alt.select();
    tx.write("hi")
  });

  let mut alt = Alternative::new(vec![&rx as &dyn Guard]);
  assert_eq!(alt.select(), 0);
  assert_eq!(rx.read().unwrap(), "hi");
  writer.join().unwrap().unwrap();
}

fn wait_until(mut condition: impl FnMut() -> bool) {
  let deadline = std::time::Instant::now() + Duration::from_secs(3);
  while !condition() {
    assert!(std::time::Instant::now() < deadline, "condition not reached in time");
    thread::sleep(Duration::from_millis(2));
  }
}

// --- Symmetric channels: poison and pending ---

#[test]
fn symmetric_read_and_write_after_poison_fail_at_once() {
  let (tx, rx) = symmetric::<u32>();
  tx.poison(3);
  assert!(tx.is_poisoned());
  assert!(rx.is_poisoned());
  assert_eq!(rx.read().unwrap_err().strength(), 3);
  assert_eq!(tx.write(1).unwrap_err().strength(), 3);
}

#[test]
fn symmetric_poison_releases_reader_waiting_on_barrier() {
  let (tx, rx) = symmetric::<u32>();
  let reader = thread::spawn(move || rx.read());
  thread::sleep(Duration::from_millis(30));
  assert!(!reader.is_finished());

  tx.poison(3);
  assert_eq!(reader.join().unwrap().unwrap_err().strength(), 3);
}

#[test]
fn symmetric_poison_releases_writer_waiting_on_barrier() {
  let (tx, rx) = symmetric::<u32>();
  let writer = thread::spawn(move || tx.write(5));
  thread::sleep(Duration::from_millis(30));
  assert!(!writer.is_finished());

  rx.poison(2);
  assert_eq!(writer.join().unwrap().unwrap_err().strength(), 2);
}

#[test]
fn symmetric_poison_releases_selecting_reader() {
  let (tx, rx) = symmetric::<u32>();
  let reader = thread::spawn(move || {
    let mut alt = Alternative::new(vec![&rx as &dyn Guard]);
    let selected = alt.select();
    (selected, rx.read())
  });
  thread::sleep(Duration::from_millis(30));
  assert!(!reader.is_finished());

  tx.poison(4);
  let (selected, read) = reader.join().unwrap();
  assert_eq!(selected, 0);
  assert_eq!(read.unwrap_err().strength(), 4);
}

#[test]
fn poisoned_symmetric_ends_are_ready_guards() {
  let (tx, rx) = symmetric::<u32>();
  rx.poison(1);
  let skip = crate::alt::Skip;

  let mut alt = Alternative::new(vec![&rx as &dyn Guard, &skip]);
  assert_eq!(alt.pri_select(), 0);
  let mut alt = Alternative::new(vec![&tx as &dyn Guard, &skip]);
  assert_eq!(alt.pri_select(), 0);
  assert!(tx.write(1).is_err());
}

#[test]
fn symmetric_poison_below_immunity_keeps_barrier() {
  let (tx, rx) = symmetric::<u32>();
  tx.poison(0);
  assert!(!rx.is_poisoned());
  assert!(!rx.pending());

  let writer = thread::spawn(move || tx.write(8));
  assert_eq!(rx.read().unwrap(), 8);
  writer.join().unwrap().unwrap();
}

#[test]
fn symmetric_receiver_pending_when_writer_offers() {
  let (tx, rx) = symmetric::<u32>();
  assert!(!rx.pending());

  let writer = thread::spawn(move || {
    tx.write(9).unwrap();
    tx
  });
  wait_until(|| rx.pending());
  assert_eq!(rx.read().unwrap(), 9);
  let _tx = writer.join().unwrap();
  assert!(!rx.pending());
}

#[test]
fn symmetric_sender_pending_when_reader_offers() {
  let (tx, rx) = symmetric::<u32>();
  assert!(!tx.pending());

  let reader = thread::spawn(move || rx.read());
  wait_until(|| tx.pending());
  tx.write(11).unwrap();
  assert_eq!(reader.join().unwrap().unwrap(), 11);

  tx.poison(1);
  assert!(tx.pending());
}

#[test]
fn shared_receiver_pending_reflects_buffer() {
  let (tx, rx) = ChannelBuilder::<u32>::new()
    .policy(BufferPolicy::Fifo { capacity: 2 })
    .unwrap()
    .one2any();
  let other = rx.clone();
  assert!(!rx.pending());

  tx.write(1).unwrap();
  assert!(rx.pending());
  assert!(other.pending());
  assert_eq!(other.read().unwrap(), 1);
  assert!(!rx.pending());

  tx.poison(1);
  assert!(rx.pending());
}

// --- Filters ---

#[test]
fn filters_run_in_order_on_each_side() {
  let (tx, rx) = ChannelBuilder::<i32>::new()
    .policy(BufferPolicy::Fifo { capacity: 4 })
    .unwrap()
    .write_filter(|v: i32| v + 1)
    .write_filter(|v: i32| v * 2)
    .read_filter(|v: i32| v - 3)
    .one2one();
  tx.write(5).unwrap();
  tx.write(0).unwrap();
  assert_eq!(rx.read().unwrap(), 9);
  assert_eq!(rx.read().unwrap(), -1);
}

#[test]
fn write_filter_runs_in_writer_before_buffering() {
  let (tx, rx) = ChannelBuilder::<String>::new()
    .policy(BufferPolicy::Fifo { capacity: 1 })
    .unwrap()
    .write_filter(|s: String| s.to_uppercase())
    .one2one();
  tx.write("abc".to_owned()).unwrap();
  assert!(rx.read_extended(|s| s == "ABC").unwrap());

  tx.write("xy".to_owned()).unwrap();
  assert_eq!(rx.read().unwrap(), "XY");
}

#[test]
fn filters_apply_to_shared_ends_and_arrays() {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  let seen = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&seen);
  let builder = ChannelBuilder::<u32>::new()
    .write_filter(move |v: u32| {
      counter.fetch_add(1, Ordering::SeqCst);
      v
    })
    .read_filter(|v: u32| v + 100);

  let (tx, rx) = builder.any2any();
  let tx2 = tx.clone();
  let writer = thread::spawn(move || tx2.write(1));
  assert_eq!(rx.clone().read().unwrap(), 101);
  writer.join().unwrap().unwrap();

  let channels = builder.any2one_array(3);
  let writers: Vec<_> = channels
    .iter()
    .enumerate()
    .map(|(i, (tx, _))| {
      let tx = tx.clone();
      thread::spawn(move || tx.write(i as u32))
    })
    .collect();
  let got: Vec<u32> = channels.iter().map(|(_, rx)| rx.read().unwrap()).collect();
  for writer in writers {
    writer.join().unwrap().unwrap();
  }
  assert_eq!(got, vec![100, 101, 102]);
  assert_eq!(seen.load(Ordering::SeqCst), 4);
}

#[test]
fn filtered_receiver_still_works_as_guard() {
  let (tx, rx) = ChannelBuilder::<u8>::new()
    .policy(BufferPolicy::Fifo { capacity: 1 })
    .unwrap()
    .read_filter(|v: u8| v.saturating_mul(2))
    .one2one();
  tx.write(21).unwrap();
  let mut alt = Alternative::new(vec![&rx as &dyn Guard]);
  assert_eq!(alt.select(), 0);
  assert_eq!(rx.read().unwrap(), 42);
}
