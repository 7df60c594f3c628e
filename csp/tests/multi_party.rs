mod common;
use common::*;

use fibre_csp::{channel, ChannelBuilder, Parallel};

use std::collections::HashSet;
use std::sync::Mutex;

#[test]
fn many_writers_one_reader() {
  init_tracing();
  let writers = 4;
  let (tx, rx) = channel::any2one::<(usize, usize)>();
  let mut last_seen = vec![None; writers];
  let mut par = Parallel::new();
  for w in 0..writers {
    let tx = tx.clone();
    par = par.add(move || (0..ITEMS_MEDIUM).try_for_each(|i| tx.write((w, i))));
  }
  par = par.add(|| {
    for _ in 0..writers * ITEMS_MEDIUM {
      let (w, i) = rx.read()?;
      // Each writer's own values arrive in order.
      if let Some(prev) = last_seen[w] {
        assert!(i > prev);
      }
      last_seen[w] = Some(i);
    }
    Ok(())
  });
  par.run().unwrap();
  assert!(last_seen.iter().all(|s| *s == Some(ITEMS_MEDIUM - 1)));
}

#[test]
fn one_writer_many_readers() {
  let readers = 4;
  let (tx, rx) = channel::one2any::<usize>();
  let seen = Mutex::new(HashSet::new());
  let per_reader = ITEMS_MEDIUM / readers;

  let mut par = Parallel::new();
  for _ in 0..readers {
    let rx = rx.clone();
    let seen = &seen;
    par = par.add(move || {
      for _ in 0..per_reader {
        let v = rx.read()?;
        assert!(seen.lock().unwrap().insert(v));
      }
      Ok(())
    });
  }
  par = par.add(|| (0..per_reader * readers).try_for_each(|i| tx.write(i)));
  par.run().unwrap();
  assert_eq!(seen.into_inner().unwrap().len(), per_reader * readers);
}

#[test]
fn any2any_buffered_delivers_everything_once() {
  let (tx, rx) = ChannelBuilder::<usize>::new()
    .policy(fibre_csp::BufferPolicy::Fifo { capacity: 8 })
    .unwrap()
    .any2any();
  let seen = Mutex::new(Vec::new());
  let (writers, readers) = (3, 3);

  let mut par = Parallel::new();
  for w in 0..writers {
    let tx = tx.clone();
    par = par.add(move || (0..ITEMS_LOW).try_for_each(|i| tx.write(w * ITEMS_LOW + i)));
  }
  for _ in 0..readers {
    let rx = rx.clone();
    let seen = &seen;
    par = par.add(move || {
      for _ in 0..ITEMS_LOW {
        seen.lock().unwrap().push(rx.read()?);
      }
      Ok(())
    });
  }
  par.run().unwrap();

  let mut seen = seen.into_inner().unwrap();
  seen.sort_unstable();
  assert_eq!(seen, (0..writers * ITEMS_LOW).collect::<Vec<_>>());
}

#[test]
fn shared_readers_extended_reads_each_take_one_value() {
  let (tx, rx) = channel::one2any::<u32>();
  let inside = Mutex::new(0u32);
  let rx2 = rx.clone();

  let check = |v: u32| {
    let mut n = inside.lock().unwrap();
    *n += v;
  };
  Parallel::new()
    .add(|| (0..20).try_for_each(|_| tx.write(1)))
    .add(|| (0..10).try_for_each(|_| rx.read_extended(check)))
    .add(|| (0..10).try_for_each(|_| rx2.read_extended(check)))
    .run()
    .unwrap();
  assert_eq!(*inside.lock().unwrap(), 20);
}
