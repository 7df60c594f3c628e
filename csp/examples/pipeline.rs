// examples/pipeline.rs
//
// A generator feeds two workers through a one-to-any channel; a collector
// merges their output with a fair Alternative and shuts the network down
// with poison once it has seen enough.

use fibre_csp::{channel, Alternative, Guard, Parallel, PoisonError};

use std::time::Duration;

const WANTED: usize = 12;
const SHUTDOWN: u32 = 1;

fn main() {
  let (jobs_tx, jobs_rx) = channel::one2any::<u64>();
  let (left_tx, left_rx) = channel::one2one::<(usize, u64)>();
  let (right_tx, right_rx) = channel::one2one::<(usize, u64)>();

  let worker = |id: usize, out: &channel::Sender<(usize, u64)>| -> Result<(), PoisonError> {
    let jobs = jobs_rx.clone();
    loop {
      let n = jobs.read()?;
      std::thread::sleep(Duration::from_millis(5 * (id as u64 + 1)));
      out.write((id, n * n))?;
    }
  };

  let result = Parallel::new()
    .add_named("generator", || {
      let mut n = 0;
      loop {
        jobs_tx.write(n)?;
        n += 1;
      }
    })
    .add_named("worker-0", || worker(0, &left_tx).inspect_err(|p| jobs_rx.poison(p.strength())))
    .add_named("worker-1", || worker(1, &right_tx).inspect_err(|p| jobs_rx.poison(p.strength())))
    .add_named("collector", || {
      let mut alt = Alternative::new(vec![&left_rx as &dyn Guard, &right_rx]);
      for _ in 0..WANTED {
        let (id, square) = match alt.fair_select() {
          0 => left_rx.read()?,
          _ => right_rx.read()?,
        };
        println!("worker {id} produced {square}");
      }
      left_rx.poison(SHUTDOWN);
      right_rx.poison(SHUTDOWN);
      Ok(())
    })
    .run();

  match result {
    Ok(()) => println!("network finished"),
    Err(poison) => println!("network shut down by poison of strength {}", poison.strength()),
  }
}
