//! Driving the engine: how many cycles run, on how many threads, and
//! when the picture gets written.
//!
//! A fixed pool of `max_concurrency` workers waits on a rendezvous
//! channel.  The scheduler hands each idle worker a ticket for one
//! cycle; when every worker is busy, handing out the next ticket
//! blocks, so at most `max_concurrency` cycles are ever in flight.
//! Closing the channel lets the workers drain and exit.
//!
//! Alongside the workers a timer thread checkpoints the grid every
//! `render_interval` and logs a status line every `stats_interval`.
//! When the run ends, for whatever reason, in-flight cycles finish,
//! and then the grid is rendered one last time.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;
use crossbeam::thread::ScopedJoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::error::{BuddhaError, Result};
use crate::progress::RunStats;

/// How often the timer wakes up to look at the clock and the stop flag.
const TICK: Duration = Duration::from_millis(50);

/// Runs the engine in whichever mode its configuration asks for, then
/// writes the final checkpoint.  `quit` is only consulted in endless
/// mode.
pub fn run(engine: &Engine, quit: &AtomicBool) -> Result<RunStats> {
    let config = engine.config();
    if config.endless {
        info!(threads = config.max_concurrency, "Sampling until told to stop");
        run_endless(engine, quit)?;
    } else {
        info!(
            cycles = config.n_cycles,
            threads = config.max_concurrency,
            "Sampling a fixed number of cycles"
        );
        run_cycles(engine, config.n_cycles)?;
    }

    let max = engine.render_checkpoint()?;
    let stats = engine.progress().stats();
    info!(max, "Final render written to {}", config.image_path.display());
    Ok(stats)
}

/// Runs exactly `n_cycles` cycles and returns once all of them have
/// finished.
pub fn run_cycles(engine: &Engine, n_cycles: usize) -> Result<()> {
    let never = AtomicBool::new(false);
    let mut remaining = n_cycles;
    drive(engine, &never, move || {
        if remaining == 0 {
            false
        } else {
            remaining -= 1;
            true
        }
    })
}

/// Runs cycles until `quit` is raised, then waits for the ones already
/// started.
pub fn run_endless(engine: &Engine, quit: &AtomicBool) -> Result<()> {
    drive(engine, quit, || true)
}

/// Raises `quit` once a line (or end of file) arrives on standard
/// input.  The reader thread is detached; it is parked on stdin and
/// dies with the process.
pub fn quit_on_input(quit: Arc<AtomicBool>) {
    info!("Press enter to quit");
    watch_for_quit(io::BufReader::new(io::stdin()), quit);
}

// An unreadable input can never deliver the quit line, so it quits too.
fn watch_for_quit<R>(mut input: R, quit: Arc<AtomicBool>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = input.read_line(&mut line) {
            warn!("Could not read the quit signal: {}", e);
        }
        info!("Quitting...");
        quit.store(true, Ordering::SeqCst);
    })
}

fn drive<F>(engine: &Engine, quit: &AtomicBool, mut more: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let config = engine.config();
    let failed = AtomicBool::new(false);
    let finished = AtomicBool::new(false);
    let (tickets, inbox) = channel::bounded::<()>(0);

    let outcome = crossbeam::scope(|spawner| {
        let failed = &failed;
        let finished = &finished;

        let workers: Vec<ScopedJoinHandle<Result<u64>>> = (0..config.max_concurrency)
            .map(|_| {
                let inbox = inbox.clone();
                spawner.spawn(move |_| {
                    let mut cycles = 0;
                    for _ticket in inbox.iter() {
                        if let Err(e) = engine.run_cycle() {
                            failed.store(true, Ordering::SeqCst);
                            return Err(e);
                        }
                        cycles += 1;
                    }
                    Ok(cycles)
                })
            })
            .collect();
        drop(inbox);

        let timer = spawner.spawn(move |_| periodic(engine, finished));

        while more() && !quit.load(Ordering::SeqCst) && !failed.load(Ordering::SeqCst) {
            if tickets.send(()).is_err() {
                break;
            }
        }
        drop(tickets);

        let mut result = Ok(());
        for worker in workers {
            match worker.join() {
                Ok(Ok(cycles)) => debug!(cycles, "Worker finished"),
                Ok(Err(e)) => {
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
                Err(_) => result = Err(BuddhaError::WorkerPanicked),
            }
        }

        finished.store(true, Ordering::SeqCst);
        if timer.join().is_err() {
            result = Err(BuddhaError::WorkerPanicked);
        }
        result
    });

    outcome.map_err(|_| BuddhaError::WorkerPanicked)?
}

// The timer.  A failed checkpoint is logged and sampling goes on; the
// next tick will try again.
fn periodic(engine: &Engine, finished: &AtomicBool) {
    let config = engine.config();
    let mut last_render = Instant::now();
    let mut last_stats = Instant::now();

    while !finished.load(Ordering::SeqCst) {
        thread::sleep(TICK);

        if last_render.elapsed() >= config.render_interval {
            last_render = Instant::now();
            if let Err(e) = engine.render_checkpoint() {
                error!("Periodic checkpoint failed: {}", e);
            }
        }

        if last_stats.elapsed() >= config.stats_interval {
            last_stats = Instant::now();
            info!("{}", engine.progress().stats());
        }
    }
}
