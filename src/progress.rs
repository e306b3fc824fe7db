//! Running totals for status reports.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A 64-bit counter behind its own lock.
#[derive(Debug, Default)]
pub struct Counter(Mutex<u64>);

impl Counter {
    /// Adds `delta`.
    pub fn add(&self, delta: u64) {
        let mut value = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *value = value.saturating_add(delta);
    }

    /// Overwrites the value.
    pub fn set(&self, value: u64) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// Reads the value.
    pub fn value(&self) -> u64 {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Everything the status reporter looks at.  `prior_points` is the
/// baseline recovered from a warm start.
#[derive(Debug)]
pub struct Progress {
    /// Orbit points that landed on a pixel this run.
    pub points_found: Counter,
    /// Cycles completed this run.
    pub cycles_run: Counter,
    /// The maximum counter at the last render.
    pub last_max: Counter,
    prior_points: u64,
    started: Instant,
}

impl Progress {
    /// Fresh totals, with the clock started now.
    pub fn new(prior_points: u64, last_max: u16) -> Self {
        let progress = Progress {
            points_found: Counter::default(),
            cycles_run: Counter::default(),
            last_max: Counter::default(),
            prior_points,
            started: Instant::now(),
        };
        progress.last_max.set(u64::from(last_max));
        progress
    }

    /// Points accumulated before this run began.
    pub fn prior_points(&self) -> u64 {
        self.prior_points
    }

    /// Reads every total at once.
    pub fn stats(&self) -> RunStats {
        let elapsed = self.started.elapsed();
        let new_points = self.points_found.value();
        let seconds = elapsed.as_secs().max(1);
        RunStats {
            cycles: self.cycles_run.value(),
            new_points,
            total_points: new_points + self.prior_points,
            points_per_second: new_points / seconds,
            max: self.last_max.value(),
            elapsed,
        }
    }
}

/// A status line.
#[derive(Clone, Debug, PartialEq)]
pub struct RunStats {
    /// Cycles completed.
    pub cycles: u64,
    /// Points found this run.
    pub new_points: u64,
    /// Points found this run plus the warm-start baseline.
    pub total_points: u64,
    /// Average over whole seconds since sampling began.
    pub points_per_second: u64,
    /// Maximum hits on one pixel at the last render.
    pub max: u64,
    /// Time since sampling began.
    pub elapsed: Duration,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cycles {} | new points {} | total points {} | {} points/s | max hits {} | elapsed {:.1?}",
            self.cycles,
            self.new_points,
            self.total_points,
            self.points_per_second,
            self.max,
            self.elapsed
        )
    }
}
