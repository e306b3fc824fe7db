//! Where candidate seeds come from.
//!
//! Each seed is `precision` random bits scaled by an exact power of two
//! and shifted by an integer, so generation itself never rounds: the
//! real part lands in [-2, 2), the imaginary part in [-1, 1).
//!
//! The production source reads the operating system's entropy pool and
//! has no seed.  Tests and benchmarks substitute a seeded generator to
//! get repeatable runs.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use rug::integer::Order;
use rug::{Float, Integer};

use crate::complex::ComplexBig;
use crate::error::{BuddhaError, Result};

/// Anything that can hand out batches of seeds to many workers at once.
pub trait SeedSource: Send + Sync {
    /// Draws `count` seeds at `precision` bits.
    fn draw(&self, count: usize, precision: u32) -> Result<Vec<ComplexBig>>;
}

/// A `SeedSource` over any `rand` generator.  Batches are drawn whole
/// under a lock, so a seeded generator yields the same sequence of
/// batches however many workers pull from it.
#[derive(Debug)]
pub struct RandomSource<R> {
    rng: Mutex<R>,
}

impl<R: RngCore> RandomSource<R> {
    /// Wraps a generator.
    pub fn new(rng: R) -> Self {
        RandomSource {
            rng: Mutex::new(rng),
        }
    }
}

impl RandomSource<OsRng> {
    /// The operating system's entropy pool.
    pub fn entropy() -> Self {
        RandomSource::new(OsRng)
    }
}

impl RandomSource<StdRng> {
    /// A reproducible stream.
    pub fn seeded(seed: u64) -> Self {
        RandomSource::new(StdRng::seed_from_u64(seed))
    }
}

/// `precision` random bits read as a fraction in [0, 1), scaled to
/// [0, 2^`span_log2`), then moved down by `offset`.  Every step is exact.
fn random_part<R: RngCore>(rng: &mut R, precision: u32, span_log2: u32, offset: i32) -> Result<Float> {
    let mut bytes = vec![0_u8; ((precision + 7) / 8) as usize];
    rng.try_fill_bytes(&mut bytes)
        .map_err(BuddhaError::RandomGeneration)?;

    let mut bits = Integer::from_digits(&bytes, Order::Lsf);
    bits.keep_bits_mut(precision);

    let mut part = Float::with_val(precision, &bits);
    part >>= precision - span_log2;
    part -= offset;
    Ok(part)
}

impl<R: RngCore + Send> SeedSource for RandomSource<R> {
    fn draw(&self, count: usize, precision: u32) -> Result<Vec<ComplexBig>> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (0..count)
            .map(|_| {
                let re = random_part(&mut *rng, precision, 2, 2)?;
                let im = random_part(&mut *rng, precision, 1, 1)?;
                Ok(ComplexBig::from_parts(re, im))
            })
            .collect()
    }
}
