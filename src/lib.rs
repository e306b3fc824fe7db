#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stochastic, arbitrary-precision Buddhabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore "what's in the black heart" of the Mandelbrot.
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! multiplies it by itself, measuring how quickly that number goes to
//! infinity.  The Buddhabrot instead follows the points that *do*
//! escape, and plots every stop along the way: each iteration creates
//! a new complex number that itself may be used as a coordinate on
//! the complex plane, and by mapping that coordinate to the nearest
//! integral pixel and incrementing that pixel by one, the orbits pile
//! up into a density picture.
//!
//! This crate samples seeds at random rather than walking a pixel
//! raster, so a run can go on for as long as you care to let it and
//! keep getting sharper.  The pieces, from the bottom up:
//!
//! - [`complex`]: complex numbers over MPFR floats, at a chosen
//!   precision.
//! - [`orbit`]: z ← z² + c with Brent's cycle detection.
//! - [`grid`]: a coarse lattice used to throw away seeds that are
//!   nowhere near the set boundary, plus a closed-form cardioid test.
//! - [`density`]: the shared histogram, written in batches.
//! - [`engine`] and [`scheduler`]: one cycle of
//!   draw/filter/iterate/plot, run on a bounded pool of threads.
//! - [`checkpoint`]: normalizing the histogram into a PNG, and reading
//!   it back to resume.

pub mod checkpoint;
pub mod complex;
pub mod config;
pub mod density;
pub mod engine;
pub mod error;
pub mod grid;
pub mod orbit;
pub mod planes;
pub mod progress;
pub mod scheduler;
pub mod seeds;

pub use complex::ComplexBig;
pub use config::Config;
pub use density::{DensityGrid, DensitySnapshot};
pub use engine::{CycleReport, Engine};
pub use error::{BuddhaError, Result};
pub use grid::{Classification, SamplingGrid};
pub use orbit::{iterate, Orbit};
pub use planes::{Pixel, PlaneMapper};
pub use seeds::{RandomSource, SeedSource};
