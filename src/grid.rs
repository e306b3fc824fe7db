//! The sampling grid: a coarse, precomputed map of which parts of the
//! plane are inside the Mandelbrot set.
//!
//! Almost every random seed is useless to a Buddhabrot.  Seeds deep
//! inside the set never escape; seeds far outside escape in two or
//! three steps and leave a faint smear.  The visual mass comes from
//! orbits that hug the boundary for a long time before leaving, and
//! those start near the boundary.  So before sampling begins we lay a
//! lattice of `lanes × lanes` points over the plane and iterate each
//! one once.  A candidate seed is then worth the full, arbitrary
//! precision iteration only if the four lattice points around it
//! disagree about membership.
//!
//! The grid is built once, by a handful of threads pulling lattice
//! cells off a shared queue, and never written again, so readers share
//! it freely.

use std::sync::Mutex;

use crossbeam::thread::ScopedJoinHandle;
use itertools::iproduct;
use rug::Float;
use tracing::info;

use crate::complex::ComplexBig;
use crate::error::{BuddhaError, Result};
use crate::orbit::is_bounded;
use crate::planes::ComplexPlane;

/// One lattice point and whether it stayed bounded.
#[derive(Clone, Debug)]
pub struct GridCell {
    /// Where the lattice point sits.
    pub point: ComplexBig,
    /// True if the point never escaped.
    pub bounded: bool,
}

/// How much a candidate seed is worth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Inside the main cardioid; rejected in closed form.
    InteriorAnalytic,
    /// The lattice around it straddles the set boundary.
    NearBorder,
    /// Deep inside, deep outside, or off the grid entirely.
    Elsewhere,
}

/// Closed form test for the main cardioid: reject c when
/// |c|²(8|c|² − 3) ≤ 3/32 − Re(c).
pub fn in_main_cardioid(c: &ComplexBig) -> bool {
    let prec = c.prec();
    let norm = c.norm_sqr();

    let mut left = Float::with_val(prec, &norm * 8);
    left -= 3;
    left *= &norm;

    let mut right = Float::with_val(prec, 3) / 32;
    right -= &c.re;

    left <= right
}

/// The precomputed lattice.
#[derive(Debug)]
pub struct SamplingGrid {
    lanes: usize,
    domain: ComplexPlane,
    // Lattice coordinates along each axis, ascending.
    re_lanes: Vec<f64>,
    im_lanes: Vec<f64>,
    // Real lane major: cells[i * lanes + j] sits at (re_lanes[i], im_lanes[j]).
    cells: Vec<GridCell>,
}

impl SamplingGrid {
    /// Lays a `lanes × lanes` lattice over the standard
    /// [-2, 2] × [-1, 1] domain and classifies every point, using at
    /// most `max_concurrency` threads.
    pub fn build(
        lanes: usize,
        max_iterations: usize,
        max_concurrency: usize,
        prec: u32,
    ) -> Result<SamplingGrid> {
        SamplingGrid::build_over(
            ComplexPlane::buddhabrot(),
            lanes,
            max_iterations,
            max_concurrency,
            prec,
        )
    }

    /// As `build`, over an arbitrary domain.
    pub fn build_over(
        domain: ComplexPlane,
        lanes: usize,
        max_iterations: usize,
        max_concurrency: usize,
        prec: u32,
    ) -> Result<SamplingGrid> {
        if lanes < 2 {
            return Err(BuddhaError::Configuration(format!(
                "the sampling grid needs at least 2 lanes, got {}",
                lanes
            )));
        }
        if max_concurrency == 0 {
            return Err(BuddhaError::Configuration(
                "the sampling grid needs at least one thread".to_string(),
            ));
        }

        let step = |n: usize, low: f64, span: f64| (n as f64 / (lanes - 1) as f64) * span + low;
        let re_lanes: Vec<f64> = (0..lanes)
            .map(|i| step(i, domain.0.re, domain.width()))
            .collect();
        let im_lanes: Vec<f64> = (0..lanes)
            .map(|j| step(j, domain.0.im, domain.height()))
            .collect();

        let queue = Mutex::new(iproduct!(0..lanes, 0..lanes));
        let mut slots: Vec<Option<GridCell>> = vec![None; lanes * lanes];
        {
            let queue = &queue;
            let (re_lanes, im_lanes) = (&re_lanes, &im_lanes);
            let filled = crossbeam::scope(|spawner| {
                let handles: Vec<ScopedJoinHandle<Vec<(usize, GridCell)>>> = (0..max_concurrency)
                    .map(|_| {
                        spawner.spawn(move |_| {
                            let mut done = vec![];
                            loop {
                                let next = { queue.lock().unwrap_or_else(|e| e.into_inner()).next() };
                                match next {
                                    Some((i, j)) => {
                                        let point =
                                            ComplexBig::with_val(prec, re_lanes[i], im_lanes[j]);
                                        let bounded = is_bounded(&point, max_iterations);
                                        done.push((i * lanes + j, GridCell { point, bounded }));
                                    }
                                    None => break,
                                }
                            }
                            done
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join())
                    .collect::<std::thread::Result<Vec<_>>>()
            })
            .map_err(|_| BuddhaError::WorkerPanicked)?
            .map_err(|_| BuddhaError::WorkerPanicked)?;

            for (offset, cell) in filled.into_iter().flatten() {
                slots[offset] = Some(cell);
            }
        }

        let cells: Vec<GridCell> = slots.into_iter().flatten().collect();
        if cells.len() != lanes * lanes {
            return Err(BuddhaError::WorkerPanicked);
        }

        let inside = cells.iter().filter(|cell| cell.bounded).count();
        info!(lanes, inside, "Sampling grid built");

        Ok(SamplingGrid {
            lanes,
            domain,
            re_lanes,
            im_lanes,
            cells,
        })
    }

    /// Lattice points per axis.
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// The region the lattice covers.
    pub fn domain(&self) -> ComplexPlane {
        self.domain
    }

    /// The real coordinate of lane `i`.
    pub fn lane_re(&self, i: usize) -> f64 {
        self.re_lanes[i]
    }

    /// The imaginary coordinate of lane `j`.
    pub fn lane_im(&self, j: usize) -> f64 {
        self.im_lanes[j]
    }

    /// The lattice point at real lane `i`, imaginary lane `j`.
    pub fn cell(&self, i: usize, j: usize) -> &GridCell {
        &self.cells[i * self.lanes + j]
    }

    /// Finds the lattice square holding `c`, then compares its corner
    /// against the left, down-left and down neighbours.  Any
    /// disagreement means the set boundary passes through the square.
    /// Points off the lattice are never near the border.
    pub fn is_near_border(&self, c: &ComplexBig) -> bool {
        // First lane strictly greater than the coordinate.
        let i = self.re_lanes.partition_point(|lane| c.re >= *lane);
        let j = self.im_lanes.partition_point(|lane| c.im >= *lane);
        if i == 0 || j == 0 || i >= self.lanes || j >= self.lanes {
            return false;
        }

        let corner = self.cell(i, j).bounded;
        corner != self.cell(i, j - 1).bounded
            || corner != self.cell(i - 1, j - 1).bounded
            || corner != self.cell(i - 1, j).bounded
    }

    /// The full filter: cardioid first, since it costs a handful of
    /// multiplications, then the lattice.
    pub fn classify(&self, c: &ComplexBig) -> Classification {
        if in_main_cardioid(c) {
            Classification::InteriorAnalytic
        } else if self.is_near_border(c) {
            Classification::NearBorder
        } else {
            Classification::Elsewhere
        }
    }
}
