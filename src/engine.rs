//! The engine: everything one run shares, in one place.
//!
//! An `Engine` owns the configuration, the sampling grid, the density
//! grid, the progress counters and the seed source.  Workers borrow it;
//! nothing lives in globals.

use tracing::{info, warn};

use crate::checkpoint;
use crate::complex::ComplexBig;
use crate::config::Config;
use crate::density::{DensityGrid, DensitySnapshot};
use crate::error::Result;
use crate::grid::{Classification, SamplingGrid};
use crate::orbit::{iterate, Orbit};
use crate::planes::{Pixel, PlaneMapper};
use crate::progress::Progress;
use crate::seeds::{RandomSource, SeedSource};

/// What a single cycle did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Seeds that made it past both filters.
    pub survivors: usize,
    /// Survivors whose orbits escaped.
    pub escaped: usize,
    /// Orbit points that landed on a pixel.
    pub points: usize,
}

/// The shared state of a run.
pub struct Engine {
    config: Config,
    plane: PlaneMapper,
    grid: SamplingGrid,
    density: DensityGrid,
    progress: Progress,
    seeds: Box<dyn SeedSource>,
}

impl Engine {
    /// Validates `config`, builds the sampling grid and the density
    /// grid, and draws seeds from the operating system.
    pub fn new(config: Config) -> Result<Engine> {
        Engine::with_source(config, Box::new(RandomSource::entropy()))
    }

    /// As `new`, with a caller-supplied seed source.
    pub fn with_source(config: Config, seeds: Box<dyn SeedSource>) -> Result<Engine> {
        config.validate()?;
        let plane = config.plane()?;

        let (density, prior_points, last_max) = Engine::initial_density(&config);

        info!(
            width = config.width,
            height = config.height,
            lanes = config.grid_lanes,
            "Building sampling grid"
        );
        let grid = SamplingGrid::build(
            config.grid_lanes,
            config.max_iterations,
            config.max_concurrency,
            config.precision,
        )?;

        // Started after the grid, so its build time is not charged to
        // the sampling rate.
        let progress = Progress::new(prior_points, last_max);

        Ok(Engine {
            config,
            plane,
            grid,
            density,
            progress,
            seeds,
        })
    }

    // Empty, or recovered from a checkpoint when warm starting.  A bad
    // checkpoint is never fatal.
    fn initial_density(config: &Config) -> (DensityGrid, u64, u16) {
        let fresh = || (DensityGrid::new(config.width, config.height), 0, 0);
        if !config.warm_start {
            return fresh();
        }

        let loaded = checkpoint::load(
            &config.image_path,
            &config.max_path,
            config.width,
            config.height,
        )
        .and_then(|cp| {
            let grid = DensityGrid::from_counts(config.width, config.height, cp.counts)?;
            let max = grid.snapshot().max();
            Ok((grid, cp.prior_points, max))
        });

        match loaded {
            Ok(state) => state,
            Err(e) => {
                warn!("Warm start failed, starting from an empty grid: {}", e);
                fresh()
            }
        }
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The viewport to pixel mapping.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The sampling grid.
    pub fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    /// The running totals.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// A copy of the density counters.
    pub fn snapshot(&self) -> DensitySnapshot {
        self.density.snapshot()
    }

    /// Maps every in-viewport point of an orbit to its pixel.
    pub fn orbit_pixels(&self, orbit: &Orbit) -> Vec<Pixel> {
        orbit
            .points()
            .iter()
            .filter_map(|z| self.plane.orbit_point_to_pixel(z))
            .collect()
    }

    /// Filters, iterates and plots a batch of seeds the caller already
    /// has.
    pub fn run_seeds(&self, seeds: &[ComplexBig]) -> CycleReport {
        let mut report = CycleReport::default();
        let mut pixels = Vec::new();

        for seed in seeds {
            if self.grid.classify(seed) != Classification::NearBorder {
                continue;
            }
            report.survivors += 1;

            let orbit = iterate(seed, self.config.max_iterations);
            if orbit.escaped() {
                report.escaped += 1;
                pixels.extend(self.orbit_pixels(&orbit));
            }
        }

        report.points = pixels.len();
        self.density.apply_batch(&pixels);
        self.progress.points_found.add(pixels.len() as u64);
        self.progress.cycles_run.add(1);
        report
    }

    /// One sampling cycle: draw `cycle_size` seeds and run them.  An
    /// entropy failure aborts the cycle before anything is plotted.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let seeds = self
            .seeds
            .draw(self.config.cycle_size, self.config.precision)?;
        Ok(self.run_seeds(&seeds))
    }

    /// Snapshots, normalizes and persists the density grid, and
    /// records the new maximum for status reports.
    pub fn render_checkpoint(&self) -> Result<u16> {
        let rendered = checkpoint::render(&self.density.snapshot());
        rendered.persist(&self.config.image_path, &self.config.max_path)?;
        self.progress.last_max.set(u64::from(rendered.max));
        Ok(rendered.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            precision: 64,
            max_iterations: 50,
            cycle_size: 10,
            n_cycles: 4,
            max_concurrency: 2,
            width: 80,
            height: 40,
            grid_lanes: 41,
            image_path: dir.join("buddhabrot.png"),
            max_path: dir.join("max.txt"),
            ..Config::default()
        }
    }

    #[test]
    fn bad_configuration_is_refused_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.cycle_size = 0;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn interior_and_far_seeds_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::with_source(config(dir.path()), Box::new(RandomSource::seeded(1))).unwrap();
        let report = engine.run_seeds(&[
            ComplexBig::zero(64),
            ComplexBig::with_val(64, 3.0, 3.0),
        ]);
        assert_eq!(report, CycleReport::default());
        assert_eq!(engine.snapshot().total(), 0);
        assert_eq!(engine.progress().cycles_run.value(), 1);
    }

    #[test]
    fn cycle_points_land_in_the_density_grid() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::with_source(config(dir.path()), Box::new(RandomSource::seeded(9))).unwrap();
        let mut points = 0;
        for _ in 0..20 {
            points += engine.run_cycle().unwrap().points as u64;
        }
        assert_eq!(engine.snapshot().total(), points);
        assert_eq!(engine.progress().points_found.value(), points);
        assert_eq!(engine.progress().cycles_run.value(), 20);
    }

    #[test]
    fn broken_warm_start_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.warm_start = true;
        std::fs::write(&config.image_path, b"not a png").unwrap();
        let engine = Engine::with_source(config, Box::new(RandomSource::seeded(1))).unwrap();
        assert_eq!(engine.snapshot().total(), 0);
        assert_eq!(engine.progress().prior_points(), 0);
    }

    #[test]
    fn render_checkpoint_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::with_source(config(dir.path()), Box::new(RandomSource::seeded(5))).unwrap();
        for _ in 0..10 {
            engine.run_cycle().unwrap();
        }
        let max = engine.render_checkpoint().unwrap();
        assert_eq!(max, engine.snapshot().max().max(1));
        let sidecar = std::fs::read_to_string(dir.path().join("max.txt")).unwrap();
        assert_eq!(sidecar, max.to_string());
        assert!(dir.path().join("buddhabrot.png").exists());
        assert_eq!(engine.progress().last_max.value(), u64::from(max));
    }

    #[test]
    fn failed_checkpoint_leaves_last_max_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.image_path = dir.path().join("missing").join("buddhabrot.png");
        let engine = Engine::with_source(config, Box::new(RandomSource::seeded(5))).unwrap();
        for _ in 0..10 {
            engine.run_cycle().unwrap();
        }
        match engine.render_checkpoint() {
            Err(crate::error::BuddhaError::RenderPersist(_)) => {}
            other => panic!("expected a persist error, got {:?}", other),
        }
        assert_eq!(engine.progress().last_max.value(), 0);
    }
}
