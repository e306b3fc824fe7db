//! Run configuration, and the little string parsers the command line
//! uses to fill it in.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use num::Complex;

use crate::error::{BuddhaError, Result};
use crate::planes::{ComplexPlane, PlaneMapper};

/// Below this, seed generation has no fractional bits left to work with.
pub const MIN_PRECISION: u32 = 16;

/// Every knob a run has.
#[derive(Clone, Debug)]
pub struct Config {
    /// Bits of mantissa for every arbitrary-precision value.
    pub precision: u32,
    /// Iteration budget per orbit.
    pub max_iterations: usize,
    /// Seeds drawn per cycle.
    pub cycle_size: usize,
    /// Cycles to run in fixed-count mode.
    pub n_cycles: usize,
    /// Worker threads, and the bound on cycles in flight.
    pub max_concurrency: usize,
    /// Run until told to stop instead of for `n_cycles`.
    pub endless: bool,
    /// Resume from the checkpoint at `image_path` and `max_path`.
    pub warm_start: bool,
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
    /// Lower-left corner of the viewport.
    pub leftlower: Complex<f64>,
    /// Upper-right corner of the viewport.
    pub rightupper: Complex<f64>,
    /// Lattice points per axis in the sampling grid.
    pub grid_lanes: usize,
    /// Where the raster goes.
    pub image_path: PathBuf,
    /// Where the max-count sidecar goes.
    pub max_path: PathBuf,
    /// Time between checkpoints.
    pub render_interval: Duration,
    /// Time between status lines.
    pub stats_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let ComplexPlane(leftlower, rightupper) = ComplexPlane::buddhabrot();
        Config {
            precision: 100,
            max_iterations: 100,
            cycle_size: 100,
            n_cycles: 100,
            max_concurrency: num_cpus::get(),
            endless: false,
            warm_start: false,
            width: 1000,
            height: 500,
            leftlower,
            rightupper,
            grid_lanes: 500,
            image_path: PathBuf::from("buddhabrot.png"),
            max_path: PathBuf::from("max.txt"),
            render_interval: Duration::from_secs(2),
            stats_interval: Duration::from_secs(1),
        }
    }
}

fn invalid<T>(message: String) -> Result<T> {
    Err(BuddhaError::Configuration(message))
}

impl Config {
    /// Checks every field; the first problem found is the error.
    pub fn validate(&self) -> Result<()> {
        if self.precision < MIN_PRECISION || self.precision > rug::float::prec_max() {
            return invalid(format!(
                "precision must be between {} and {} bits, got {}",
                MIN_PRECISION,
                rug::float::prec_max(),
                self.precision
            ));
        }
        if self.max_iterations == 0 {
            return invalid("max iterations must be at least 1".to_string());
        }
        if self.cycle_size == 0 {
            return invalid("cycle size must be at least 1".to_string());
        }
        if self.max_concurrency == 0 {
            return invalid("max concurrency must be at least 1".to_string());
        }
        if self.width > u32::MAX as usize || self.height > u32::MAX as usize {
            return invalid(format!(
                "image size {}x{} is too large",
                self.width, self.height
            ));
        }
        if self.grid_lanes < 2 {
            return invalid(format!(
                "the sampling grid needs at least 2 lanes, got {}",
                self.grid_lanes
            ));
        }
        if self.render_interval == Duration::from_secs(0)
            || self.stats_interval == Duration::from_secs(0)
        {
            return invalid("timer intervals must be longer than zero".to_string());
        }
        self.plane().map(|_| ())
    }

    /// The pixel mapping this configuration describes.
    pub fn plane(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(self.width, self.height, self.leftlower, self.rightupper)
    }
}

/// Given a string and a separator, returns the two values
/// separated by the separator.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
pub fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let mut config = Config::default();
        config.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cycle_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_precision_is_rejected() {
        let mut config = Config::default();
        config.precision = 4;
        match config.validate() {
            Err(BuddhaError::Configuration(_)) => {}
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn precision_floor_is_inclusive() {
        let mut config = Config::default();
        config.precision = MIN_PRECISION;
        assert!(config.validate().is_ok());
        config.precision = MIN_PRECISION - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_viewport_is_rejected() {
        let mut config = Config::default();
        config.leftlower = Complex::new(1.0, 1.0);
        config.rightupper = Complex::new(-1.0, -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn pairs_parse() {
        assert_eq!(parse_pair::<usize>("1000x500", 'x'), Some((1000, 500)));
        assert_eq!(parse_pair::<usize>("1000x", 'x'), None);
        assert_eq!(parse_pair::<usize>("1000", 'x'), None);
        assert_eq!(parse_complex("-2.0,1.5"), Some(Complex::new(-2.0, 1.5)));
        assert_eq!(parse_complex("-2.0;1.5"), None);
    }
}
