//! The density grid: one counter per output pixel, bumped every time
//! an escaping orbit passes through it.
//!
//! Every worker writes here, so the counters live behind a single
//! lock.  Workers never touch it per point; they hand over a whole
//! cycle's worth of pixels at once, and the renderer takes a private
//! copy rather than holding the lock while it encodes an image.

use std::sync::Mutex;

use crate::error::{BuddhaError, Result};
use crate::planes::Pixel;

/// A point-in-time copy of the counters.  Always holds exactly
/// `width * height` of them.
#[derive(Clone, Debug, PartialEq)]
pub struct DensitySnapshot {
    width: usize,
    height: usize,
    counts: Vec<u16>,
}

fn check_len(width: usize, height: usize, counts: &[u16]) -> std::result::Result<(), String> {
    if counts.len() == width * height {
        Ok(())
    } else {
        Err(format!(
            "expected {} counters for a {}x{} grid, found {}",
            width * height,
            width,
            height,
            counts.len()
        ))
    }
}

impl DensitySnapshot {
    /// A snapshot over row-major `counts`, which must number
    /// `width * height`.
    pub fn new(width: usize, height: usize, counts: Vec<u16>) -> Result<Self> {
        check_len(width, height, &counts).map_err(BuddhaError::Configuration)?;
        Ok(DensitySnapshot {
            width,
            height,
            counts,
        })
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The row-major counters.
    pub fn counts(&self) -> &[u16] {
        &self.counts
    }

    /// The largest counter, 0 for an empty grid.
    pub fn max(&self) -> u16 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// The sum of every counter.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// The counter under pixel (x, y).
    pub fn at(&self, x: usize, y: usize) -> u16 {
        self.counts[y * self.width + x]
    }
}

/// The shared histogram.  Counters saturate at `u16::MAX` instead of
/// wrapping, and never go down while a run is alive.
#[derive(Debug)]
pub struct DensityGrid {
    width: usize,
    height: usize,
    counts: Mutex<Vec<u16>>,
}

impl DensityGrid {
    /// An empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        DensityGrid {
            width,
            height,
            counts: Mutex::new(vec![0; width * height]),
        }
    }

    /// A grid seeded with counts recovered from a checkpoint.
    pub fn from_counts(width: usize, height: usize, counts: Vec<u16>) -> Result<Self> {
        check_len(width, height, &counts).map_err(BuddhaError::CheckpointLoad)?;
        Ok(DensityGrid {
            width,
            height,
            counts: Mutex::new(counts),
        })
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Adds one hit per pixel in `pixels`, under a single acquisition
    /// of the lock.  Pixels outside the grid are ignored.
    pub fn apply_batch(&self, pixels: &[Pixel]) {
        if pixels.is_empty() {
            return;
        }
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        for &Pixel(x, y) in pixels {
            if x >= self.width || y >= self.height {
                continue;
            }
            let slot = &mut counts[y * self.width + x];
            *slot = slot.saturating_add(1);
        }
    }

    /// Copies the counters out.
    pub fn snapshot(&self) -> DensitySnapshot {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        DensitySnapshot {
            width: self.width,
            height: self.height,
            counts: counts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_increment_each_pixel() {
        let grid = DensityGrid::new(4, 3);
        grid.apply_batch(&[Pixel(0, 0), Pixel(3, 2), Pixel(3, 2)]);
        let snap = grid.snapshot();
        assert_eq!(snap.at(0, 0), 1);
        assert_eq!(snap.at(3, 2), 2);
        assert_eq!(snap.total(), 3);
        assert_eq!(snap.max(), 2);
    }

    #[test]
    fn order_of_batches_does_not_matter() {
        let pixels: Vec<Pixel> = (0..60).map(|n| Pixel(n % 5, (n * 7) % 4)).collect();

        let forward = DensityGrid::new(5, 4);
        for chunk in pixels.chunks(7) {
            forward.apply_batch(chunk);
        }

        let mut reversed: Vec<Pixel> = pixels.clone();
        reversed.reverse();
        let backward = DensityGrid::new(5, 4);
        for chunk in reversed.chunks(11) {
            backward.apply_batch(chunk);
        }

        let whole = DensityGrid::new(5, 4);
        whole.apply_batch(&pixels);

        assert_eq!(forward.snapshot(), backward.snapshot());
        assert_eq!(forward.snapshot(), whole.snapshot());
    }

    #[test]
    fn counters_saturate() {
        let mut counts = vec![0; 4];
        counts[1] = u16::MAX - 1;
        let grid = DensityGrid::from_counts(2, 2, counts).unwrap();
        grid.apply_batch(&[Pixel(1, 0), Pixel(1, 0), Pixel(1, 0)]);
        assert_eq!(grid.snapshot().at(1, 0), u16::MAX);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let grid = DensityGrid::new(2, 2);
        let before = grid.snapshot();
        grid.apply_batch(&[Pixel(1, 1)]);
        assert_eq!(before.total(), 0);
        assert_eq!(grid.snapshot().total(), 1);
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let grid = DensityGrid::new(2, 2);
        grid.apply_batch(&[Pixel(2, 0), Pixel(0, 2)]);
        assert_eq!(grid.snapshot().total(), 0);
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        assert!(DensityGrid::from_counts(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn snapshots_must_cover_the_grid() {
        match DensitySnapshot::new(4, 4, vec![1; 15]) {
            Err(BuddhaError::Configuration(_)) => {}
            other => panic!("expected a configuration error, got {:?}", other),
        }
        let snap = DensitySnapshot::new(2, 3, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!((snap.width(), snap.height()), (2, 3));
        assert_eq!(snap.at(1, 2), 5);
        assert_eq!(snap.counts().len(), 6);
    }
}
