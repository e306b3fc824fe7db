//! Turning the density grid into a picture, and back again.
//!
//! A checkpoint is two files: a grayscale PNG (stored as opaque RGBA)
//! holding every counter scaled against the largest one, and a text
//! sidecar holding that largest count.  Reading them back inverts the
//! scaling, which loses at most one hit per pixel to 8-bit rounding.
//! The recovered total seeds the "points so far" statistic.

use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use num::clamp;
use tracing::{debug, info};

use crate::density::DensitySnapshot;
use crate::error::{BuddhaError, Result};

/// A rendered snapshot, ready to be written.
#[derive(Clone, Debug)]
pub struct Rendered {
    /// The normalized raster.
    pub image: RgbaImage,
    /// The count that maps to full white, never less than 1.
    pub max: u16,
}

/// What a checkpoint gives back.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    /// Reconstructed row-major counters.
    pub counts: Vec<u16>,
    /// The max count stored in the sidecar.
    pub max: u16,
    /// Sum of the reconstructed counters.
    pub prior_points: u64,
}

/// Scales `count` into 0..=255 against `max`.
fn intensity(count: u16, max: u16) -> u8 {
    let scaled = (f64::from(count) / f64::from(max) * 255.0).round();
    clamp(scaled, 0.0, 255.0) as u8
}

/// The inverse of `intensity`, as near as 8 bits allow.
fn count(intensity: u8, max: u16) -> u16 {
    let scaled = (f64::from(intensity) * f64::from(max) / 255.0).round();
    clamp(scaled, 0.0, f64::from(u16::MAX)) as u16
}

/// Normalizes a snapshot into a raster.  An all-zero snapshot renders
/// black against a max of 1.
pub fn render(snapshot: &DensitySnapshot) -> Rendered {
    let max = snapshot.max().max(1);
    let image = RgbaImage::from_fn(snapshot.width() as u32, snapshot.height() as u32, |x, y| {
        let v = intensity(snapshot.at(x as usize, y as usize), max);
        Rgba([v, v, v, 255])
    });
    Rendered { image, max }
}

impl Rendered {
    /// Writes the raster to `image_path` and the max count to
    /// `max_path`.
    pub fn persist(&self, image_path: &Path, max_path: &Path) -> Result<()> {
        self.image.save(image_path).map_err(|e| {
            BuddhaError::RenderPersist(format!("{}: {}", image_path.display(), e))
        })?;
        fs::write(max_path, self.max.to_string()).map_err(|e| {
            BuddhaError::RenderPersist(format!("{}: {}", max_path.display(), e))
        })?;
        debug!(
            max = self.max,
            "Checkpoint written to {}",
            image_path.display()
        );
        Ok(())
    }
}

/// Reads a checkpoint back for a `width × height` grid.  Any missing
/// file, undecodable image, bad sidecar or size mismatch is a
/// `CheckpointLoad` error; deciding to start fresh is the caller's
/// business.
pub fn load(image_path: &Path, max_path: &Path, width: usize, height: usize) -> Result<Checkpoint> {
    let load_err = |path: &Path, reason: String| {
        BuddhaError::CheckpointLoad(format!("{}: {}", path.display(), reason))
    };

    let image = image::open(image_path)
        .map_err(|e| load_err(image_path, e.to_string()))?
        .to_rgba8();
    if image.dimensions() != (width as u32, height as u32) {
        let (w, h) = image.dimensions();
        return Err(load_err(
            image_path,
            format!("raster is {}x{}, expected {}x{}", w, h, width, height),
        ));
    }

    let sidecar =
        fs::read_to_string(max_path).map_err(|e| load_err(max_path, e.to_string()))?;
    let max: u16 = sidecar
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| load_err(max_path, e.to_string()))?;

    let counts: Vec<u16> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| count(image.get_pixel(x as u32, y as u32).0[0], max))
        .collect();
    let prior_points = counts.iter().map(|&c| u64::from(c)).sum();

    info!(prior_points, max, "Loaded checkpoint {}", image_path.display());
    Ok(Checkpoint {
        counts,
        max,
        prior_points,
    })
}
