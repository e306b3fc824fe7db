//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners of the
//! viewport.
use num::Complex;

use crate::complex::ComplexBig;
use crate::error::{BuddhaError, Result};

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.  For that reason,
/// the lower-left-hand corner is not included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// Complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl ComplexPlane {
    /// The full region the Buddhabrot lives in: [-2, 2] × [-1, 1].
    pub fn buddhabrot() -> Self {
        ComplexPlane(Complex::new(-2.0, -1.0), Complex::new(2.0, 1.0))
    }

    /// Width of the region along the real axis.
    pub fn width(&self) -> f64 {
        self.1.re - self.0.re
    }

    /// Height of the region along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.1.im - self.0.im
    }
}

/// The x, y of a pixel in the density grid.  Only ever produced for
/// points that fall inside the viewport.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps orbit points from the latter
/// onto the former.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the viewport, left-lower and
    /// right-upper
    pub complex_plane: ComplexPlane,
    // The ratio mapping the width and height, respectively, of the two
    // different planes.
    grid_factors: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane, and two
    /// points describing the viewport on the complex plane.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(BuddhaError::Configuration(format!(
                "image size {}x{} has no pixels",
                width, height
            )));
        }

        if rightupper.re <= leftlower.re {
            return Err(BuddhaError::Configuration(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }

        if rightupper.im <= leftlower.im {
            return Err(BuddhaError::Configuration(
                "The left lower corner is not lower than the right upper corner".to_string(),
            ));
        }

        let complex_plane = ComplexPlane(leftlower, rightupper);

        // these are the multipliers of the complex plane to the integral plane.
        let grid_factors = (
            (width as f64) / complex_plane.width(),
            (height as f64) / complex_plane.height(),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane,
            grid_factors,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a complex number corresponding to a location on the
    /// complex cartesian plane, map that as closely as possible to a
    /// point on the integral cartesian plane.  Points outside the
    /// viewport, and the far edges of it, have no pixel.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let ComplexPlane(leftlower, rightupper) = self.complex_plane;
        if point.re < leftlower.re
            || point.re > rightupper.re
            || point.im < leftlower.im
            || point.im > rightupper.im
        {
            return None;
        }
        let left = ((point.re - leftlower.re) * self.grid_factors.0) as usize;
        let top = ((point.im - leftlower.im) * self.grid_factors.1) as usize;
        if left >= self.integral_plane.0 || top >= self.integral_plane.1 {
            return None;
        }
        Some(Pixel(left, top))
    }

    /// The same mapping for an orbit point still in arbitrary precision.
    pub fn orbit_point_to_pixel(&self, point: &ComplexBig) -> Option<Pixel> {
        self.point_to_pixel(&point.to_f64())
    }

    /// Since the Buddhabrot actually tracks the progress of a complex
    /// number as it orbits the Mandelbrot set's interior, we have to
    /// map those pixels back into the flat counter buffer.  This
    /// returns the linear offset from the root of the buffer.
    pub fn pixel_to_offset(&self, pixel: Pixel) -> usize {
        pixel.1 * self.integral_plane.0 + pixel.0
    }
}
