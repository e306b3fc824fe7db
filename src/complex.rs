//! Complex numbers built out of two MPFR floats.
//!
//! `rug` ships its own `Complex`, but that drags in MPC for the sake of
//! three operations.  All the Buddhabrot needs is squaring, adding, a
//! magnitude and an exact comparison, so we carry the two halves
//! ourselves.

use std::ops::AddAssign;

use num::Complex;
use rug::Float;

/// A point on the complex plane at a fixed binary precision.  The
/// precision is set at construction and every value derived from it
/// keeps the same one.
///
/// Equality is exact, digit for digit; that is what lets cycle
/// detection trust a match.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexBig {
    /// The real part, plotted along x.
    pub re: Float,
    /// The imaginary part, plotted along y.
    pub im: Float,
}

impl ComplexBig {
    /// Zero, at `prec` bits.
    pub fn zero(prec: u32) -> Self {
        ComplexBig {
            re: Float::new(prec),
            im: Float::new(prec),
        }
    }

    /// Builds a value from two machine floats, widened to `prec` bits.
    pub fn with_val(prec: u32, re: f64, im: f64) -> Self {
        ComplexBig {
            re: Float::with_val(prec, re),
            im: Float::with_val(prec, im),
        }
    }

    /// Wraps two already-built halves.  The precision of the real part
    /// is the one the rest of the arithmetic will use.
    pub fn from_parts(re: Float, im: Float) -> Self {
        ComplexBig { re, im }
    }

    /// Bits of mantissa carried by this value.
    pub fn prec(&self) -> u32 {
        self.re.prec()
    }

    /// (a + bi)(c + di) = (ac - bd) + (ad + bc)i
    pub fn mul(&self, other: &ComplexBig) -> ComplexBig {
        let prec = self.prec();
        let mut re = Float::with_val(prec, &self.re * &other.re);
        re -= Float::with_val(prec, &self.im * &other.im);
        let mut im = Float::with_val(prec, &self.re * &other.im);
        im += Float::with_val(prec, &self.im * &other.re);
        ComplexBig { re, im }
    }

    /// z², the hot half of z ← z² + c.
    pub fn square(&self) -> ComplexBig {
        self.mul(self)
    }

    /// |z|², which is what escape and cardioid tests really want; it
    /// avoids the square root.
    pub fn norm_sqr(&self) -> Float {
        let prec = self.prec();
        let mut norm = Float::with_val(prec, &self.re * &self.re);
        norm += Float::with_val(prec, &self.im * &self.im);
        norm
    }

    /// |z|
    pub fn magnitude(&self) -> Float {
        self.norm_sqr().sqrt()
    }

    /// The mirror image across the real axis.
    pub fn conjugate(&self) -> ComplexBig {
        ComplexBig {
            re: self.re.clone(),
            im: -self.im.clone(),
        }
    }

    /// Rounds both halves to machine floats, for pixel mapping.
    pub fn to_f64(&self) -> Complex<f64> {
        Complex::new(self.re.to_f64(), self.im.to_f64())
    }
}

/// In-place addition, the only mutating arithmetic on the type.
impl<'a> AddAssign<&'a ComplexBig> for ComplexBig {
    fn add_assign(&mut self, other: &'a ComplexBig) {
        self.re += &other.re;
        self.im += &other.im;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREC: u32 = 64;

    #[test]
    fn multiplies() {
        let a = ComplexBig::with_val(PREC, 2.0, 4.0);
        let b = ComplexBig::with_val(PREC, 3.0, 5.0);
        assert_eq!(a.mul(&b), ComplexBig::with_val(PREC, -14.0, 22.0));

        let a = ComplexBig::with_val(PREC, 6.0, 3.0);
        let b = ComplexBig::with_val(PREC, 7.0, -1.0);
        assert_eq!(a.mul(&b), ComplexBig::with_val(PREC, 45.0, 15.0));
    }

    #[test]
    fn multiply_leaves_inputs_alone() {
        let a = ComplexBig::with_val(PREC, 1.5, -2.0);
        let before = a.clone();
        let _ = a.square();
        assert_eq!(a, before);
    }

    #[test]
    fn adds_in_place() {
        let mut a = ComplexBig::with_val(PREC, 2.0, 52.0);
        let b = ComplexBig::with_val(PREC, -5.0, -2.0);
        a += &b;
        assert_eq!(a, ComplexBig::with_val(PREC, -3.0, 50.0));
        assert_eq!(b, ComplexBig::with_val(PREC, -5.0, -2.0));
    }

    #[test]
    fn magnitude_is_exact_for_pythagorean_triples() {
        let a = ComplexBig::with_val(PREC, 5.0, 12.0);
        assert_eq!(a.magnitude(), 13.0);
        let b = ComplexBig::with_val(PREC, 3.0, -2.0);
        assert_eq!(b.magnitude(), Float::with_val(PREC, 13.0).sqrt());
    }

    #[test]
    fn equality_is_not_approximate() {
        let a = ComplexBig::with_val(200, 0.25, 0.5);
        let mut b = a.clone();
        b.re += Float::with_val(200, Float::i_exp(1, -150));
        assert_ne!(a, b);
    }

    #[test]
    fn conjugate_mirrors_imaginary_part() {
        let a = ComplexBig::with_val(PREC, -0.75, 0.125);
        assert_eq!(a.conjugate(), ComplexBig::with_val(PREC, -0.75, -0.125));
    }

    #[test]
    fn precision_survives_arithmetic() {
        let a = ComplexBig::with_val(256, 0.1, 0.2);
        assert_eq!(a.square().prec(), 256);
        assert_eq!(a.norm_sqr().prec(), 256);
    }
}
