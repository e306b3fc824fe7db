//! Orbit iteration for z ← z² + c.
//!
//! Points inside the Mandelbrot set never escape, and waiting out
//! `max_iterations` for each of them is where most of the time of a
//! naive Buddhabrot goes.  Many interior orbits fall into an exact
//! cycle long before the budget runs out, so we run Brent's cycle
//! detection alongside the escape test: keep one snapshot of z,
//! compare every new z against it, and move the snapshot forward
//! whenever a doubling step budget runs out.  Only the snapshot is
//! kept for the cycle check; the orbit itself is retained only when the
//! caller wants it.

use crate::complex::ComplexBig;

/// Squared escape radius.  |z| > 2 is tested as |z|² > 4.
const ESCAPE_NORM: f64 = 4.0;

/// What happened to an orbit.
#[derive(Clone, Debug, PartialEq)]
pub enum Orbit {
    /// The orbit left the radius-2 disk.  Holds every point visited
    /// before the escape, in order; the escaping point itself is not
    /// included.
    Escaped(Vec<ComplexBig>),
    /// The orbit cycled or ran out of iterations.  Either way it
    /// contributes nothing.
    Bounded,
}

impl Orbit {
    /// True if the orbit left the disk.
    pub fn escaped(&self) -> bool {
        match self {
            Orbit::Escaped(_) => true,
            Orbit::Bounded => false,
        }
    }

    /// The visited points; empty for a bounded orbit.
    pub fn points(&self) -> &[ComplexBig] {
        match self {
            Orbit::Escaped(points) => points,
            Orbit::Bounded => &[],
        }
    }
}

/// Runs the iteration, handing each pre-escape point to `visit`.
/// Returns true on escape, false on a detected cycle or an exhausted
/// budget.
fn walk<F>(seed: &ComplexBig, max_iterations: usize, mut visit: F) -> bool
where
    F: FnMut(&ComplexBig),
{
    let prec = seed.prec();
    let mut z = ComplexBig::zero(prec);
    let mut snapshot = ComplexBig::zero(prec);
    let mut steps_taken = 0_usize;
    let mut step_limit = 2_usize;

    for _ in 0..max_iterations {
        z = z.square();
        z += seed;

        if z == snapshot {
            return false;
        }

        if steps_taken == step_limit {
            snapshot = z.clone();
            steps_taken = 0;
            step_limit *= 2;
        }
        steps_taken += 1;

        if z.norm_sqr() > ESCAPE_NORM {
            return true;
        }
        visit(&z);
    }
    false
}

/// Iterates `seed` for at most `max_iterations` steps and, if it
/// escapes, returns the trajectory that got it there.
pub fn iterate(seed: &ComplexBig, max_iterations: usize) -> Orbit {
    let mut points = Vec::new();
    if walk(seed, max_iterations, |z| points.push(z.clone())) {
        Orbit::Escaped(points)
    } else {
        Orbit::Bounded
    }
}

/// The cheap membership test used to build the sampling grid: same
/// iteration, nothing retained.
pub fn is_bounded(seed: &ComplexBig, max_iterations: usize) -> bool {
    !walk(seed, max_iterations, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREC: u32 = 80;

    #[test]
    fn origin_never_escapes() {
        let origin = ComplexBig::zero(PREC);
        for limit in 1..64 {
            assert_eq!(iterate(&origin, limit), Orbit::Bounded);
        }
    }

    #[test]
    fn escaping_orbit_keeps_only_pre_escape_points() {
        // 1 → 2 → 5: the third step escapes.
        let seed = ComplexBig::with_val(PREC, 1.0, 0.0);
        let orbit = iterate(&seed, 100);
        assert_eq!(
            orbit.points(),
            &[
                ComplexBig::with_val(PREC, 1.0, 0.0),
                ComplexBig::with_val(PREC, 2.0, 0.0)
            ][..]
        );
    }

    #[test]
    fn escape_point_is_beyond_the_radius() {
        let seed = ComplexBig::with_val(PREC, -0.74, 0.21);
        let points = match iterate(&seed, 1000) {
            Orbit::Escaped(points) => points,
            Orbit::Bounded => panic!("seed should escape"),
        };
        let last = points.last().cloned().unwrap_or_else(|| ComplexBig::zero(PREC));
        let mut next = last.square();
        next += &seed;
        assert!(next.magnitude() > 2.0);
        assert!(points.iter().all(|p| p.magnitude() <= 2.0));
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn period_two_cycle_is_caught() {
        // c = -1 bounces 0 → -1 → 0 forever.
        let seed = ComplexBig::with_val(PREC, -1.0, 0.0);
        assert_eq!(iterate(&seed, 1_000_000), Orbit::Bounded);
    }

    #[test]
    fn budget_exhaustion_counts_as_bounded() {
        // Escapes, but only after more than three steps.
        let seed = ComplexBig::with_val(PREC, 0.3, 0.0);
        assert!(iterate(&seed, 3_000).escaped());
        assert_eq!(iterate(&seed, 3), Orbit::Bounded);
    }

    #[test]
    fn bounded_check_agrees_with_iterate() {
        for &(re, im) in &[(0.0, 0.0), (-1.0, 0.0), (1.0, 1.0), (-0.1, 0.65), (0.26, 0.0)] {
            let seed = ComplexBig::with_val(PREC, re, im);
            assert_eq!(is_bounded(&seed, 500), !iterate(&seed, 500).escaped());
        }
    }
}
