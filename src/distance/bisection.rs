use crate::linalg::length_robust;
use crate::stats::Termination;
use log::warn;

/// Maximum number of bisections needed to reach the machine precision for a
/// floating point format with `mantissa_bits` explicit mantissa bits and a
/// minimum (normal) exponent `min_exponent`
#[must_use]
pub const fn max_bisections(mantissa_bits: u32, min_exponent: i32) -> usize {
    (3 + mantissa_bits as i32 - min_exponent) as usize
}

/// Maximum number of bisections for `f64` (1076)
pub const MAX_BISECTIONS_F64: usize = max_bisections(f64::MANTISSA_DIGITS - 1, f64::MIN_EXP);

/// Maximum number of bisections for `f32` (151)
pub const MAX_BISECTIONS_F32: usize = max_bisections(f32::MANTISSA_DIGITS - 1, f32::MIN_EXP);

/// Closest point and distance for a sub-problem solved by bisection
#[derive(Debug)]
pub struct BisectionSolution {
    pub x: Vec<f64>,
    pub distance: f64,
    /// `None` if the point is on the surface
    pub root: Option<f64>,
    pub iterations: usize,
    pub termination: Option<Termination>,
}

/// Secular function of the bisection
///
/// With the Lagrange multiplier $`\lambda`$, the closest point is
/// $`x_i = e_i^2 y_i / (\lambda + e_i^2)`$ and $`\lambda`$ is the root of
/// $`\sum_i (x_i / e_i)^2 - 1`$. The multiplier is rescaled so that the function reads
/// ```math
/// G(t) = \sum_i \left(\frac{a_i}{b_i + c_i t}\right)^2 - 1
/// ```
/// with $`b_i, c_i \geq 0`$, which is strictly decreasing in $`t`$:
///  - inside ($`\sum_i z_i^2 < 1`$, $`z_i = y_i / e_i`$): $`t = (\lambda + e_{min}^2) / e_{min}^2 \in [z_{m-1}, 1]`$,
///    $`a_i = z_i`$, $`b_i = 1 - w_i`$, $`c_i = w_i`$ with $`w_i = (e_{min} / e_i)^2`$,
///  - outside: $`t = \lambda / e_{max}^2 \geq 0`$, $`a_i = q_i y_i / e_{max}`$,
///    $`b_i = q_i^2`$, $`c_i = 1`$ with $`q_i = e_i / e_{max}`$.
///
/// Only ratios of radii smaller than 1 are squared, and for the smallest axis
/// the denominator is exactly $`t`$ inside, so that neither overflows nor
/// cancels when the radii are very different or the point very close to the center.
#[derive(Debug)]
pub struct SecularFunction {
    num: Vec<f64>,
    offset: Vec<f64>,
    slope: Vec<f64>,
    /// $`x_i = k_i y_i / (b_i + c_i t)`$
    scale: Vec<f64>,
}

impl SecularFunction {
    /// Build the function for a point inside the hyperellipsoid with radii `e`
    /// (non-increasing, > 0), given the scaled coordinates `z`
    #[must_use]
    pub fn inside(e: &[f64], z: &[f64]) -> Self {
        let e_min = e[e.len() - 1];
        let w = e
            .iter()
            .map(|&e| {
                let r = e_min / e;
                r * r
            })
            .collect::<Vec<_>>();
        Self {
            num: z.to_vec(),
            offset: w.iter().map(|w| 1.0 - w).collect(),
            slope: w,
            scale: vec![1.0; e.len()],
        }
    }

    /// Build the function for a point `y` outside the hyperellipsoid with radii `e`
    /// (non-increasing, > 0)
    #[must_use]
    pub fn outside(e: &[f64], y: &[f64]) -> Self {
        let e_max = e[0];
        let q = e.iter().map(|e| e / e_max).collect::<Vec<_>>();
        let q_sqr = q.iter().map(|q| q * q).collect::<Vec<_>>();
        Self {
            num: q.iter().zip(y).map(|(q, y)| q * (y / e_max)).collect(),
            offset: q_sqr.clone(),
            slope: vec![1.0; e.len()],
            scale: q_sqr,
        }
    }

    fn denominators(&self, t: f64) -> impl Iterator<Item = f64> + '_ {
        self.offset.iter().zip(&self.slope).map(move |(b, c)| b + c * t)
    }

    #[must_use]
    pub fn eval(&self, t: f64) -> f64 {
        self.num
            .iter()
            .zip(self.denominators(t))
            .map(|(a, d)| {
                // 0 / 0 only if a coordinate underflowed
                let ratio = if d > 0.0 { a / d } else { 0.0 };
                ratio * ratio
            })
            .sum::<f64>()
            - 1.0
    }

    /// Closest point on the surface associated with `t`
    #[must_use]
    pub fn closest_point(&self, y: &[f64], t: f64) -> Vec<f64> {
        y.iter()
            .zip(&self.scale)
            .zip(self.denominators(t))
            .map(|((y, k), d)| if d > 0.0 { k * y / d } else { 0.0 })
            .collect()
    }

    /// Upper bound for the root if the point is outside
    fn outer_bound(&self) -> f64 {
        length_robust(&self.num)
    }
}

/// Compute the closest point to `y` on the hyperellipsoid with radii `e`, for
/// `e` sorted in non-increasing order and `y > 0` componentwise
#[allow(clippy::float_cmp)]
#[must_use]
pub fn bisect(e: &[f64], y: &[f64], max_iter: usize) -> BisectionSolution {
    let m = e.len();
    debug_assert!(m > 0);
    debug_assert_eq!(y.len(), m);
    debug_assert!(e.windows(2).all(|w| w[0] >= w[1]));
    debug_assert!(y.iter().all(|&y| y > 0.0));

    let z = y.iter().zip(e).map(|(y, e)| y / e).collect::<Vec<_>>();
    let sum_z_sqr = z.iter().map(|z| z * z).sum::<f64>();

    if sum_z_sqr == 1.0 {
        return BisectionSolution {
            x: y.to_vec(),
            distance: 0.0,
            root: None,
            iterations: 0,
            termination: None,
        };
    }

    let (g, mut tmin, mut tmax) = if sum_z_sqr < 1.0 {
        (SecularFunction::inside(e, &z), z[m - 1], 1.0)
    } else {
        let g = SecularFunction::outside(e, y);
        let tmax = g.outer_bound();
        (g, 0.0, tmax)
    };

    let mut t = tmin;
    let mut iterations = 0;
    let mut termination = Termination::IterationCap;
    while iterations < max_iter {
        t = 0.5 * (tmin + tmax);
        iterations += 1;
        if t == tmin || t == tmax {
            termination = Termination::BoundsCollapsed;
            break;
        }

        let val = g.eval(t);
        if val > 0.0 {
            tmin = t;
        } else if val < 0.0 {
            tmax = t;
        } else if val == 0.0 {
            termination = Termination::ExactRoot;
            break;
        } else {
            termination = Termination::NonFinite;
            break;
        }
    }
    match termination {
        Termination::IterationCap => warn!(
            "Bisection stopped after {iterations} iterations, |tmax - tmin| = {:.2e}",
            tmax - tmin
        ),
        Termination::NonFinite => warn!("Bisection stopped on G({t:.6e}) = NaN"),
        Termination::BoundsCollapsed | Termination::ExactRoot => {}
    }

    let x = g.closest_point(y, t);
    let diff = x.iter().zip(y).map(|(x, y)| x - y).collect::<Vec<_>>();

    BisectionSolution {
        distance: length_robust(&diff),
        x,
        root: Some(t),
        iterations,
        termination: Some(termination),
    }
}

#[cfg(test)]
mod tests {
    use super::{bisect, max_bisections, SecularFunction, MAX_BISECTIONS_F32, MAX_BISECTIONS_F64};
    use crate::{assert_delta, stats::Termination};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn surface(x: &[f64], e: &[f64]) -> f64 {
        x.iter().zip(e).map(|(x, e)| (x / e) * (x / e)).sum::<f64>() - 1.0
    }

    #[test]
    fn test_max_bisections() {
        assert_eq!(MAX_BISECTIONS_F64, 1076);
        assert_eq!(max_bisections(52, -1021), 1076);
        assert_eq!(MAX_BISECTIONS_F32, 151);
    }

    #[test]
    fn test_on_surface() {
        let sol = bisect(&[2.0], &[2.0], MAX_BISECTIONS_F64);
        assert_eq!(sol.iterations, 0);
        assert!(sol.root.is_none());
        assert!(sol.termination.is_none());
        assert!(sol.distance.abs() < f64::MIN_POSITIVE);
        assert_delta!(sol.x[0], 2.0, 1e-15);
    }

    #[test]
    fn test_1d() {
        // outside
        let sol = bisect(&[3.0], &[4.0], MAX_BISECTIONS_F64);
        assert!(matches!(
            sol.termination,
            Some(Termination::BoundsCollapsed | Termination::ExactRoot)
        ));
        assert_delta!(sol.root.unwrap(), 1.0 / 3.0, 1e-12);
        assert_delta!(sol.x[0], 3.0, 1e-12);
        assert_delta!(sol.distance, 1.0, 1e-12);

        // inside
        let sol = bisect(&[3.0], &[1.0], MAX_BISECTIONS_F64);
        assert_delta!(sol.root.unwrap(), 1.0 / 3.0, 1e-12);
        assert_delta!(sol.x[0], 3.0, 1e-12);
        assert_delta!(sol.distance, 2.0, 1e-12);
    }

    #[test]
    fn test_2d() {
        // on the bisector of a circle of radius 1
        let y = 2.0 / f64::sqrt(2.0);
        let sol = bisect(&[1.0, 1.0], &[y, y], MAX_BISECTIONS_F64);
        let x = 1.0 / f64::sqrt(2.0);
        assert_delta!(sol.x[0], x, 1e-12);
        assert_delta!(sol.x[1], x, 1e-12);
        assert_delta!(sol.distance, 1.0, 1e-12);
    }

    #[test]
    fn test_cap() {
        let sol = bisect(&[5.0, 3.0, 1.0], &[10.0, 10.0, 10.0], 4);
        assert_eq!(sol.iterations, 4);
        assert_eq!(sol.termination, Some(Termination::IterationCap));
    }

    #[test]
    fn test_bracket() {
        // inside, the smallest axis is the only one that matters near t = z_{m-1}
        let e = [1e200, 1.0];
        let z = [0.1, 0.5];
        let g = SecularFunction::inside(&e, &z);
        assert!(g.eval(0.5) >= 0.0);
        assert!(g.eval(1.0) < 0.0);
        assert_delta!(g.eval(0.5 / 0.99_f64.sqrt()), 0.0, 1e-12);

        // outside, the squared ratio of the radii would overflow
        let e = [1e160, 1.0];
        let y = [2e160, 1.0];
        let g = SecularFunction::outside(&e, &y);
        let tmax = g.outer_bound();
        assert!(tmax.is_finite());
        assert!(g.eval(0.0) > 0.0);
        assert!(g.eval(tmax) <= 0.0);

        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let t = tmax * f64::from(i) / 100.0;
            let val = g.eval(t);
            assert!(val.is_finite());
            assert!(val < prev);
            prev = val;
        }
    }

    #[test]
    fn test_small_last_coordinate() {
        // y / e is below the machine precision along the smallest axis
        for y in [1e-15, 1e-17, 1e-300] {
            let sol = bisect(&[1.0], &[y], MAX_BISECTIONS_F64);
            assert!(matches!(
                sol.termination,
                Some(Termination::BoundsCollapsed | Termination::ExactRoot)
            ));
            assert_delta!(sol.x[0], 1.0, 1e-12);
            assert_delta!(sol.distance, 1.0, 1e-12);
        }

        let sol = bisect(&[1e10], &[1e-7], MAX_BISECTIONS_F64);
        assert_delta!(sol.x[0] / 1e10, 1.0, 1e-12);

        let e = [5.0, 3.0, 1.0];
        let sol = bisect(&e, &[1e-3, 1e-3, 1e-17], MAX_BISECTIONS_F64);
        assert!(sol.x.iter().all(|x| x.is_finite()));
        assert_delta!(surface(&sol.x, &e), 0.0, 1e-12);
        assert!(sol.distance < 1.0);
        assert!(sol.distance > 0.99);
    }

    #[test]
    fn test_large_ratio() {
        let e = [1e160, 1.0];
        let sol = bisect(&e, &[2e160, 1.0], MAX_BISECTIONS_F64);
        assert!(matches!(
            sol.termination,
            Some(Termination::BoundsCollapsed | Termination::ExactRoot)
        ));
        assert_delta!(sol.x[0] / 1e160, 1.0, 1e-12);
        assert!(sol.x[1] >= 0.0 && sol.x[1] < 1e-300);
        assert_delta!(sol.distance / 1e160, 1.0, 1e-12);
        assert_delta!(surface(&sol.x, &e), 0.0, 1e-12);

        // inside, the largest axis is left unchanged
        let e = [1e200, 1.0];
        let sol = bisect(&e, &[1e199, 0.5], MAX_BISECTIONS_F64);
        assert!(sol.x[0].to_bits() == 1e199_f64.to_bits());
        assert_delta!(sol.x[1], 0.99_f64.sqrt(), 1e-12);
        assert_delta!(sol.distance, 0.99_f64.sqrt() - 0.5, 1e-12);
    }

    #[test]
    fn test_convergence() {
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..1000 {
            let m = rng.random_range(1..=4);
            let mut e = (0..m)
                .map(|_| rng.random_range(0.1..10.0))
                .collect::<Vec<f64>>();
            e.sort_by(|a, b| b.total_cmp(a));
            let y = (0..m)
                .map(|_| rng.random_range(0.01..20.0))
                .collect::<Vec<f64>>();

            let sol = bisect(&e, &y, MAX_BISECTIONS_F64);
            assert!(sol.iterations <= MAX_BISECTIONS_F64);
            assert!(matches!(
                sol.termination,
                Some(Termination::BoundsCollapsed | Termination::ExactRoot)
            ));

            // G(t) is the distance of the solution to the surface
            let f = surface(&sol.x, &e);
            assert!(f.abs() < 1e-10, "G({:?}) = {f:.3e}", sol.root);

            let d = sol
                .x
                .iter()
                .zip(&y)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt();
            assert_delta!(sol.distance, d, 1e-12);
        }
    }
}
