use super::bisection::bisect;
use crate::{
    linalg::length_robust,
    stats::{SolveBranch, SolveStats},
};

/// Indices of the axes of a canonical problem whose coordinate is > 0
///
/// The closest point has a zero coordinate along all the other axes, so the
/// problem is solved on the sub-space spanned by these axes only. The `k`-th
/// axis of the sub-problem is axis `positive[k]` of the full problem; the
/// order (hence the non-increasing radii) is preserved.
#[derive(Debug)]
pub struct AxisPartition {
    positive: Vec<usize>,
    n: usize,
}

impl AxisPartition {
    #[must_use]
    pub fn new(y: &[f64]) -> Self {
        let positive = y
            .iter()
            .enumerate()
            .filter(|(_, y)| **y > 0.0)
            .map(|(i, _)| i)
            .collect();
        Self {
            positive,
            n: y.len(),
        }
    }

    /// The # of axes with a positive coordinate
    #[must_use]
    pub fn n_positive(&self) -> usize {
        self.positive.len()
    }

    /// Extract the values along the positive axes
    #[must_use]
    pub fn gather(&self, v: &[f64]) -> Vec<f64> {
        self.positive.iter().map(|&i| v[i]).collect()
    }

    /// Build a full length vector from the values along the positive axes, the
    /// other values being 0
    #[must_use]
    pub fn scatter(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.n_positive());
        let mut res = vec![0.0; self.n];
        for (&i, &x) in self.positive.iter().zip(v) {
            res[i] = x;
        }
        res
    }
}

/// Positive axes of a canonical problem, to be solved by bisection
#[derive(Debug)]
pub struct SubProblem {
    pub e: Vec<f64>,
    pub y: Vec<f64>,
}

/// Outcome of the analysis of the zero coordinates
#[derive(Debug)]
pub enum Reduction {
    /// The query lies in the hyperplane of the smallest axis and projects inside
    /// the sub-hyperellipsoid: the closest point is known
    ClosedForm {
        /// Closest point along the positive axes
        x: Vec<f64>,
        /// Closest point along the smallest axis (> 0)
        x_last: f64,
        distance: f64,
    },
    /// The closest point along the smallest axis is 0 if it was 0 for the query,
    /// the remaining axes are solved by bisection
    Bisection(SubProblem),
}

/// Closest point and distance for a canonical problem
#[derive(Debug)]
pub struct CanonicalSolution {
    pub x: Vec<f64>,
    pub distance: f64,
    pub stats: SolveStats,
}

/// Analyse a canonical problem (radii `e` non-increasing, `y >= 0`)
///
/// If $`y_{n-1} = 0`$, the point is inside the sub-hyperellipsoid if
/// ```math
/// \sum_i \left(\frac{y_i}{h_i}\right)^2 < 1, \quad h_i = \frac{e_i^2 - e_{n-1}^2}{e_i} = (e_i - e_{n-1}) \frac{e_i + e_{n-1}}{e_i}
/// ```
/// This is only evaluated if $`y_i < h_i`$ for all positive axes to avoid a
/// division by zero when $`e_i = e_{n-1}`$. $`h_i`$ is computed without squaring
/// the radii.
#[must_use]
pub fn reduce(e: &[f64], y: &[f64], partition: &AxisPartition) -> Reduction {
    let n = e.len();
    let e_pos = partition.gather(e);
    let y_pos = partition.gather(y);

    if y[n - 1] > 0.0 {
        return Reduction::Bisection(SubProblem { e: e_pos, y: y_pos });
    }

    let e_last = e[n - 1];
    let h = e_pos
        .iter()
        .map(|e| (e - e_last) * ((e + e_last) / e))
        .collect::<Vec<_>>();
    let in_sub_box = y_pos.iter().zip(&h).all(|(y, h)| y < h);

    if in_sub_box {
        let xde = y_pos.iter().zip(&h).map(|(y, h)| y / h).collect::<Vec<_>>();
        let discr = 1.0 - xde.iter().map(|v| v * v).sum::<f64>();
        if discr > 0.0 {
            let x = e_pos
                .iter()
                .zip(&xde)
                .map(|(e, v)| e * v)
                .collect::<Vec<_>>();
            let x_last = e_last * discr.sqrt();
            let mut diff = x.iter().zip(&y_pos).map(|(x, y)| x - y).collect::<Vec<_>>();
            diff.push(x_last);
            return Reduction::ClosedForm {
                x,
                x_last,
                distance: length_robust(&diff),
            };
        }
    }

    Reduction::Bisection(SubProblem { e: e_pos, y: y_pos })
}

/// Compute the closest point and the distance for a canonical problem
/// (radii `e` non-increasing, `y >= 0`)
#[must_use]
pub fn solve(e: &[f64], y: &[f64], max_bisections: usize) -> CanonicalSolution {
    let n = e.len();
    debug_assert!(n > 0);
    debug_assert_eq!(y.len(), n);

    let partition = AxisPartition::new(y);
    let n_positive = partition.n_positive();

    match reduce(e, y, &partition) {
        Reduction::ClosedForm {
            x,
            x_last,
            distance,
        } => {
            let mut x = partition.scatter(&x);
            x[n - 1] = x_last;
            CanonicalSolution {
                x,
                distance,
                stats: SolveStats::closed_form(n_positive),
            }
        }
        Reduction::Bisection(sub) => {
            let sol = bisect(&sub.e, &sub.y, max_bisections);
            let branch = if sol.root.is_some() {
                SolveBranch::Bisection
            } else {
                SolveBranch::OnSurface
            };
            CanonicalSolution {
                x: partition.scatter(&sol.x),
                distance: sol.distance,
                stats: SolveStats {
                    branch,
                    n_positive,
                    iterations: sol.iterations,
                    termination: sol.termination,
                    root: sol.root,
                },
            }
        }
    }
}
