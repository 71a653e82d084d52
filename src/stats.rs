use core::fmt;
use serde::Serialize;

/// How the canonical problem was solved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolveBranch {
    /// The query point is on the surface
    OnSurface,
    /// The query point lies in the hyperplane of the smallest axis and projects
    /// inside the sub-hyperellipsoid
    ClosedForm,
    /// General case, solved by bisection
    Bisection,
}

/// Why the bisection stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The midpoint is equal to one of the bounds
    BoundsCollapsed,
    /// The function is exactly 0 at the midpoint
    ExactRoot,
    /// The maximum number of iterations has been reached
    IterationCap,
    /// The function is not a number at the midpoint
    NonFinite,
}

/// Statistics on the resolution of a distance query
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SolveStats {
    pub branch: SolveBranch,
    /// The # of axes with a positive canonical coordinate
    pub n_positive: usize,
    /// The # of bisection iterations
    pub iterations: usize,
    pub termination: Option<Termination>,
    /// Root of the secular function (rescaled Lagrange multiplier), if the
    /// bisection was run
    pub root: Option<f64>,
}

impl SolveStats {
    #[must_use]
    pub const fn closed_form(n_positive: usize) -> Self {
        Self {
            branch: SolveBranch::ClosedForm,
            n_positive,
            iterations: 0,
            termination: None,
            root: None,
        }
    }
}

impl fmt::Display for SolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}, {} positive axes", self.branch, self.n_positive)?;
        if let Some(t) = self.termination {
            write!(f, ", {} iterations ({t:?})", self.iterations)?;
        }
        if let Some(t) = self.root {
            write!(f, ", t = {t:.6e}")?;
        }
        Ok(())
    }
}
