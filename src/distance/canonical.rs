use crate::linalg::{invert_permutation, sort_descending_with_permutation};

/// Reduction of a query in the local frame of a hyperellipsoid to the first octant,
/// with the axes sorted by decreasing radius
#[derive(Debug)]
pub struct Canonical {
    negate: Vec<bool>,
    perm: Vec<usize>,
    inv_perm: Vec<usize>,
    /// Radii, non-increasing
    pub e: Vec<f64>,
    /// Query point, non-negative
    pub y: Vec<f64>,
}

impl Canonical {
    /// Reflect and permute the local coordinates `y` for radii `e`. Axes with equal
    /// radii keep their relative order.
    #[must_use]
    pub fn new(e: &[f64], y: &[f64]) -> Self {
        debug_assert_eq!(e.len(), y.len());

        let negate = y.iter().map(|&y| y < 0.0).collect();
        let perm = sort_descending_with_permutation(e);
        let inv_perm = invert_permutation(&perm);

        let (e, y) = perm.iter().map(|&j| (e[j], y[j].abs())).unzip();

        Self {
            negate,
            perm,
            inv_perm,
            e,
            y,
        }
    }

    /// Dimension
    #[must_use]
    pub fn dim(&self) -> usize {
        self.perm.len()
    }

    /// Map a point of the canonical problem back to the local frame (undo the
    /// permutation and the reflections)
    #[must_use]
    pub fn restore(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.dim());
        self.inv_perm
            .iter()
            .zip(&self.negate)
            .map(|(&j, &neg)| if neg { -x[j] } else { x[j] })
            .collect()
    }
}
