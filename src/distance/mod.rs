//! Distance from a point to a hyperellipsoid
//!
//! The query is processed in four stages:
//!  - transform to the local frame of the hyperellipsoid,
//!  - reflect to the first octant and sort the axes by decreasing radius (`canonical`),
//!  - handle the zero coordinates, in closed form if possible (`reduced`),
//!  - solve the general case by bisection (`bisection`).
pub mod bisection;
pub mod canonical;
pub mod reduced;

use crate::{stats::SolveStats, Error, HyperEllipsoid, Result, Vertex};
use bisection::MAX_BISECTIONS_F64;
use canonical::Canonical;
use log::{log_enabled, trace, Level};

/// Parameters of the distance computation
#[derive(Clone, Copy, Debug)]
pub struct DistanceParams {
    /// Max. number of bisections
    pub max_bisections: usize,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            max_bisections: MAX_BISECTIONS_F64,
        }
    }
}

/// Distance from a point to a hyperellipsoid and closest point on its surface
#[derive(Clone, Copy, Debug)]
pub struct DistanceResult<const D: usize> {
    /// Euclidean distance (not squared)
    pub distance: f64,
    closest_point: Vertex<D>,
    stats: SolveStats,
}

impl<const D: usize> DistanceResult<D> {
    /// Closest point on the surface, in the world frame
    #[must_use]
    pub const fn closest_point(&self) -> &Vertex<D> {
        &self.closest_point
    }

    /// Coordinates of the closest point
    #[must_use]
    pub fn closest_point_coords(&self) -> &[f64] {
        self.closest_point.as_slice()
    }

    #[must_use]
    pub const fn stats(&self) -> &SolveStats {
        &self.stats
    }
}

/// Compute the distance from `point` to the surface of `ellipsoid` and the closest
/// point on the surface
///
/// The length of `point` must be D and its coordinates finite. The axes of the
/// ellipsoid are assumed to be orthonormal.
pub fn distance_and_closest_point<const D: usize>(
    point: &[f64],
    ellipsoid: &HyperEllipsoid<D>,
) -> Result<DistanceResult<D>> {
    distance_and_closest_point_with_params(point, ellipsoid, &DistanceParams::default())
}

/// Same as `distance_and_closest_point` for a `Vertex<D>`
pub fn distance_to_vertex<const D: usize>(
    point: &Vertex<D>,
    ellipsoid: &HyperEllipsoid<D>,
) -> Result<DistanceResult<D>> {
    distance_and_closest_point(point.as_slice(), ellipsoid)
}

/// Same as `distance_and_closest_point` with user defined parameters
pub fn distance_and_closest_point_with_params<const D: usize>(
    point: &[f64],
    ellipsoid: &HyperEllipsoid<D>,
    params: &DistanceParams,
) -> Result<DistanceResult<D>> {
    if D == 0 {
        return Err(Error::from("Hyperellipsoids need at least one dimension"));
    }
    if point.len() != D {
        return Err(Error::from(&format!(
            "Invalid point dimension: {} (expected {D})",
            point.len()
        )));
    }
    if !point.iter().all(|x| x.is_finite()) {
        return Err(Error::from(&format!("Non finite point {point:?}")));
    }

    let y = ellipsoid.to_local(&Vertex::<D>::from_column_slice(point));

    let canonical = Canonical::new(ellipsoid.radii().as_slice(), y.as_slice());
    let sol = reduced::solve(&canonical.e, &canonical.y, params.max_bisections);
    let x = canonical.restore(&sol.x);

    let closest_point = ellipsoid.to_world(&Vertex::<D>::from_column_slice(&x));

    if log_enabled!(Level::Trace) {
        if let Ok(s) = serde_json::to_string(&sol.stats) {
            trace!("Distance to a {D}d hyperellipsoid: {s}");
        }
    }

    Ok(DistanceResult {
        distance: sol.distance,
        closest_point,
        stats: sol.stats,
    })
}
