//! Distance from a point to a hyperellipsoid in D dimensions
//!
//! The closest point is computed with the robust algorithm described in
//! "Distance from a Point to an Ellipse, an Ellipsoid, or a Hyperellipsoid"
//! by David Eberly: the query is reduced to the first octant with sorted radii,
//! points lying in a coordinate hyperplane are handled in closed form when
//! possible and the general case is solved by bisection.
use core::fmt;
use nalgebra::{SMatrix, SVector};

pub mod distance;
pub mod ellipsoid;
pub mod linalg;
pub mod stats;

pub use distance::{
    distance_and_closest_point, distance_and_closest_point_with_params, distance_to_vertex,
    DistanceParams, DistanceResult,
};
pub use ellipsoid::HyperEllipsoid;

/// Result
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Error
#[derive(Debug)]
pub struct Error(String);
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "There is an error: {}", self.0)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Set the error message
    #[must_use]
    pub fn from(msg: &str) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Vertex in D dimensions
pub type Vertex<const D: usize> = SVector<f64, D>;
/// Vertex in 2D
pub type Vert2d = Vertex<2>;
/// Vertex in 3D
pub type Vert3d = Vertex<3>;
/// Orthonormal frame in D dimensions, one axis per row
pub type Frame<const D: usize> = SMatrix<f64, D, D>;

/// Assert that two floating point values are closer than a tolerance
#[macro_export]
macro_rules! assert_delta {
    ($x:expr, $y:expr, $d:expr) => {
        assert!(
            ($x - $y).abs() < $d,
            "({:.3e} - {:.3e}).abs() = {:.3e}",
            $x,
            $y,
            ($x - $y).abs()
        )
    };
}
