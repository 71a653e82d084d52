use crate::{Error, Frame, Result, Vertex};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// Hyperellipsoid in D dimensions
///
/// In the local frame $`y = A (p - c)`$ the surface is
/// ```math
/// \sum_i \left(\frac{y_i}{e_i}\right)^2 = 1
/// ```
/// where the rows of $`A`$ are the (orthonormal) axis directions and the $`e_i > 0`$
/// are the radii. No ordering of the radii is assumed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "HyperEllipsoidDesc",
    into = "HyperEllipsoidDesc",
    bound = ""
)]
pub struct HyperEllipsoid<const D: usize> {
    center: Vertex<D>,
    axes: Frame<D>,
    radii: Vertex<D>,
}

impl<const D: usize> HyperEllipsoid<D> {
    /// Create a hyperellipsoid
    ///
    /// The rows of `axes` must be orthonormal; this is not checked (see
    /// `axes_are_orthonormal`). The radii must be strictly positive and finite.
    pub fn new(center: Vertex<D>, axes: Frame<D>, radii: Vertex<D>) -> Result<Self> {
        let res = Self {
            center,
            axes,
            radii,
        };
        res.check()?;
        debug!("Create a {D}d hyperellipsoid with radii {:?}", radii.as_slice());
        Ok(res)
    }

    /// Create a hyperellipsoid whose axes are aligned with the coordinate axes
    pub fn axis_aligned(center: Vertex<D>, radii: Vertex<D>) -> Result<Self> {
        Self::new(center, Frame::<D>::identity(), radii)
    }

    /// Create a hyperellipsoid from slices, the axes being stored row by row
    pub fn from_slices(center: &[f64], axes: &[f64], radii: &[f64]) -> Result<Self> {
        if center.len() != D || radii.len() != D || axes.len() != D * D {
            return Err(Error::from(&format!(
                "Invalid sizes for a {D}d hyperellipsoid: center {}, axes {}, radii {}",
                center.len(),
                axes.len(),
                radii.len()
            )));
        }
        Self::new(
            Vertex::<D>::from_column_slice(center),
            Frame::<D>::from_row_slice(axes),
            Vertex::<D>::from_column_slice(radii),
        )
    }

    /// Read a hyperellipsoid from its json description
    pub fn from_json(s: &str) -> Result<Self> {
        let res: Self = serde_json::from_str(s)?;
        Ok(res)
    }

    /// Json description of the hyperellipsoid
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the hyperellipsoid is valid, i.e. that D > 0, that the radii are > 0
    /// and that all the values are finite
    pub fn check(&self) -> Result<()> {
        if D == 0 {
            return Err(Error::from("Hyperellipsoids need at least one dimension"));
        }
        if let Some(r) = self.radii.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(Error::from(&format!("Invalid radius {r}")));
        }
        if !self.center.iter().all(|x| x.is_finite()) {
            return Err(Error::from("Non finite center"));
        }
        if !self.axes.iter().all(|x| x.is_finite()) {
            return Err(Error::from("Non finite axes"));
        }
        Ok(())
    }

    /// Check if the axes are orthonormal with a given tolerance
    #[must_use]
    pub fn axes_are_orthonormal(&self, tol: f64) -> bool {
        let err = self.axes * self.axes.transpose() - Frame::<D>::identity();
        err.iter().all(|x| x.abs() < tol)
    }

    #[must_use]
    pub const fn center(&self) -> &Vertex<D> {
        &self.center
    }

    /// Axes directions, one per row
    #[must_use]
    pub const fn axes(&self) -> &Frame<D> {
        &self.axes
    }

    #[must_use]
    pub const fn radii(&self) -> &Vertex<D> {
        &self.radii
    }

    /// Coordinates of `p` in the local frame, $`y = A (p - c)`$
    #[must_use]
    pub fn to_local(&self, p: &Vertex<D>) -> Vertex<D> {
        self.axes * (p - self.center)
    }

    /// Coordinates of a local point in the world frame, $`p = A^T y + c`$
    #[must_use]
    pub fn to_world(&self, y: &Vertex<D>) -> Vertex<D> {
        self.axes.tr_mul(y) + self.center
    }

    /// Value of the implicit function
    /// ```math
    /// f(p) = \sum_i \left(\frac{y_i}{e_i}\right)^2 - 1
    /// ```
    /// negative inside, zero on the surface and positive outside
    #[must_use]
    pub fn implicit(&self, p: &Vertex<D>) -> f64 {
        let y = self.to_local(p);
        y.component_div(&self.radii).norm_squared() - 1.0
    }

    /// Gradient of the implicit function in the world frame, normal to the surface
    #[must_use]
    pub fn gradient(&self, p: &Vertex<D>) -> Vertex<D> {
        let y = self.to_local(p);
        let g = y.zip_map(&self.radii, |y, e| 2.0 * y / (e * e));
        self.axes.tr_mul(&g)
    }

    /// Check if `p` is inside the hyperellipsoid (or on its surface)
    #[must_use]
    pub fn contains(&self, p: &Vertex<D>) -> bool {
        self.implicit(p) <= 0.0
    }
}

impl<const D: usize> Display for HyperEllipsoid<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "center = {:?}", self.center.as_slice())?;
        for i in 0..D {
            writeln!(
                f,
                "--> e = {}, {:?}",
                self.radii[i],
                self.axes.row(i).iter().copied().collect::<Vec<_>>()
            )?;
        }
        Ok(())
    }
}

/// Plain description of a hyperellipsoid used for serialization, the axes being
/// stored as a list of rows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HyperEllipsoidDesc {
    pub center: Vec<f64>,
    pub axes: Vec<Vec<f64>>,
    pub radii: Vec<f64>,
}

impl<const D: usize> TryFrom<HyperEllipsoidDesc> for HyperEllipsoid<D> {
    type Error = Box<dyn std::error::Error>;

    fn try_from(desc: HyperEllipsoidDesc) -> Result<Self> {
        if desc.axes.iter().any(|row| row.len() != D) {
            return Err(Error::from(&format!(
                "Invalid axes for a {D}d hyperellipsoid"
            )));
        }
        let axes = desc.axes.concat();
        Self::from_slices(&desc.center, &axes, &desc.radii)
    }
}

impl<const D: usize> From<HyperEllipsoid<D>> for HyperEllipsoidDesc {
    fn from(e: HyperEllipsoid<D>) -> Self {
        Self {
            center: e.center.iter().copied().collect(),
            axes: e
                .axes
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            radii: e.radii.iter().copied().collect(),
        }
    }
}
