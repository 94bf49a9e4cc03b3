use crate::consts::EARTH_RADIUS_KM;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type Real = f64;
pub type Cplx = num_complex::Complex64;

/// A point of the annular (θ, r) plane: angular position in degrees,
/// radius in km.
#[derive(Clone, Copy, Debug, PartialEq, Default, derive_more::Display)]
#[display("({theta} deg, {radius} km)")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint
{
    pub theta: Real,
    pub radius: Real,
}

impl GeoPoint
{
    #[must_use]
    pub const fn new(theta: Real, radius: Real) -> Self
    {
        Self { theta, radius }
    }

    /// Construct from an angular position and a depth below the surface.
    #[must_use]
    pub fn from_depth(theta: Real, depth: Real) -> Self
    {
        Self {
            theta,
            radius: EARTH_RADIUS_KM - depth,
        }
    }

    #[must_use]
    pub fn depth(&self) -> Real
    {
        EARTH_RADIUS_KM - self.radius
    }
}

/// Axis-aligned bounds of a polygonal region in the (θ, r) plane.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds
{
    pub theta_min: Real,
    pub theta_max: Real,
    pub radius_min: Real,
    pub radius_max: Real,
}

impl Bounds
{
    /// Bounds that contain every point; used for the unbounded 1D reference
    /// region.
    #[must_use]
    pub const fn unbounded() -> Self
    {
        Self {
            theta_min: Real::MIN,
            theta_max: Real::MAX,
            radius_min: Real::MIN,
            radius_max: Real::MAX,
        }
    }

    /// Smallest bounds containing every vertex of `points`.
    #[must_use]
    pub fn covering(points: impl IntoIterator<Item = GeoPoint>) -> Self
    {
        let mut bounds = Self {
            theta_min: Real::MAX,
            theta_max: Real::MIN,
            radius_min: Real::MAX,
            radius_max: Real::MIN,
        };
        for p in points {
            bounds.theta_min = bounds.theta_min.min(p.theta);
            bounds.theta_max = bounds.theta_max.max(p.theta);
            bounds.radius_min = bounds.radius_min.min(p.radius);
            bounds.radius_max = bounds.radius_max.max(p.radius);
        }
        bounds
    }

    #[must_use]
    pub fn contains(&self, p: GeoPoint) -> bool
    {
        self.theta_min <= p.theta
            && p.theta <= self.theta_max
            && self.radius_min <= p.radius
            && p.radius <= self.radius_max
    }
}
