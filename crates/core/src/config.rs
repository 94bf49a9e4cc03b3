use seistrace_common::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wave component of a seeded or propagating ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WaveComp
{
    #[default]
    #[display("P")]
    P,
    #[display("SV")]
    Sv,
    #[display("SH")]
    Sh,
}

impl WaveComp
{
    #[must_use]
    pub const fn is_p(&self) -> bool
    {
        matches!(self, Self::P)
    }
}

/// One initial ray.
///
/// `takeoff` is in degrees in (-180, 180]: magnitude below 90 shoots downward,
/// 90 or above shoots upward, and a negative sign sends the ray toward
/// decreasing θ.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeedRay
{
    pub comp: WaveComp,
    pub steps: u32,
    pub color: i32,
    pub theta: Real,
    pub depth: Real,
    pub takeoff: Real,
}

/// One radial grid section: layers every `increment` km between the two
/// depths.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSpec
{
    pub depth_from: Real,
    pub depth_to: Real,
    pub increment: Real,
}

/// A depth band whose 1D reference properties are scaled by the given
/// percentages. The first band containing a depth wins.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationBand
{
    pub top: Real,
    pub bot: Real,
    pub dvp: Real,
    pub dvs: Real,
    pub drho: Real,
}

/// A polygonal perturbation patch: vertices in the (θ, r) plane (closed,
/// first vertex not repeated) and percentage perturbations applied on top of
/// the 1D reference.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionSpec
{
    pub vertices: Vec<GeoPoint>,
    pub dvp: Real,
    pub dvs: Real,
    pub drho: Real,
}

impl RegionSpec
{
    /// Build a patch from parallel (θ, depth) vertex lists.
    #[must_use]
    pub fn from_depths(theta: &[Real], depth: &[Real], dvp: Real, dvs: Real, drho: Real) -> Self
    {
        let vertices = theta
            .iter()
            .zip(depth.iter())
            .map(|(&t, &d)| GeoPoint::from_depth(t, d))
            .collect();
        Self { vertices, dvp, dvs, drho }
    }
}

/// Everything the model builder needs.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelSpec
{
    pub grid: Vec<GridSpec>,
    pub special_depths: Vec<Real>,
    pub deviations: Vec<DeviationBand>,
    pub regions: Vec<RegionSpec>,
}

/// Which scattering channels an interface interaction may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScatterFlags
{
    /// Transmission, same wave type.
    pub ts: bool,
    /// Transmission, converted wave type.
    pub td: bool,
    /// Reflection, same wave type.
    pub rs: bool,
    /// Reflection, converted wave type.
    pub rd: bool,
}

impl Default for ScatterFlags
{
    fn default() -> Self
    {
        Self {
            ts: true,
            td: true,
            rs: true,
            rd: true,
        }
    }
}

/// Runtime knobs for the scheduler and the rectifier.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceSettings
{
    pub n_thread: usize,
    /// Maximum number of children one leg may spawn; drives the
    /// remaining-work estimation.
    pub branches: usize,
    /// Capacity of the ray arena.
    pub potential_size: usize,
    /// Stop expanding a ray once it has reached the free surface.
    pub stop_at_surface: bool,
    /// Maximum chord length of a rectified polygon edge, km.
    pub rectify_limit: Real,
    pub scatter: ScatterFlags,
}

impl Default for TraceSettings
{
    fn default() -> Self
    {
        Self {
            n_thread: num_cpus::get(),
            branches: 4,
            potential_size: 65536,
            stop_at_surface: false,
            rectify_limit: 1.0,
            scatter: ScatterFlags::default(),
        }
    }
}

impl TraceSettings
{
    #[must_use]
    pub const fn with_threads(mut self, n_thread: usize) -> Self
    {
        self.n_thread = n_thread;
        self
    }

    #[must_use]
    pub const fn with_capacity(mut self, potential_size: usize) -> Self
    {
        self.potential_size = potential_size;
        self
    }

    #[must_use]
    pub const fn with_scatter(mut self, scatter: ScatterFlags) -> Self
    {
        self.scatter = scatter;
        self
    }

    #[must_use]
    pub const fn stopping_at_surface(mut self) -> Self
    {
        self.stop_at_surface = true;
        self
    }
}
