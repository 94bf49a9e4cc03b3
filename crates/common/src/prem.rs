use crate::consts::EARTH_RADIUS_KM;
use crate::macros::horner;
use crate::types::Real;

/// Isotropic elastic properties of one model sample: velocities in km/s,
/// density in g/cm^3.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ElasticSample
{
    pub vp: Real,
    pub vs: Real,
    pub rho: Real,
}

impl ElasticSample
{
    #[must_use]
    pub const fn new(vp: Real, vs: Real, rho: Real) -> Self
    {
        Self { vp, vs, rho }
    }
}

/// The PREM reference model [Dziewonski & Anderson 1981], isotropic branch,
/// evaluated at a depth in km.
///
/// The 3 km ocean is replaced by upper-crust material so the free surface is
/// solid. A radius lying exactly on a shell boundary evaluates to the shell
/// above it, which is what makes the interface classification in the
/// propagator see mantle properties at the CMB radius and outer-core
/// properties at the ICB radius.
#[must_use]
pub fn prem(depth: Real) -> ElasticSample
{
    let r = (EARTH_RADIUS_KM - depth).clamp(0.0, EARTH_RADIUS_KM);
    let x: Real = r / EARTH_RADIUS_KM;

    if r >= 6356.0 {
        ElasticSample::new(5.8, 3.2, 2.6)
    } else if r >= 6346.6 {
        ElasticSample::new(6.8, 3.9, 2.9)
    } else if r >= 6151.0 {
        ElasticSample::new(
            horner!(x, 4.1875, 3.9382),
            horner!(x, 2.1519, 2.3481),
            horner!(x, 2.6910, 0.6924),
        )
    } else if r >= 5971.0 {
        ElasticSample::new(
            horner!(x, 20.3926, -12.2569),
            horner!(x, 8.9496, -4.4597),
            horner!(x, 7.1089, -3.8045),
        )
    } else if r >= 5771.0 {
        ElasticSample::new(
            horner!(x, 39.7027, -32.6166),
            horner!(x, 22.3512, -18.5856),
            horner!(x, 11.2494, -8.0298),
        )
    } else if r >= 5701.0 {
        ElasticSample::new(
            horner!(x, 19.0957, -9.8672),
            horner!(x, 9.9839, -4.9324),
            horner!(x, 5.3197, -1.4836),
        )
    } else if r >= 5600.0 {
        ElasticSample::new(
            horner!(x, 29.2766, -23.6027, 5.5242, -2.5514),
            horner!(x, 22.3459, -17.2473, -2.0834, 0.9783),
            horner!(x, 7.9565, -6.4761, 5.5283, -3.0807),
        )
    } else if r >= 3630.0 {
        ElasticSample::new(
            horner!(x, 24.9520, -40.4673, 51.4832, -26.6419),
            horner!(x, 11.1671, -13.7818, 17.4575, -9.2777),
            horner!(x, 7.9565, -6.4761, 5.5283, -3.0807),
        )
    } else if r >= 3480.0 {
        ElasticSample::new(
            horner!(x, 15.3891, -5.3181, 5.5242, -2.5514),
            horner!(x, 6.9254, 1.4672, -2.0834, 0.9783),
            horner!(x, 7.9565, -6.4761, 5.5283, -3.0807),
        )
    } else if r >= 1221.5 {
        ElasticSample::new(
            horner!(x, 11.0487, -4.0362, 4.8023, -13.5732),
            0.0,
            horner!(x, 12.5815, -1.2638, -3.6426, -5.5281),
        )
    } else {
        ElasticSample::new(
            horner!(x, 11.2622, 0.0, -6.3640),
            horner!(x, 3.6678, 0.0, -4.4475),
            horner!(x, 13.0885, 0.0, -8.8381),
        )
    }
}
