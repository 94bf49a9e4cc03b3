use num_traits::{One, Zero};
use seistrace_common::prelude::*;

/// Acoustic character of the two sides of an interface, incident side first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum InterfaceKind
{
    #[display("SA")]
    SolidAir,
    #[display("SS")]
    SolidSolid,
    #[display("SL")]
    SolidLiquid,
    #[display("LS")]
    LiquidSolid,
    #[display("LL")]
    LiquidLiquid,
    #[display("LA")]
    LiquidAir,
}

impl InterfaceKind
{
    /// Classify an interface by the exact radius a leg ended on. The grid
    /// builder pins the discontinuity radii into every layer table, so the
    /// `==` comparisons here are exact.
    #[must_use]
    pub fn classify(radius: Real, go_up: bool) -> Self
    {
        if radius == EARTH_RADIUS_KM {
            Self::SolidAir
        } else if radius == CMB_RADIUS_KM {
            if go_up {
                Self::LiquidSolid
            } else {
                Self::SolidLiquid
            }
        } else if radius == ICB_RADIUS_KM {
            if go_up {
                Self::SolidLiquid
            } else {
                Self::LiquidSolid
            }
        } else if ICB_RADIUS_KM < radius && radius < CMB_RADIUS_KM {
            Self::LiquidLiquid
        } else {
            Self::SolidSolid
        }
    }

    /// Downgrade either side to liquid when its shear speed says so.
    #[must_use]
    pub fn refine(self, vs1: Real, vs2: Real) -> Self
    {
        let mut kind = self;
        if vs1 < LIQUID_VS_CUTOFF {
            kind = match kind {
                Self::SolidAir => Self::LiquidAir,
                Self::SolidSolid => Self::LiquidSolid,
                Self::SolidLiquid => Self::LiquidLiquid,
                other => other,
            };
        }
        if vs2 < LIQUID_VS_CUTOFF {
            kind = match kind {
                Self::SolidSolid => Self::SolidLiquid,
                Self::LiquidSolid => Self::LiquidLiquid,
                other => other,
            };
        }
        kind
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity
{
    Psv,
    Sh,
}

/// Plane-wave reflection/transmission coefficients of one interface, named
/// incident-type-first: `tps` scatters an incident P into a transmitted S.
/// Channels that do not exist for the interface stay zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Coefficients
{
    pub rpp: Cplx,
    pub rps: Cplx,
    pub rsp: Cplx,
    pub rss: Cplx,
    pub tpp: Cplx,
    pub tps: Cplx,
    pub tsp: Cplx,
    pub tss: Cplx,
}

/// Coefficients for a plane wave hitting the interface at `incidence`
/// degrees, displacement-amplitude convention throughout.
///
/// Solid-solid P-SV uses the Aki & Richards closed forms; the fluid-contact
/// systems are solved from the boundary conditions directly. All angle
/// functions are complex so post-critical incidence yields evanescent
/// (complex) coefficients instead of NaN.
#[must_use]
pub fn plane_wave_coefficients(
    side1: ElasticSample,
    side2: ElasticSample,
    incidence: Real,
    polarity: Polarity,
    kind: InterfaceKind,
) -> Coefficients
{
    let sin_inc = (incidence * DEG2RAD).sin();
    let mut c = Coefficients::default();

    match (polarity, kind) {
        (Polarity::Sh, InterfaceKind::SolidSolid) => {
            let p = sin_inc / side1.vs;
            (c.rss, c.tss) = sh_solid_solid(side1, side2, p);
        }
        (Polarity::Sh, InterfaceKind::SolidLiquid | InterfaceKind::SolidAir) => {
            c.rss = Cplx::one();
        }
        (Polarity::Sh, _) => {}

        (Polarity::Psv, InterfaceKind::SolidSolid) => {
            let pp = psv_solid_solid(side1, side2, sin_inc / side1.vp);
            (c.rpp, c.rps, c.tpp, c.tps) = (pp.0, pp.1, pp.4, pp.5);
            let ps = psv_solid_solid(side1, side2, sin_inc / side1.vs);
            (c.rsp, c.rss, c.tsp, c.tss) = (ps.2, ps.3, ps.6, ps.7);
        }
        (Polarity::Psv, InterfaceKind::SolidAir) => {
            let pp = free_surface(side1, sin_inc / side1.vp);
            (c.rpp, c.rps) = (pp.0, pp.1);
            let ps = free_surface(side1, sin_inc / side1.vs);
            (c.rsp, c.rss) = (ps.2, ps.3);
        }
        (Polarity::Psv, InterfaceKind::SolidLiquid) => {
            (c.rpp, c.rps, c.tpp) = solid_liquid_p(side1, side2, sin_inc / side1.vp);
            (c.rsp, c.rss, c.tsp) = solid_liquid_sv(side1, side2, sin_inc / side1.vs);
        }
        (Polarity::Psv, InterfaceKind::LiquidSolid) => {
            (c.rpp, c.tpp, c.tps) = liquid_solid_p(side1, side2, sin_inc / side1.vp);
        }
        (Polarity::Psv, InterfaceKind::LiquidLiquid) => {
            (c.rpp, c.tpp) = acoustic(side1, side2, sin_inc / side1.vp);
        }
        (Polarity::Psv, InterfaceKind::LiquidAir) => {
            c.rpp = -Cplx::one();
        }
    }
    c
}

/// cos of the propagation angle of a wave of speed `v` at horizontal
/// slowness `p`; purely imaginary past the critical slowness.
fn vertical_cos(v: Real, p: Real) -> Cplx
{
    Cplx::new(1.0 - (v * p) * (v * p), 0.0).sqrt()
}

/// Aki & Richards scattering coefficients for a welded solid-solid contact,
/// returned as (rpp, rps, rsp, rss, tpp, tps, tsp, tss). Only the rows
/// matching the slowness `p` (P incidence or SV incidence) are meaningful to
/// the caller.
#[allow(clippy::many_single_char_names)]
fn psv_solid_solid(
    s1: ElasticSample,
    s2: ElasticSample,
    p: Real,
) -> (Cplx, Cplx, Cplx, Cplx, Cplx, Cplx, Cplx, Cplx)
{
    let p2 = p * p;
    let (a1, b1, r1) = (s1.vp, s1.vs, s1.rho);
    let (a2, b2, r2) = (s2.vp, s2.vs, s2.rho);

    // cos(angle)/speed vertical slownesses.
    let ci1 = vertical_cos(a1, p) / a1;
    let cj1 = vertical_cos(b1, p) / b1;
    let ci2 = vertical_cos(a2, p) / a2;
    let cj2 = vertical_cos(b2, p) / b2;

    let a = r2 * (1.0 - 2.0 * b2 * b2 * p2) - r1 * (1.0 - 2.0 * b1 * b1 * p2);
    let b = r2 * (1.0 - 2.0 * b2 * b2 * p2) + 2.0 * r1 * b1 * b1 * p2;
    let c = r1 * (1.0 - 2.0 * b1 * b1 * p2) + 2.0 * r2 * b2 * b2 * p2;
    let d = 2.0 * (r2 * b2 * b2 - r1 * b1 * b1);

    let e = ci1 * b + ci2 * c;
    let f = cj1 * b + cj2 * c;
    let g = -ci1 * cj2 * d + a;
    let h = -ci2 * cj1 * d + a;
    let det = e * f + g * h * p2;

    let rpp = ((ci1 * b - ci2 * c) * f - (ci1 * cj2 * d + a) * h * p2) / det;
    let rps = ci1 * (ci2 * cj2 * c * d + a * b) * p * (a1 / b1) * -2.0 / det;
    let tpp = ci1 * f * (a1 / a2) * 2.0 * r1 / det;
    let tps = ci1 * h * p * (a1 / b2) * 2.0 * r1 / det;

    let rsp = cj1 * (ci2 * cj2 * c * d + a * b) * p * (b1 / a1) * -2.0 / det;
    let rss = -((cj1 * b - cj2 * c) * e - (ci2 * cj1 * d + a) * g * p2) / det;
    let tsp = cj1 * g * p * (b1 / a2) * -2.0 * r1 / det;
    let tss = cj1 * e * (b1 / b2) * 2.0 * r1 / det;

    (rpp, rps, rsp, rss, tpp, tps, tsp, tss)
}

fn sh_solid_solid(s1: ElasticSample, s2: ElasticSample, p: Real) -> (Cplx, Cplx)
{
    // mu cos(j)/beta = rho beta cos(j)
    let z1 = vertical_cos(s1.vs, p) * s1.rho * s1.vs;
    let z2 = vertical_cos(s2.vs, p) * s2.rho * s2.vs;
    ((z1 - z2) / (z1 + z2), z1 * 2.0 / (z1 + z2))
}

/// Free-surface coefficients (rpp, rps, rsp, rss) of a solid half-space.
fn free_surface(s1: ElasticSample, p: Real) -> (Cplx, Cplx, Cplx, Cplx)
{
    let p2 = p * p;
    let (a1, b1) = (s1.vp, s1.vs);
    let ci = vertical_cos(a1, p) / a1;
    let cj = vertical_cos(b1, p) / b1;

    let k = 1.0 / (b1 * b1) - 2.0 * p2;
    let denom = ci * cj * 4.0 * p2 + k * k;

    let rpp = (ci * cj * 4.0 * p2 - k * k) / denom;
    let rps = ci * 4.0 * (a1 / b1) * p * k / denom;
    let rsp = cj * 4.0 * (b1 / a1) * p * k / denom;
    let rss = -rpp;
    (rpp, rps, rsp, rss)
}

/// Acoustic contact: (rpp, tpp). Each impedance is weighted by the cosine on
/// the opposite side.
fn acoustic(s1: ElasticSample, s2: ElasticSample, p: Real) -> (Cplx, Cplx)
{
    let ci1 = vertical_cos(s1.vp, p);
    let w1 = ci1 * s2.rho * s2.vp;
    let w2 = vertical_cos(s2.vp, p) * s1.rho * s1.vp;
    let denom = w1 + w2;
    ((w1 - w2) / denom, ci1 * s1.rho * s1.vp * 2.0 / denom)
}

/// Gaussian elimination on a 3x3 complex system; coefficients fall back to
/// zero when the system is singular.
fn solve3(mut m: [[Cplx; 3]; 3], mut rhs: [Cplx; 3]) -> Option<[Cplx; 3]>
{
    for col in 0..3 {
        let pivot = (col..3).max_by(|&a, &b| {
            m[a][col]
                .norm_sqr()
                .partial_cmp(&m[b][col].norm_sqr())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[pivot][col].norm_sqr() == 0.0 {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..3 {
                m[row][k] = m[row][k] - factor * m[col][k];
            }
            rhs[row] = rhs[row] - factor * rhs[col];
        }
    }

    let mut x = [Cplx::zero(); 3];
    for row in (0..3).rev() {
        let mut acc = rhs[row];
        for k in row + 1..3 {
            acc = acc - m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    Some(x)
}

/// Incident P from a solid onto a fluid: (rpp, rps, tpp).
///
/// Unknowns solve the continuity of vertical displacement and normal
/// traction plus the vanishing of shear traction on the solid side.
fn solid_liquid_p(s1: ElasticSample, s2: ElasticSample, p: Real) -> (Cplx, Cplx, Cplx)
{
    let (a1, b1, r1) = (s1.vp, s1.vs, s1.rho);
    let (a2, r2) = (s2.vp, s2.rho);
    let mu1 = r1 * b1 * b1;
    let ci1 = vertical_cos(a1, p);
    let cj1 = vertical_cos(b1, p);
    let ci2 = vertical_cos(a2, p);
    let sj1 = p * b1;
    let lam = a1 * (r1 - 2.0 * mu1 * p * p);
    let shear = (1.0 - 2.0 * b1 * b1 * p * p) / b1;

    let m = [
        [-ci1, Cplx::from(sj1), -ci2],
        [Cplx::from(lam), cj1 * (-2.0 * mu1 * p), Cplx::from(-r2 * a2)],
        [ci1 * (-2.0 * p), Cplx::from(-shear), Cplx::zero()],
    ];
    let rhs = [-ci1, Cplx::from(-lam), ci1 * (-2.0 * p)];

    match solve3(m, rhs) {
        Some([rpp, rps, tpp]) => (rpp, rps, tpp),
        None => (Cplx::zero(), Cplx::zero(), Cplx::zero()),
    }
}

/// Incident SV from a solid onto a fluid: (rsp, rss, tsp).
fn solid_liquid_sv(s1: ElasticSample, s2: ElasticSample, p: Real) -> (Cplx, Cplx, Cplx)
{
    let (a1, b1, r1) = (s1.vp, s1.vs, s1.rho);
    let (a2, r2) = (s2.vp, s2.rho);
    let mu1 = r1 * b1 * b1;
    let ci1 = vertical_cos(a1, p);
    let cj1 = vertical_cos(b1, p);
    let ci2 = vertical_cos(a2, p);
    let sj1 = p * b1;
    let lam = a1 * (r1 - 2.0 * mu1 * p * p);
    let shear = (1.0 - 2.0 * b1 * b1 * p * p) / b1;

    let m = [
        [-ci1, Cplx::from(sj1), -ci2],
        [Cplx::from(lam), cj1 * (-2.0 * mu1 * p), Cplx::from(-r2 * a2)],
        [ci1 * (-2.0 * p), Cplx::from(-shear), Cplx::zero()],
    ];
    let rhs = [Cplx::from(sj1), cj1 * (2.0 * mu1 * p), Cplx::from(-shear)];

    match solve3(m, rhs) {
        Some([rsp, rss, tsp]) => (rsp, rss, tsp),
        None => (Cplx::zero(), Cplx::zero(), Cplx::zero()),
    }
}

/// Incident P from a fluid onto a solid: (rpp, tpp, tps).
fn liquid_solid_p(s1: ElasticSample, s2: ElasticSample, p: Real) -> (Cplx, Cplx, Cplx)
{
    let (a1, r1) = (s1.vp, s1.rho);
    let (a2, b2, r2) = (s2.vp, s2.vs, s2.rho);
    let mu2 = r2 * b2 * b2;
    let ci1 = vertical_cos(a1, p);
    let ci2 = vertical_cos(a2, p);
    let cj2 = vertical_cos(b2, p);
    let sj2 = p * b2;
    let lam = a2 * (r2 - 2.0 * mu2 * p * p);
    let shear = (1.0 - 2.0 * b2 * b2 * p * p) / b2;

    let m = [
        [-ci1, -ci2, Cplx::from(sj2)],
        [Cplx::from(r1 * a1), Cplx::from(-lam), cj2 * (2.0 * mu2 * p)],
        [Cplx::zero(), ci2 * (2.0 * p), Cplx::from(shear)],
    ];
    let rhs = [-ci1, Cplx::from(-r1 * a1), Cplx::zero()];

    match solve3(m, rhs) {
        Some([rpp, tpp, tps]) => (rpp, tpp, tps),
        None => (Cplx::zero(), Cplx::zero(), Cplx::zero()),
    }
}
